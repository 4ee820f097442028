use ab_glyph::{FontRef, PxScale};
use anyhow::Context;
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

// Embedded fonts so the watermark never depends on what the host has
// installed.
const BRAND_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");
const CREDIT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Brand line: 5% of the smaller preview dimension, floored at 22 px.
const BRAND_SCALE_RATIO: f32 = 0.05;
const BRAND_MIN_PX: f32 = 22.0;
/// Credit line: 75% of the brand line, floored at 16 px.
const CREDIT_SCALE_RATIO: f32 = 0.75;
const CREDIT_MIN_PX: f32 = 16.0;
const LINE_GAP_RATIO: f32 = 0.25;

/// Two-line text mark composited over image previews: the brand on top,
/// the photographer credit underneath, centered and faded to the
/// configured opacity.
pub struct TextWatermark {
    brand: String,
    credit: String,
    opacity: f32,
    brand_font: FontRef<'static>,
    credit_font: FontRef<'static>,
}

impl TextWatermark {
    pub fn new(
        brand: impl Into<String>,
        photographer: &str,
        opacity: f32,
    ) -> anyhow::Result<Self> {
        let brand_font =
            FontRef::try_from_slice(BRAND_FONT).context("Failed to load embedded brand font")?;
        let credit_font =
            FontRef::try_from_slice(CREDIT_FONT).context("Failed to load embedded credit font")?;

        Ok(Self {
            brand: brand.into(),
            credit: format!("Photo by {}", photographer),
            opacity: opacity.clamp(0.0, 1.0),
            brand_font,
            credit_font,
        })
    }

    /// Text scales for the two lines, derived from the smaller dimension.
    pub fn line_scales(min_dimension: u32) -> (f32, f32) {
        let brand = (min_dimension as f32 * BRAND_SCALE_RATIO).max(BRAND_MIN_PX);
        let credit = (brand * CREDIT_SCALE_RATIO).max(CREDIT_MIN_PX);
        (brand, credit)
    }

    /// Apply the watermark. The text is drawn onto a transparent layer the
    /// size of the image, faded, and overlaid, so the base pixels blend
    /// instead of being overwritten.
    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        let mut base = img.to_rgba8();
        let (width, height) = base.dimensions();
        if width == 0 || height == 0 {
            return DynamicImage::ImageRgba8(base);
        }

        let (brand_px, credit_px) = Self::line_scales(width.min(height));
        let brand_scale = PxScale::from(brand_px);
        let credit_scale = PxScale::from(credit_px);
        let line_gap = (brand_px * LINE_GAP_RATIO).round() as i32;

        let mut layer = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        let white = Rgba([255u8, 255, 255, 255]);

        let (brand_w, brand_h) = text_size(brand_scale, &self.brand_font, &self.brand);
        let (credit_w, _) = text_size(credit_scale, &self.credit_font, &self.credit);

        let block_h = brand_h as i32 + line_gap + credit_px.round() as i32;
        let brand_x = (width as i32 - brand_w as i32) / 2;
        let brand_y = (height as i32 - block_h) / 2;
        let credit_x = (width as i32 - credit_w as i32) / 2;
        let credit_y = brand_y + brand_h as i32 + line_gap;

        draw_text_mut(
            &mut layer,
            white,
            brand_x,
            brand_y,
            brand_scale,
            &self.brand_font,
            &self.brand,
        );
        draw_text_mut(
            &mut layer,
            white,
            credit_x,
            credit_y,
            credit_scale,
            &self.credit_font,
            &self.credit,
        );

        // Apply opacity
        if self.opacity < 1.0 {
            for pixel in layer.pixels_mut() {
                pixel[3] = (pixel[3] as f32 * self.opacity) as u8;
            }
        }

        imageops::overlay(&mut base, &layer, 0, 0);
        DynamicImage::ImageRgba8(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
    }

    fn test_watermark(opacity: f32) -> TextWatermark {
        TextWatermark::new("Sesh", "Kai", opacity).unwrap()
    }

    #[test]
    fn test_apply_preserves_dimensions() {
        let marked = test_watermark(0.4).apply(create_test_image(400, 300));
        assert_eq!(marked.dimensions(), (400, 300));
    }

    #[test]
    fn test_apply_marks_pixels() {
        let marked = test_watermark(0.4).apply(create_test_image(400, 300)).to_rgba8();
        let changed = marked
            .pixels()
            .filter(|p| p.0 != [0, 0, 0, 255])
            .count();
        assert!(changed > 0, "watermark left no visible trace");
    }

    #[test]
    fn test_zero_opacity_leaves_image_untouched() {
        let marked = test_watermark(0.0).apply(create_test_image(120, 90)).to_rgba8();
        assert!(marked.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_tiny_image_does_not_panic() {
        let marked = test_watermark(0.4).apply(create_test_image(8, 8));
        assert_eq!(marked.dimensions(), (8, 8));
    }

    #[test]
    fn test_line_scales_floors() {
        let (brand, credit) = TextWatermark::line_scales(400);
        assert!((brand - 22.0).abs() < f32::EPSILON);
        assert!((credit - 16.5).abs() < 0.01);

        let (brand, credit) = TextWatermark::line_scales(1000);
        assert!((brand - 50.0).abs() < 0.01);
        assert!((credit - 37.5).abs() < 0.01);
    }
}
