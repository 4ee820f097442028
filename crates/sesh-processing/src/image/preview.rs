use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader};

use sesh_core::{Dimensions, IngestConfig, PreviewAsset, QualityIssue, ReadyAsset};

use crate::error::PreviewError;
use crate::image::watermark::TextWatermark;
use crate::resize::{fit_within, select_filter};

/// Generates the review-surface still for one admitted image: decode,
/// resolution check, bounded downscale, watermark, JPEG encode.
///
/// Decode and encode are CPU-bound; callers on an async runtime should run
/// [`generate`](Self::generate) inside `spawn_blocking`.
pub struct ImagePreviewGenerator {
    max_px: u32,
    jpeg_quality: u8,
    min_megapixels: f64,
    watermark: TextWatermark,
}

impl ImagePreviewGenerator {
    pub fn new(config: &IngestConfig) -> anyhow::Result<Self> {
        Ok(Self {
            max_px: config.image_preview_max_px,
            jpeg_quality: config.jpeg_quality,
            min_megapixels: config.min_image_megapixels,
            watermark: TextWatermark::new(
                config.watermark_brand.clone(),
                &config.photographer,
                config.watermark_opacity,
            )?,
        })
    }

    pub fn generate(&self, data: &[u8]) -> Result<ReadyAsset, PreviewError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| PreviewError::ImageDecode(image::ImageError::IoError(e)))?
            .decode()
            .map_err(PreviewError::ImageDecode)?;

        let (width, height) = img.dimensions();
        let dimensions = Dimensions { width, height };
        let quality = image_quality_issue(width, height, self.min_megapixels);

        let (preview_w, preview_h) = fit_within(width, height, self.max_px);
        let resized = if (preview_w, preview_h) == (width, height) {
            img
        } else {
            let filter = select_filter(width, height, preview_w, preview_h);
            img.resize_exact(preview_w, preview_h, filter)
        };

        let marked = self.watermark.apply(resized);

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(marked.to_rgb8());
        let mut buffer = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(
            &mut buffer,
            self.jpeg_quality,
        ))
        .map_err(PreviewError::ImageEncode)?;

        Ok(ReadyAsset {
            preview: PreviewAsset::Still(Bytes::from(buffer)),
            dimensions,
            quality,
        })
    }
}

/// Soft resolution check. The preview is generated either way; the issue
/// only blocks submission.
pub fn image_quality_issue(
    width: u32,
    height: u32,
    min_megapixels: f64,
) -> Option<QualityIssue> {
    let megapixels = (width as f64 * height as f64) / 1_000_000.0;
    (megapixels < min_megapixels).then_some(QualityIssue::LowResolutionImage { megapixels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn test_generator() -> ImagePreviewGenerator {
        ImagePreviewGenerator::new(&IngestConfig::default()).unwrap()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([30, 120, 200, 255]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn decode_preview(asset: &ReadyAsset) -> DynamicImage {
        ImageReader::new(Cursor::new(asset.preview.bytes().as_ref()))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn test_generate_bounds_longest_side() {
        let asset = test_generator().generate(&png_bytes(800, 600)).unwrap();
        // natural dimensions are reported, not preview dimensions
        assert_eq!(asset.dimensions, Dimensions { width: 800, height: 600 });
        let preview = decode_preview(&asset);
        assert_eq!(preview.dimensions(), (400, 300));
    }

    #[test]
    fn test_generate_emits_jpeg() {
        let asset = test_generator().generate(&png_bytes(500, 500)).unwrap();
        assert!(!asset.preview.is_clip());
        assert_eq!(asset.preview.content_type(), "image/jpeg");
        let format = ImageReader::new(Cursor::new(asset.preview.bytes().as_ref()))
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_small_source_is_not_upscaled() {
        let asset = test_generator().generate(&png_bytes(120, 90)).unwrap();
        let preview = decode_preview(&asset);
        assert_eq!(preview.dimensions(), (120, 90));
    }

    #[test]
    fn test_low_resolution_is_flagged_but_still_ready() {
        let asset = test_generator().generate(&png_bytes(800, 600)).unwrap();
        assert!(matches!(
            asset.quality,
            Some(QualityIssue::LowResolutionImage { .. })
        ));
        assert!(!asset.preview.is_empty());
    }

    #[test]
    fn test_undecodable_image_fails_with_load_reason() {
        let error = test_generator().generate(b"not an image").unwrap_err();
        assert_eq!(error.to_string(), "failed to load image");
    }

    #[test]
    fn test_quality_threshold_boundary() {
        assert!(image_quality_issue(4000, 3000, 12.0).is_none());
        let issue = image_quality_issue(3999, 3000, 12.0);
        assert!(matches!(
            issue,
            Some(QualityIssue::LowResolutionImage { megapixels }) if megapixels < 12.0
        ));
    }
}
