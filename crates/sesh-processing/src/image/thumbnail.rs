use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader};

use sesh_core::{IngestConfig, MediaPart, UploadItem};

use crate::resize::{fit_within, select_filter};

/// Upper bound on cover thumbnails cut from a session's image items.
pub const MAX_COVER_THUMBNAILS: usize = 4;

/// Cuts the session's cover strip: plain bounded JPEGs of the first image
/// items in list order, without watermark. Thumbnails are rendered once at
/// submission and are not kept in sync while the draft is edited.
pub struct CoverThumbnailGenerator {
    max_px: u32,
    jpeg_quality: u8,
}

impl CoverThumbnailGenerator {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            max_px: config.thumbnail_max_px,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Render up to [`MAX_COVER_THUMBNAILS`] thumbnails. A source that no
    /// longer decodes is skipped rather than failing the submission.
    pub fn generate(&self, items: &[UploadItem]) -> Vec<MediaPart> {
        let mut thumbnails = Vec::new();

        for item in items
            .iter()
            .filter(|item| item.is_image())
            .take(MAX_COVER_THUMBNAILS)
        {
            match self.render(&item.source.bytes) {
                Ok(bytes) => {
                    thumbnails.push(MediaPart {
                        file_name: format!("cover_{}.jpg", thumbnails.len()),
                        content_type: "image/jpeg".to_string(),
                        bytes,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        file_name = %item.source.file_name,
                        error = %error,
                        "Skipping cover thumbnail for undecodable image"
                    );
                }
            }
        }

        thumbnails
    }

    fn render(&self, data: &[u8]) -> Result<Bytes, image::ImageError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .decode()?;

        let (width, height) = img.dimensions();
        let (thumb_w, thumb_h) = fit_within(width, height, self.max_px);
        let resized = if (thumb_w, thumb_h) == (width, height) {
            img
        } else {
            img.resize_exact(thumb_w, thumb_h, select_filter(width, height, thumb_w, thumb_h))
        };

        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut buffer = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(
            &mut buffer,
            self.jpeg_quality,
        ))?;
        Ok(Bytes::from(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use sesh_core::{MediaKind, SourceFile};

    fn png_source(file_name: &str, width: u32, height: u32) -> UploadItem {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 180, 40, 255]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        UploadItem::new(SourceFile {
            file_name: file_name.to_string(),
            content_type: "image/png".to_string(),
            kind: MediaKind::Image,
            bytes: Bytes::from(buffer.into_inner()),
        })
    }

    fn video_source(file_name: &str) -> UploadItem {
        UploadItem::new(SourceFile {
            file_name: file_name.to_string(),
            content_type: "video/mp4".to_string(),
            kind: MediaKind::Video,
            bytes: Bytes::from_static(b"fake video payload"),
        })
    }

    #[test]
    fn test_caps_at_four_thumbnails() {
        let items: Vec<_> = (0..6)
            .map(|i| png_source(&format!("wave_{}.png", i), 300, 300))
            .collect();
        let thumbnails = CoverThumbnailGenerator::new(&IngestConfig::default()).generate(&items);
        assert_eq!(thumbnails.len(), 4);
        assert_eq!(thumbnails[0].file_name, "cover_0.jpg");
        assert_eq!(thumbnails[3].file_name, "cover_3.jpg");
    }

    #[test]
    fn test_fewer_images_yield_fewer_thumbnails() {
        let items = vec![
            png_source("a.png", 300, 300),
            png_source("b.png", 300, 300),
        ];
        let thumbnails = CoverThumbnailGenerator::new(&IngestConfig::default()).generate(&items);
        assert_eq!(thumbnails.len(), 2);
    }

    #[test]
    fn test_videos_are_skipped() {
        let items = vec![
            video_source("ride.mp4"),
            png_source("a.png", 300, 300),
            video_source("drop.mp4"),
            png_source("b.png", 300, 300),
        ];
        let thumbnails = CoverThumbnailGenerator::new(&IngestConfig::default()).generate(&items);
        assert_eq!(thumbnails.len(), 2);
    }

    #[test]
    fn test_thumbnail_is_bounded() {
        let items = vec![png_source("big.png", 900, 600)];
        let thumbnails = CoverThumbnailGenerator::new(&IngestConfig::default()).generate(&items);
        let thumb = ImageReader::new(Cursor::new(thumbnails[0].bytes.as_ref()))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(thumb.dimensions(), (225, 150));
    }

    #[test]
    fn test_undecodable_source_is_skipped() {
        let mut broken = png_source("ok.png", 100, 100);
        broken.source.bytes = Bytes::from_static(b"rotted bits");
        let items = vec![broken, png_source("fine.png", 100, 100)];
        let thumbnails = CoverThumbnailGenerator::new(&IngestConfig::default()).generate(&items);
        assert_eq!(thumbnails.len(), 1);
        assert_eq!(thumbnails[0].file_name, "cover_0.jpg");
    }
}
