use bytes::Bytes;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

use crate::models::{MediaKind, SessionKind};

/// Prefix on every preview part's file name in the submission payload.
pub const PREVIEW_PREFIX: &str = "preview_";

/// One binary part of the multipart submission.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Scalar fields of the submission payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionFields {
    pub venue_id: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    pub start_hour: String,
    pub end_hour: String,
    pub photo_price: Decimal,
    pub video_price: Decimal,
    pub kind: SessionKind,
    pub photo_count: usize,
    pub video_count: usize,
}

/// Fully assembled submission. `media`, `previews`, `widths` and `heights`
/// are index-aligned per item; `thumbnails` is the independent cover strip.
#[derive(Debug, Clone)]
pub struct SessionPayload {
    pub media: Vec<MediaPart>,
    pub previews: Vec<MediaPart>,
    pub thumbnails: Vec<MediaPart>,
    pub widths: Vec<u32>,
    pub heights: Vec<u32>,
    pub fields: SessionFields,
}

impl SessionPayload {
    pub fn item_count(&self) -> usize {
        self.media.len()
    }

    /// True when the four per-item sequences agree on length.
    pub fn is_aligned(&self) -> bool {
        self.media.len() == self.previews.len()
            && self.media.len() == self.widths.len()
            && self.media.len() == self.heights.len()
    }
}

/// Derive a preview part's file name from its original. The extension
/// follows the item kind (`.jpg` for images, `.mp4` for videos), not the
/// preview's actual encoding, so a still-frame fallback keeps its video
/// item's naming.
pub fn preview_file_name(original: &str, kind: MediaKind) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("item");
    format!("{}{}.{}", PREVIEW_PREFIX, stem, kind.preview_extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_file_name_keeps_stem_and_swaps_extension() {
        assert_eq!(
            preview_file_name("wave_01.png", MediaKind::Image),
            "preview_wave_01.jpg"
        );
        assert_eq!(
            preview_file_name("ride.mov", MediaKind::Video),
            "preview_ride.mp4"
        );
    }

    #[test]
    fn test_preview_file_name_handles_missing_stem() {
        assert_eq!(preview_file_name("", MediaKind::Image), "preview_item.jpg");
    }

    #[test]
    fn test_alignment_check() {
        let payload = SessionPayload {
            media: vec![],
            previews: vec![],
            thumbnails: vec![],
            widths: vec![1],
            heights: vec![],
            fields: SessionFields {
                venue_id: "loc-1".to_string(),
                date: "2024-06-01".to_string(),
                start_hour: "9:00".to_string(),
                end_hour: "11:00".to_string(),
                photo_price: Decimal::ZERO,
                video_price: Decimal::ZERO,
                kind: SessionKind::FreeSurf,
                photo_count: 0,
                video_count: 0,
            },
        };
        assert!(!payload.is_aligned());
    }
}
