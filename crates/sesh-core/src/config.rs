//! Configuration module
//!
//! All ingestion knobs are read from the environment with defaults chosen so
//! the engine runs unconfigured in development. Invalid values fall back to
//! the defaults rather than aborting.

use std::env;

// Batch budgets
const MAX_FILE_SIZE_MB: u64 = 20;
const MAX_SESSION_SIZE_MB: u64 = 1024;
const MAX_SESSION_ITEMS: usize = 150;
const MAX_WORKERS: usize = 4;

// Derived-asset knobs
const IMAGE_PREVIEW_MAX_PX: u32 = 400;
const THUMBNAIL_MAX_PX: u32 = 225;
const JPEG_QUALITY: u8 = 80;
const WATERMARK_OPACITY: f32 = 0.4;
const MIN_IMAGE_MEGAPIXELS: f64 = 12.0;
const MIN_VIDEO_HEIGHT: u32 = 1080;
const VIDEO_PREVIEW_MAX_PX: u32 = 240;
const VIDEO_PREVIEW_FPS: u32 = 15;
const VIDEO_PREVIEW_BITRATE_KBPS: u32 = 50;

/// Ingestion engine configuration.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub max_file_size_bytes: u64,
    pub max_session_size_bytes: u64,
    pub max_session_items: usize,
    /// Upper bound on concurrently running preview generators.
    pub max_workers: usize,
    pub image_allowed_extensions: Vec<String>,
    pub image_allowed_content_types: Vec<String>,
    pub video_allowed_extensions: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    pub image_preview_max_px: u32,
    pub thumbnail_max_px: u32,
    pub jpeg_quality: u8,
    pub watermark_brand: String,
    /// Credit line rendered under the brand on image previews.
    pub photographer: String,
    pub watermark_opacity: f32,
    pub min_image_megapixels: f64,
    pub min_video_height: u32,
    pub video_preview_max_px: u32,
    pub video_preview_fps: u32,
    pub video_preview_bitrate_kbps: u32,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            max_session_size_bytes: MAX_SESSION_SIZE_MB * 1024 * 1024,
            max_session_items: MAX_SESSION_ITEMS,
            max_workers: MAX_WORKERS,
            image_allowed_extensions: split_list("jpg,jpeg,png,webp"),
            image_allowed_content_types: split_list("image/jpeg,image/png,image/webp"),
            video_allowed_extensions: split_list("mp4,mov,webm"),
            video_allowed_content_types: split_list("video/mp4,video/quicktime,video/webm"),
            image_preview_max_px: IMAGE_PREVIEW_MAX_PX,
            thumbnail_max_px: THUMBNAIL_MAX_PX,
            jpeg_quality: JPEG_QUALITY,
            watermark_brand: "Sesh".to_string(),
            photographer: "Anonymous".to_string(),
            watermark_opacity: WATERMARK_OPACITY,
            min_image_megapixels: MIN_IMAGE_MEGAPIXELS,
            min_video_height: MIN_VIDEO_HEIGHT,
            video_preview_max_px: VIDEO_PREVIEW_MAX_PX,
            video_preview_fps: VIDEO_PREVIEW_FPS,
            video_preview_bitrate_kbps: VIDEO_PREVIEW_BITRATE_KBPS,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let max_file_size_mb = env::var("SESH_MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let max_session_size_mb = env::var("SESH_MAX_SESSION_SIZE_MB")
            .unwrap_or_else(|_| MAX_SESSION_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_SESSION_SIZE_MB);

        let image_allowed_extensions = env::var("SESH_IMAGE_EXTENSIONS")
            .map(|s| split_list(&s))
            .unwrap_or(defaults.image_allowed_extensions);

        let image_allowed_content_types = env::var("SESH_IMAGE_CONTENT_TYPES")
            .map(|s| split_list(&s))
            .unwrap_or(defaults.image_allowed_content_types);

        let video_allowed_extensions = env::var("SESH_VIDEO_EXTENSIONS")
            .map(|s| split_list(&s))
            .unwrap_or(defaults.video_allowed_extensions);

        let video_allowed_content_types = env::var("SESH_VIDEO_CONTENT_TYPES")
            .map(|s| split_list(&s))
            .unwrap_or(defaults.video_allowed_content_types);

        Self {
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            max_session_size_bytes: max_session_size_mb * 1024 * 1024,
            max_session_items: env::var("SESH_MAX_SESSION_ITEMS")
                .unwrap_or_else(|_| MAX_SESSION_ITEMS.to_string())
                .parse()
                .unwrap_or(MAX_SESSION_ITEMS),
            max_workers: env::var("SESH_MAX_WORKERS")
                .unwrap_or_else(|_| MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(MAX_WORKERS),
            image_allowed_extensions,
            image_allowed_content_types,
            video_allowed_extensions,
            video_allowed_content_types,
            image_preview_max_px: env::var("SESH_IMAGE_PREVIEW_MAX_PX")
                .unwrap_or_else(|_| IMAGE_PREVIEW_MAX_PX.to_string())
                .parse()
                .unwrap_or(IMAGE_PREVIEW_MAX_PX),
            thumbnail_max_px: env::var("SESH_THUMBNAIL_MAX_PX")
                .unwrap_or_else(|_| THUMBNAIL_MAX_PX.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_MAX_PX),
            jpeg_quality: env::var("SESH_JPEG_QUALITY")
                .unwrap_or_else(|_| JPEG_QUALITY.to_string())
                .parse()
                .unwrap_or(JPEG_QUALITY),
            watermark_brand: env::var("SESH_WATERMARK_BRAND")
                .unwrap_or_else(|_| defaults.watermark_brand.clone()),
            photographer: env::var("SESH_PHOTOGRAPHER")
                .unwrap_or_else(|_| defaults.photographer.clone()),
            watermark_opacity: env::var("SESH_WATERMARK_OPACITY")
                .unwrap_or_else(|_| WATERMARK_OPACITY.to_string())
                .parse()
                .unwrap_or(WATERMARK_OPACITY),
            min_image_megapixels: env::var("SESH_MIN_IMAGE_MEGAPIXELS")
                .unwrap_or_else(|_| MIN_IMAGE_MEGAPIXELS.to_string())
                .parse()
                .unwrap_or(MIN_IMAGE_MEGAPIXELS),
            min_video_height: env::var("SESH_MIN_VIDEO_HEIGHT")
                .unwrap_or_else(|_| MIN_VIDEO_HEIGHT.to_string())
                .parse()
                .unwrap_or(MIN_VIDEO_HEIGHT),
            video_preview_max_px: env::var("SESH_VIDEO_PREVIEW_MAX_PX")
                .unwrap_or_else(|_| VIDEO_PREVIEW_MAX_PX.to_string())
                .parse()
                .unwrap_or(VIDEO_PREVIEW_MAX_PX),
            video_preview_fps: env::var("SESH_VIDEO_PREVIEW_FPS")
                .unwrap_or_else(|_| VIDEO_PREVIEW_FPS.to_string())
                .parse()
                .unwrap_or(VIDEO_PREVIEW_FPS),
            video_preview_bitrate_kbps: env::var("SESH_VIDEO_PREVIEW_BITRATE_KBPS")
                .unwrap_or_else(|_| VIDEO_PREVIEW_BITRATE_KBPS.to_string())
                .parse()
                .unwrap_or(VIDEO_PREVIEW_BITRATE_KBPS),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_budget_constants() {
        let config = IngestConfig::default();
        assert_eq!(config.max_file_size_bytes, 20 * 1024 * 1024);
        assert_eq!(config.max_session_size_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.max_session_items, 150);
        assert_eq!(config.image_preview_max_px, 400);
        assert_eq!(config.thumbnail_max_px, 225);
        assert_eq!(config.video_preview_max_px, 240);
        assert_eq!(config.video_preview_fps, 15);
        assert_eq!(config.video_preview_bitrate_kbps, 50);
        assert!((config.watermark_opacity - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_split_list_trims_and_lowercases() {
        assert_eq!(
            split_list("JPG, jpeg ,PNG"),
            vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()]
        );
        assert_eq!(split_list(""), Vec::<String>::new());
    }

    #[test]
    fn test_default_content_types_cover_default_extensions() {
        let config = IngestConfig::default();
        assert!(config
            .image_allowed_content_types
            .contains(&"image/jpeg".to_string()));
        assert!(config
            .video_allowed_content_types
            .contains(&"video/quicktime".to_string()));
    }
}
