//! Image preview pipeline: watermarked review stills and cover thumbnails.

pub mod preview;
pub mod thumbnail;
pub mod watermark;

pub use preview::{image_quality_issue, ImagePreviewGenerator};
pub use thumbnail::{CoverThumbnailGenerator, MAX_COVER_THUMBNAILS};
pub use watermark::TextWatermark;
