use thiserror::Error;

/// Hard failures while generating a preview. The display strings become
/// the reasons shown on failed items, so the two decode variants keep the
/// messages the review surface expects.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Source image could not be decoded.
    #[error("failed to load image")]
    ImageDecode(#[source] image::ImageError),

    /// Source video could not be probed.
    #[error("failed to load video")]
    VideoDecode(anyhow::Error),

    #[error("failed to encode image preview: {0}")]
    ImageEncode(#[source] image::ImageError),

    /// Both the clip re-encode and the still-frame fallback failed.
    #[error("failed to generate video preview: {0}")]
    VideoEncode(anyhow::Error),

    #[error("failed to stage media for processing: {0}")]
    Staging(#[from] std::io::Error),
}
