use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use sesh_core::{IngestConfig, ItemOutcome, MediaKind};
use sesh_processing::image::ImagePreviewGenerator;
use sesh_processing::video::VideoPreviewTranscoder;

/// Runs the generator owning an item's kind and reports the outcome.
/// Implementations never panic the dispatcher: failures come back as
/// [`ItemOutcome::Failed`] with a displayable reason.
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    async fn process(&self, kind: MediaKind, data: Bytes) -> ItemOutcome;
}

/// Production processor: watermarked stills for images, low-fidelity
/// clips (or still fallbacks) for videos.
pub struct MediaItemProcessor {
    images: Arc<ImagePreviewGenerator>,
    videos: VideoPreviewTranscoder,
}

impl MediaItemProcessor {
    pub fn new(config: &IngestConfig) -> anyhow::Result<Self> {
        Ok(Self {
            images: Arc::new(ImagePreviewGenerator::new(config)?),
            videos: VideoPreviewTranscoder::new(config)?,
        })
    }
}

#[async_trait]
impl ItemProcessor for MediaItemProcessor {
    async fn process(&self, kind: MediaKind, data: Bytes) -> ItemOutcome {
        match kind {
            MediaKind::Image => {
                let generator = Arc::clone(&self.images);
                // decode and encode are CPU-bound; keep them off the
                // async workers
                let result =
                    tokio::task::spawn_blocking(move || generator.generate(&data)).await;

                match result {
                    Ok(Ok(asset)) => ItemOutcome::Ready(asset),
                    Ok(Err(error)) => {
                        tracing::warn!(error = %error, "Image preview generation failed");
                        ItemOutcome::Failed {
                            reason: error.to_string(),
                        }
                    }
                    Err(join_error) => {
                        tracing::error!(error = %join_error, "Image preview task panicked");
                        ItemOutcome::Failed {
                            reason: "failed to load image".to_string(),
                        }
                    }
                }
            }
            MediaKind::Video => match self.videos.generate(&data).await {
                Ok(asset) => ItemOutcome::Ready(asset),
                Err(error) => {
                    tracing::warn!(error = %error, "Video preview generation failed");
                    ItemOutcome::Failed {
                        reason: error.to_string(),
                    }
                }
            },
        }
    }
}
