use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::timeout;

use sesh_core::{Dimensions, IngestConfig, PreviewAsset, QualityIssue, ReadyAsset};

use crate::error::PreviewError;
use crate::resize::fit_within_even;
use crate::video::encoder::{ClipEncoder, ClipSpec, FfmpegClipEncoder};
use crate::video::probe::{VideoProbe, VideoProber};

/// Wall-clock allowance on top of the source duration before the re-encode
/// is abandoned for the still fallback.
const ENCODE_GRACE: Duration = Duration::from_secs(30);
/// Upper bound on the duration term of the deadline; probe data is not
/// trusted blindly.
const MAX_SOURCE_SECONDS: f64 = 86_400.0;
/// Frame offset for the still fallback.
const FALLBACK_FRAME_SECONDS: f64 = 1.0;

/// Transcode policy for one admitted video.
///
/// A probe failure is the item's hard failure. After a good probe the item
/// always settles ready with *some* preview: the full-duration clip when
/// the re-encode succeeds in time, a single early frame otherwise. Only
/// when the fallback frame grab also fails does the item fail.
pub struct VideoPreviewTranscoder {
    prober: VideoProber,
    encoder: Arc<dyn ClipEncoder>,
    max_px: u32,
    fps: u32,
    bitrate_kbps: u32,
    min_height: u32,
}

impl VideoPreviewTranscoder {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let prober = VideoProber::new(config.ffprobe_path.clone())?;
        let encoder = Arc::new(FfmpegClipEncoder::new(config.ffmpeg_path.clone())?);
        Ok(Self::with_encoder(config, prober, encoder))
    }

    /// Build with a custom encoder; tests exercise the fallback path this
    /// way without ffmpeg installed.
    pub fn with_encoder(
        config: &IngestConfig,
        prober: VideoProber,
        encoder: Arc<dyn ClipEncoder>,
    ) -> Self {
        Self {
            prober,
            encoder,
            max_px: config.video_preview_max_px,
            fps: config.video_preview_fps,
            bitrate_kbps: config.video_preview_bitrate_kbps,
            min_height: config.min_video_height,
        }
    }

    /// Full pipeline: stage the bytes, probe, transcode.
    pub async fn generate(&self, data: &[u8]) -> Result<ReadyAsset, PreviewError> {
        let staged = tempfile::NamedTempFile::new()?;
        tokio::fs::write(staged.path(), data).await?;

        let probe = match self.prober.probe(staged.path()).await {
            Ok(probe) => probe,
            Err(error) => {
                tracing::warn!(error = %error, "Video probe failed");
                return Err(PreviewError::VideoDecode(error));
            }
        };

        self.transcode_probed(staged.path(), &probe).await
    }

    /// Policy after a successful probe.
    pub async fn transcode_probed(
        &self,
        input: &Path,
        probe: &VideoProbe,
    ) -> Result<ReadyAsset, PreviewError> {
        let dimensions = Dimensions {
            width: probe.width,
            height: probe.height,
        };
        let quality = video_quality_issue(probe.height, self.min_height);

        let (preview_w, preview_h) = fit_within_even(probe.width, probe.height, self.max_px);
        let spec = ClipSpec {
            width: preview_w,
            height: preview_h,
            fps: self.fps,
            bitrate_kbps: self.bitrate_kbps,
            duration_seconds: probe.duration_seconds,
        };
        let deadline = encode_deadline(probe.duration_seconds);

        let preview = match timeout(deadline, self.encoder.encode_clip(input, &spec)).await {
            Ok(Ok(clip)) => PreviewAsset::Clip(clip),
            Ok(Err(error)) => {
                tracing::warn!(
                    error = %error,
                    "Clip re-encode failed, falling back to still frame"
                );
                self.fallback_frame(input, probe, preview_w, preview_h)
                    .await?
            }
            Err(_) => {
                tracing::warn!(
                    deadline_secs = deadline.as_secs(),
                    "Clip re-encode overran its deadline, falling back to still frame"
                );
                self.fallback_frame(input, probe, preview_w, preview_h)
                    .await?
            }
        };

        Ok(ReadyAsset {
            preview,
            dimensions,
            quality,
        })
    }

    async fn fallback_frame(
        &self,
        input: &Path,
        probe: &VideoProbe,
        width: u32,
        height: u32,
    ) -> Result<PreviewAsset, PreviewError> {
        let at = frame_capture_offset(probe.duration_seconds);
        let frame = self
            .encoder
            .capture_frame(input, at, width, height)
            .await
            .map_err(PreviewError::VideoEncode)?;
        Ok(PreviewAsset::Still(frame))
    }
}

/// Wall-clock bound for the full-duration re-encode.
pub fn encode_deadline(duration_seconds: f64) -> Duration {
    let bounded = duration_seconds.max(0.0).min(MAX_SOURCE_SECONDS);
    Duration::from_secs_f64(bounded) + ENCODE_GRACE
}

/// The still fallback grabs the one-second frame; sub-second clips use
/// their first frame.
pub fn frame_capture_offset(duration_seconds: f64) -> f64 {
    if duration_seconds >= FALLBACK_FRAME_SECONDS {
        FALLBACK_FRAME_SECONDS
    } else {
        0.0
    }
}

/// Soft resolution check against the natural (not preview) height.
pub fn video_quality_issue(height: u32, min_height: u32) -> Option<QualityIssue> {
    (height < min_height).then_some(QualityIssue::LowResolutionVideo { height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockEncoder {
        fail_clip: bool,
        fail_frame: bool,
        frame_calls: AtomicUsize,
    }

    impl MockEncoder {
        fn new(fail_clip: bool, fail_frame: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_clip,
                fail_frame,
                frame_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ClipEncoder for MockEncoder {
        async fn encode_clip(&self, _input: &Path, _spec: &ClipSpec) -> Result<Bytes> {
            if self.fail_clip {
                anyhow::bail!("no encoder available");
            }
            Ok(Bytes::from_static(b"clip-bytes"))
        }

        async fn capture_frame(
            &self,
            _input: &Path,
            at_seconds: f64,
            _width: u32,
            _height: u32,
        ) -> Result<Bytes> {
            self.frame_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_frame {
                anyhow::bail!("frame grab failed");
            }
            assert!((at_seconds - 1.0).abs() < f64::EPSILON);
            Ok(Bytes::from_static(b"frame-bytes"))
        }
    }

    fn transcoder(encoder: Arc<dyn ClipEncoder>) -> VideoPreviewTranscoder {
        let config = IngestConfig::default();
        let prober = VideoProber::new("ffprobe").unwrap();
        VideoPreviewTranscoder::with_encoder(&config, prober, encoder)
    }

    fn probe_1080p() -> VideoProbe {
        VideoProbe {
            width: 1920,
            height: 1080,
            duration_seconds: 12.5,
            codec: "h264".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_encode_yields_clip() {
        let transcoder = transcoder(MockEncoder::new(false, false));
        let asset = transcoder
            .transcode_probed(Path::new("staged.mp4"), &probe_1080p())
            .await
            .unwrap();

        assert!(asset.preview.is_clip());
        assert_eq!(asset.preview.content_type(), "video/mp4");
        assert_eq!(asset.dimensions, Dimensions { width: 1920, height: 1080 });
        assert!(asset.quality.is_none());
    }

    #[tokio::test]
    async fn test_encode_failure_falls_back_to_still() {
        let encoder = MockEncoder::new(true, false);
        let transcoder = transcoder(encoder.clone());
        let asset = transcoder
            .transcode_probed(Path::new("staged.mp4"), &probe_1080p())
            .await
            .unwrap();

        assert!(!asset.preview.is_clip());
        assert_eq!(asset.preview.content_type(), "image/jpeg");
        assert_eq!(encoder.frame_calls.load(Ordering::SeqCst), 1);
        // natural dimensions survive the fallback
        assert_eq!(asset.dimensions, Dimensions { width: 1920, height: 1080 });
    }

    #[tokio::test]
    async fn test_fallback_failure_is_a_hard_error() {
        let transcoder = transcoder(MockEncoder::new(true, true));
        let error = transcoder
            .transcode_probed(Path::new("staged.mp4"), &probe_1080p())
            .await
            .unwrap_err();

        assert!(error
            .to_string()
            .starts_with("failed to generate video preview"));
    }

    #[tokio::test]
    async fn test_low_resolution_video_is_flagged() {
        let transcoder = transcoder(MockEncoder::new(false, false));
        let probe = VideoProbe {
            width: 1280,
            height: 720,
            duration_seconds: 5.0,
            codec: "h264".to_string(),
        };
        let asset = transcoder
            .transcode_probed(Path::new("staged.mp4"), &probe)
            .await
            .unwrap();

        assert!(matches!(
            asset.quality,
            Some(QualityIssue::LowResolutionVideo { height: 720 })
        ));
        // degraded but present
        assert!(asset.preview.is_clip());
    }

    #[test]
    fn test_encode_deadline_adds_grace() {
        assert_eq!(encode_deadline(10.0), Duration::from_secs(40));
        assert_eq!(encode_deadline(0.0), Duration::from_secs(30));
        // negative or absurd probe values stay bounded
        assert_eq!(encode_deadline(-5.0), Duration::from_secs(30));
        assert!(encode_deadline(f64::MAX) <= Duration::from_secs(86_430));
    }

    #[test]
    fn test_frame_capture_offset() {
        assert!((frame_capture_offset(5.0) - 1.0).abs() < f64::EPSILON);
        assert!((frame_capture_offset(1.0) - 1.0).abs() < f64::EPSILON);
        assert!(frame_capture_offset(0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_video_quality_threshold_boundary() {
        assert!(video_quality_issue(1080, 1080).is_none());
        assert!(matches!(
            video_quality_issue(1079, 1080),
            Some(QualityIssue::LowResolutionVideo { height: 1079 })
        ));
    }
}
