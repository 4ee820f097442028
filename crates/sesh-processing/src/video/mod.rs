//! Video preview pipeline: ffprobe metadata, low-fidelity clip re-encode,
//! still-frame fallback.

pub mod encoder;
pub mod preview;
pub mod probe;

pub use encoder::{ClipEncoder, ClipSpec, FfmpegClipEncoder};
pub use preview::{encode_deadline, frame_capture_offset, video_quality_issue, VideoPreviewTranscoder};
pub use probe::{parse_probe_output, VideoProbe, VideoProber};

use anyhow::{anyhow, Result};

/// Reject tool paths containing shell metacharacters or traversal before
/// they reach a subprocess invocation.
pub(crate) fn validate_tool_path(path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(anyhow!("Tool path contains directory traversal: {}", path));
    }

    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\')
    {
        return Err(anyhow!("Tool path contains unsafe characters: {}", path));
    }

    Ok(())
}
