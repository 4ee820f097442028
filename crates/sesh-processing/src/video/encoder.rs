use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::video::validate_tool_path;

/// Parameters of one low-fidelity preview clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_kbps: u32,
    pub duration_seconds: f64,
}

/// Boundary between the transcode policy and the external tool.
#[async_trait]
pub trait ClipEncoder: Send + Sync {
    /// Re-encode the source into a full-duration low-bitrate clip.
    async fn encode_clip(&self, input: &Path, spec: &ClipSpec) -> Result<Bytes>;

    /// Capture a single frame at `at_seconds`, scaled to the preview bound.
    async fn capture_frame(
        &self,
        input: &Path,
        at_seconds: f64,
        width: u32,
        height: u32,
    ) -> Result<Bytes>;
}

/// Production encoder shelling out to ffmpeg.
pub struct FfmpegClipEncoder {
    ffmpeg_path: String,
}

impl FfmpegClipEncoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path).context("Invalid ffmpeg path")?;
        Ok(Self { ffmpeg_path })
    }

    async fn run_ffmpeg(&self, args: &[String], operation: &str) -> Result<()> {
        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("FFmpeg {} failed: {}", operation, stderr));
        }

        Ok(())
    }
}

#[async_trait]
impl ClipEncoder for FfmpegClipEncoder {
    async fn encode_clip(&self, input: &Path, spec: &ClipSpec) -> Result<Bytes> {
        let output_file = tempfile::Builder::new()
            .suffix(".mp4")
            .tempfile()
            .context("Failed to create clip output file")?;

        let args = clip_args(input, output_file.path(), spec);
        self.run_ffmpeg(&args, "clip re-encode").await?;

        let data = tokio::fs::read(output_file.path())
            .await
            .context("Failed to read encoded clip")?;
        if data.is_empty() {
            return Err(anyhow!("ffmpeg produced an empty clip"));
        }

        Ok(Bytes::from(data))
    }

    async fn capture_frame(
        &self,
        input: &Path,
        at_seconds: f64,
        width: u32,
        height: u32,
    ) -> Result<Bytes> {
        let output_file = tempfile::Builder::new()
            .suffix(".jpg")
            .tempfile()
            .context("Failed to create frame output file")?;

        let args = frame_args(input, output_file.path(), at_seconds, width, height);
        self.run_ffmpeg(&args, "frame capture").await?;

        let data = tokio::fs::read(output_file.path())
            .await
            .context("Failed to read captured frame")?;
        if data.is_empty() {
            return Err(anyhow!("ffmpeg produced an empty frame"));
        }

        Ok(Bytes::from(data))
    }
}

/// Argument list for the full-duration low-bitrate re-encode.
pub(crate) fn clip_args(input: &Path, output: &Path, spec: &ClipSpec) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        format!("scale={}:{}", spec.width, spec.height),
        "-r".to_string(),
        spec.fps.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-b:v".to_string(),
        format!("{}k", spec.bitrate_kbps),
        "-maxrate".to_string(),
        format!("{}k", (spec.bitrate_kbps as f32 * 1.2) as u32),
        "-bufsize".to_string(),
        format!("{}k", spec.bitrate_kbps * 2),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-an".to_string(),
        "-t".to_string(),
        spec.duration_seconds.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

/// Argument list for a single scaled frame grab.
pub(crate) fn frame_args(
    input: &Path,
    output: &Path,
    at_seconds: f64,
    width: u32,
    height: u32,
) -> Vec<String> {
    vec![
        "-ss".to_string(),
        at_seconds.to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vframes".to_string(),
        "1".to_string(),
        "-vf".to_string(),
        format!("scale={}:{}", width, height),
        "-q:v".to_string(),
        "2".to_string(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]
}
