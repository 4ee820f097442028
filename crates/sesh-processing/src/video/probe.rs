use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tokio::process::Command;

use crate::video::validate_tool_path;

/// Source metadata a preview transcode is planned from.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProbe {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
    pub codec: String,
}

/// Wraps ffprobe for container inspection.
pub struct VideoProber {
    ffprobe_path: String,
}

impl VideoProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path).context("Invalid ffprobe path")?;
        Ok(Self { ffprobe_path })
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(&self, video_path: &Path) -> Result<VideoProbe> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(video_path)
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let probe = parse_probe_output(&output.stdout)?;

        tracing::debug!(
            width = probe.width,
            height = probe.height,
            duration_seconds = probe.duration_seconds,
            codec = %probe.codec,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Video probe completed"
        );

        Ok(probe)
    }
}

/// Parse raw `ffprobe -print_format json` output. Duration is read from
/// the selected stream first and the container format second; some
/// containers only report one of the two.
pub fn parse_probe_output(raw: &[u8]) -> Result<VideoProbe> {
    let probe_data: serde_json::Value =
        serde_json::from_slice(raw).context("Failed to parse ffprobe output")?;

    let stream = probe_data["streams"]
        .get(0)
        .ok_or_else(|| anyhow!("No video stream found"))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| anyhow!("Could not parse width"))? as u32;

    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| anyhow!("Could not parse height"))? as u32;

    let duration_seconds = stream["duration"]
        .as_str()
        .or_else(|| probe_data["format"]["duration"].as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("Could not parse duration"))?;

    let codec = stream["codec_name"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();

    Ok(VideoProbe {
        width,
        height,
        duration_seconds,
        codec,
    })
}
