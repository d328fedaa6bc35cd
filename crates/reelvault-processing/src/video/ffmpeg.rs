//! ffmpeg/ffprobe backed [`MediaTool`]

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::tool::{MediaTool, MediaToolError, VideoGeometry};

/// Validate that a path doesn't contain shell metacharacters or dangerous sequences
fn validate_tool_path(path: &str) -> Result<(), MediaToolError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(MediaToolError::InvalidPath(format!(
            "contains dangerous characters: {}",
            path
        )));
    }

    if path.contains("..") {
        return Err(MediaToolError::InvalidPath(format!(
            "contains directory traversal: {}",
            path
        )));
    }

    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\')
    {
        return Err(MediaToolError::InvalidPath(format!(
            "contains unsafe characters: {}",
            path
        )));
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Pick the first video stream out of `ffprobe -print_format json` output.
fn parse_probe_output(stdout: &[u8]) -> Result<VideoGeometry, MediaToolError> {
    let probe: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| MediaToolError::Parse(e.to_string()))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        .ok_or(MediaToolError::NoVideoStream)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(VideoGeometry::new(width, height)),
        _ => Err(MediaToolError::Parse(
            "video stream has no width/height".to_string(),
        )),
    }
}

pub struct FFmpegTool {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FFmpegTool {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        ffprobe_path: impl Into<String>,
    ) -> Result<Self, MediaToolError> {
        let ffmpeg_path = ffmpeg_path.into();
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffmpeg_path)?;
        validate_tool_path(&ffprobe_path)?;

        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
        })
    }

    async fn run(&self, tool: &str, command: &mut Command) -> Result<Vec<u8>, MediaToolError> {
        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MediaToolError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(MediaToolError::Failed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaTool for FFmpegTool {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        process.command = "ffmpeg",
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaToolError> {
        let start = std::time::Instant::now();

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output);

        self.run("ffmpeg", &mut command).await.map_err(|e| {
            tracing::warn!(error = %e, "Fast-start remux failed");
            e
        })?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            "Fast-start remux completed"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        process.command = "ffprobe",
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, input: &Path) -> Result<VideoGeometry, MediaToolError> {
        let start = std::time::Instant::now();

        let mut command = Command::new(&self.ffprobe_path);
        command
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(input);

        let stdout = self.run("ffprobe", &mut command).await?;
        let geometry = parse_probe_output(&stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = geometry.width,
            height = geometry.height,
            "Video probe completed"
        );
        Ok(geometry)
    }
}
