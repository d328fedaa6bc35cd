use async_trait::async_trait;
use std::path::Path;

/// Width and height of the primary video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
}

impl VideoGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `width / height`, or `None` for a zero height.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaToolError {
    #[error("Invalid tool path: {0}")]
    InvalidPath(String),

    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to parse probe output: {0}")]
    Parse(String),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Invalid video geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// External media tooling used by ingestion.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Copy all streams of `input` into an MP4 at `output` with the index
    /// moved to the front. Samples are not re-encoded. Returns only after the
    /// underlying process has exited.
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaToolError>;

    /// Geometry of the first video stream in `input`.
    async fn probe(&self, input: &Path) -> Result<VideoGeometry, MediaToolError>;
}
