use std::path::PathBuf;
use std::sync::Arc;

use super::tool::{MediaTool, MediaToolError};
use crate::staging::StagedFile;

/// Rewrites a staged upload so its index sits at the front of the file.
#[derive(Clone)]
pub struct FastStartTranscoder {
    tool: Arc<dyn MediaTool>,
    staging_dir: PathBuf,
}

impl FastStartTranscoder {
    pub fn new(tool: Arc<dyn MediaTool>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            staging_dir: staging_dir.into(),
        }
    }

    /// Remux `input` into a new staged file. `input` is left untouched.
    ///
    /// On failure the partial output is deleted before returning.
    pub async fn transcode(&self, input: &StagedFile) -> Result<StagedFile, MediaToolError> {
        let output = tempfile::Builder::new()
            .prefix("reelvault-faststart-")
            .suffix(".mp4")
            .tempfile_in(&self.staging_dir)?
            .into_temp_path();

        // `output` is dropped (and removed) on every early return below
        self.tool.remux(input.path(), &output).await?;
        let size = tokio::fs::metadata(&output).await?.len();

        tracing::debug!(
            input_bytes = input.size(),
            output_bytes = size,
            "Fast-start output staged"
        );

        Ok(StagedFile::new(output, size, input.media_type().to_string()))
    }
}
