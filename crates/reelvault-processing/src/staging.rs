//! Upload staging
//!
//! Copies an inbound byte stream into a temporary file under the staging
//! directory while enforcing the size bound. The file is owned by the
//! returned [`StagedFile`] and removed when it is dropped, whichever way the
//! ingestion ends.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::validator::{MediaValidator, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Temporary file exclusively owned by one ingestion.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
    media_type: String,
}

impl StagedFile {
    pub(crate) fn new(path: TempPath, size: u64, media_type: String) -> Self {
        Self {
            path,
            size,
            media_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Normalized media type declared for the upload.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}

/// Writes validated upload streams to temporary files.
#[derive(Debug, Clone)]
pub struct UploadStager {
    staging_dir: PathBuf,
    validator: MediaValidator,
}

impl UploadStager {
    pub fn new(staging_dir: impl Into<PathBuf>, validator: MediaValidator) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            validator,
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Stage `reader` as a file of media type `content_type`.
    ///
    /// The media type and the declared length are checked before anything is
    /// read. The declared length is untrusted; the bound is enforced on the
    /// bytes actually copied. A stream that ends before its declared length is
    /// treated as an aborted upload.
    pub async fn stage<R>(
        &self,
        content_type: &str,
        declared_length: Option<u64>,
        reader: R,
    ) -> Result<StagedFile, StagingError>
    where
        R: AsyncRead + Unpin,
    {
        let media_type = self.validator.validate_content_type(content_type)?;
        if let Some(declared) = declared_length {
            self.validator.validate_file_size(declared)?;
        }

        let max = self.validator.max_file_size();
        let start = std::time::Instant::now();

        let (file, path) = tempfile::Builder::new()
            .prefix("reelvault-upload-")
            .tempfile_in(&self.staging_dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        // One byte past the bound is enough to tell an oversized stream apart
        let mut limited = reader.take(max.saturating_add(1));
        let copied = tokio::io::copy(&mut limited, &mut file).await?;

        if copied > max {
            tracing::warn!(
                max_bytes = max,
                declared_bytes = ?declared_length,
                "Upload exceeded size limit while staging"
            );
            return Err(ValidationError::PayloadTooLarge { size: copied, max }.into());
        }

        if let Some(declared) = declared_length.filter(|&declared| copied < declared) {
            tracing::warn!(
                declared_bytes = declared,
                received_bytes = copied,
                "Upload stream ended before declared length"
            );
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("upload ended after {} of {} bytes", copied, declared),
            )
            .into());
        }

        file.flush().await?;
        file.sync_all().await?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = copied,
            media_type = %media_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload staged"
        );

        Ok(StagedFile::new(path, copied, media_type))
    }
}
