//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelvault_core::StorageLocator;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("URL signing failed: {0}")]
    SigningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem, in-memory) implement this trait,
/// so ingestion and retrieval never depend on a specific backend.
///
/// **Key format:** keys are storage locators, `{aspect-folder}/{key}.{ext}`.
/// They never contain `..` or a leading `/`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Identifier persisted next to every locator written by this backend
    /// (the bucket name for S3).
    fn store_id(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Stream the file at `path` into the store under `locator`, tagging the
    /// object with `content_type`. Returns the object's unsigned URL.
    ///
    /// The file is read incrementally; implementations must not publish a
    /// partially written object when the upload fails.
    async fn upload_file(
        &self,
        locator: &StorageLocator,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Delete a file by its storage key
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Generate a presigned/temporary URL for direct access (GET)
    ///
    /// The URL stops being valid at `expires_at`.
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<String>;
}

/// Reject keys that could escape a backend's namespace.
pub(crate) fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
