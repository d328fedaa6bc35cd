use std::sync::Arc;

use reelvault_core::StorageLocator;
use reelvault_storage::{Storage, StorageResult};

use crate::staging::StagedFile;

/// Streams staged files into the configured object store.
#[derive(Clone)]
pub struct ObjectStoreUploader {
    storage: Arc<dyn Storage>,
}

impl ObjectStoreUploader {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Upload `file` under `locator`. Returns the unsigned object URL.
    pub async fn upload(
        &self,
        file: &StagedFile,
        locator: &StorageLocator,
        content_type: &str,
    ) -> StorageResult<String> {
        tracing::debug!(
            key = %locator,
            size_bytes = file.size(),
            store_id = %self.storage.store_id(),
            "Uploading staged video"
        );
        self.storage
            .upload_file(locator, file.path(), content_type)
            .await
    }

    /// Best-effort removal of an object that will not be referenced.
    pub async fn discard(&self, locator: &StorageLocator) {
        match self.storage.delete(locator.as_str()).await {
            Ok(()) => tracing::info!(key = %locator, "Deleted orphaned object"),
            Err(e) => tracing::warn!(
                error = %e,
                key = %locator,
                "Failed to delete orphaned object"
            ),
        }
    }
}
