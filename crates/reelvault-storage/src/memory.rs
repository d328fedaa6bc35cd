//! Bounded in-memory storage backend
//!
//! Holds at most `capacity` objects; inserting beyond that evicts the least
//! recently used one. Intended for tests and single-process development runs.

use crate::signing::UrlSigner;
use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use lru::LruCache;
use reelvault_core::StorageLocator;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

pub struct MemoryStorage {
    store_id: String,
    objects: Mutex<LruCache<String, StoredObject>>,
    signer: UrlSigner,
}

impl MemoryStorage {
    pub fn new(
        store_id: impl Into<String>,
        capacity: NonZeroUsize,
        signer: UrlSigner,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            objects: Mutex::new(LruCache::new(capacity)),
            signer,
        }
    }

    fn objects(&self) -> StorageResult<MutexGuard<'_, LruCache<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| StorageError::BackendError("memory store lock poisoned".to_string()))
    }

    /// Content type recorded for `storage_key`, if the object is present.
    pub fn content_type(&self, storage_key: &str) -> StorageResult<Option<String>> {
        Ok(self
            .objects()?
            .peek(storage_key)
            .map(|object| object.content_type.clone()))
    }

    /// Number of objects currently held.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.objects()?.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Bytes stored under `storage_key`. Marks the object as recently used.
    pub fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.objects()?
            .get(storage_key)
            .map(|object| object.data.to_vec())
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    pub fn contains(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects()?.contains(storage_key))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn store_id(&self) -> &str {
        &self.store_id
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn upload_file(
        &self,
        locator: &StorageLocator,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String> {
        let key = locator.as_str();
        validate_key(key)?;

        let data = tokio::fs::read(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let size = data.len();

        let object = StoredObject {
            data: Bytes::from(data),
            content_type: content_type.to_string(),
        };

        let evicted = self.objects()?.push(key.to_string(), object);
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                tracing::debug!(
                    key = %evicted_key,
                    store_id = %self.store_id,
                    "Memory storage evicted least recently used object"
                );
            }
        }

        tracing::info!(
            key = %key,
            size_bytes = size,
            "Memory storage upload successful"
        );

        Ok(self.signer.object_url(key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects()?.pop(storage_key);
        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        self.signer.sign(storage_key, expires_at)
    }
}
