//! Read-side resolution of persisted locators into signed URLs

use chrono::{DateTime, Utc};
use reelvault_core::VideoRecord;
use reelvault_storage::{DecodedLocator, PersistedLocator, Storage, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Unknown store: {0}")]
    UnknownStore(String),

    #[error("Invalid URL lifetime: {0}")]
    InvalidTtl(String),

    #[error("Failed to sign URL: {0}")]
    Signer(#[from] StorageError),
}

/// Time-limited URL for a stored object. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues signed URLs for locators written by any registered store.
#[derive(Clone)]
pub struct PresignedUrlIssuer {
    stores: HashMap<String, Arc<dyn Storage>>,
    ttl: Duration,
}

impl PresignedUrlIssuer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            stores: HashMap::new(),
            ttl,
        }
    }

    /// Register `storage` under its store identifier.
    pub fn with_store(mut self, storage: Arc<dyn Storage>) -> Self {
        self.stores.insert(storage.store_id().to_string(), storage);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signed URL for `locator`, valid for the configured TTL from now.
    pub async fn issue(&self, locator: &PersistedLocator) -> Result<SignedUrl, SigningError> {
        let storage = self
            .stores
            .get(locator.store_id())
            .ok_or_else(|| SigningError::UnknownStore(locator.store_id().to_string()))?;

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| SigningError::InvalidTtl(e.to_string()))?;
        let issued_at = Utc::now();
        let expires_at = issued_at + ttl;
        let url = storage
            .get_presigned_url(locator.locator().as_str(), expires_at)
            .await?;

        tracing::debug!(
            store_id = %locator.store_id(),
            key = %locator.locator(),
            ttl_secs = self.ttl.as_secs(),
            "Issued presigned URL"
        );

        Ok(SignedUrl {
            url,
            issued_at,
            expires_at,
        })
    }

    /// Resolve a persisted field for a reader.
    ///
    /// Values that do not decode to a locator are returned unchanged.
    pub async fn resolve(&self, field: &str) -> Result<String, SigningError> {
        match PersistedLocator::decode(field) {
            DecodedLocator::Signable(locator) => Ok(self.issue(&locator).await?.url),
            DecodedLocator::Unsignable(raw) => Ok(raw),
        }
    }
}

/// Copy of `video` whose `video_url` is a presigned URL instead of a locator.
///
/// Records without a locator are returned as they are.
pub async fn sign_video_record(
    issuer: &PresignedUrlIssuer,
    video: &VideoRecord,
) -> Result<VideoRecord, SigningError> {
    let Some(field) = video.video_url.as_deref() else {
        return Ok(video.clone());
    };

    let url = issuer.resolve(field).await?;
    Ok(VideoRecord {
        video_url: Some(url),
        ..video.clone()
    })
}
