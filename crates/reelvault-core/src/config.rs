//! Configuration module
//!
//! This module provides the configuration for the ingestion pipeline: storage
//! backend selection, upload limits, media tool paths, and URL signing.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_MAX_VIDEO_SIZE_BYTES, DEFAULT_MEMORY_STORE_CAPACITY, DEFAULT_VIDEO_CONTENT_TYPES,
    FAST_START_CONTENT_TYPES, LOCATOR_SEPARATOR, PRESIGNED_URL_TTL_SECS,
};
use crate::storage_types::StorageBackend;

const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Ingestion configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_store_id: String,
    pub memory_store_capacity: usize,
    /// HMAC key for backends that sign their own URLs (local, memory).
    pub url_signing_secret: Option<String>,
    pub presigned_url_ttl_secs: u64,
    // Upload limits
    pub max_video_size_bytes: u64,
    pub video_allowed_content_types: Vec<String>,
    // Media tools
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub staging_dir: Option<PathBuf>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestConfig>);

impl Config {
    fn as_ingest(&self) -> &IngestConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_ingest().validate()
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_ingest().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_ingest().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_ingest().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_ingest().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_ingest().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_ingest().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_ingest().local_storage_base_url.as_deref()
    }

    pub fn local_store_id(&self) -> &str {
        &self.as_ingest().local_store_id
    }

    pub fn memory_store_capacity(&self) -> usize {
        self.as_ingest().memory_store_capacity
    }

    pub fn url_signing_secret(&self) -> Option<&str> {
        self.as_ingest().url_signing_secret.as_deref()
    }

    pub fn presigned_url_ttl(&self) -> Duration {
        Duration::from_secs(self.as_ingest().presigned_url_ttl_secs)
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.as_ingest().max_video_size_bytes
    }

    pub fn video_allowed_content_types(&self) -> &[String] {
        &self.as_ingest().video_allowed_content_types
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_ingest().ffmpeg_path
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_ingest().ffprobe_path
    }

    /// Directory for staged uploads; the system temp dir when unset.
    pub fn staging_dir(&self) -> PathBuf {
        self.as_ingest()
            .staging_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            storage_backend: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: None,
            local_storage_base_url: None,
            local_store_id: "local".to_string(),
            memory_store_capacity: DEFAULT_MEMORY_STORE_CAPACITY,
            url_signing_secret: None,
            presigned_url_ttl_secs: PRESIGNED_URL_TTL_SECS,
            max_video_size_bytes: DEFAULT_MAX_VIDEO_SIZE_BYTES,
            video_allowed_content_types: DEFAULT_VIDEO_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            staging_dir: None,
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = IngestConfig::default();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => Some(s.parse::<StorageBackend>()?),
            Err(_) => None,
        };

        let max_video_size_bytes = match env::var("MAX_VIDEO_SIZE_MB")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(mb) => megabytes_to_bytes(mb)?,
            None => defaults.max_video_size_bytes,
        };

        let video_allowed_content_types = env::var("VIDEO_ALLOWED_CONTENT_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|ct| ct.trim().to_lowercase())
                    .filter(|ct| !ct.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.video_allowed_content_types);

        let config = IngestConfig {
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            local_store_id: env::var("LOCAL_STORE_ID").unwrap_or(defaults.local_store_id),
            memory_store_capacity: env::var("MEMORY_STORE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.memory_store_capacity),
            url_signing_secret: env::var("URL_SIGNING_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            presigned_url_ttl_secs: env::var("PRESIGNED_URL_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.presigned_url_ttl_secs),
            max_video_size_bytes,
            video_allowed_content_types,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            staging_dir: env::var("STAGING_DIR").ok().map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than zero"));
        }

        if self.video_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES must list at least one media type"
            ));
        }

        if let Some(unsupported) = self
            .video_allowed_content_types
            .iter()
            .find(|ct| !FAST_START_CONTENT_TYPES.contains(&ct.trim().to_ascii_lowercase().as_str()))
        {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES entry '{}' cannot be produced by the fast-start remux (supported: {})",
                unsupported,
                FAST_START_CONTENT_TYPES.join(", ")
            ));
        }

        if self.presigned_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "PRESIGNED_URL_TTL_SECS must be greater than zero"
            ));
        }

        // Validate storage backend configuration
        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                self.validate_signing_secret()?;
            }
            StorageBackend::Memory => {
                if self.memory_store_capacity == 0 {
                    return Err(anyhow::anyhow!(
                        "MEMORY_STORE_CAPACITY must be greater than zero"
                    ));
                }
                self.validate_signing_secret()?;
            }
        }

        // The store id is persisted in front of every locator
        let (store_id, var) = match backend {
            StorageBackend::S3 => (self.s3_bucket.as_deref().unwrap_or_default(), "S3_BUCKET"),
            StorageBackend::Local | StorageBackend::Memory => {
                (self.local_store_id.as_str(), "LOCAL_STORE_ID")
            }
        };
        if store_id.is_empty() || store_id.contains(LOCATOR_SEPARATOR) {
            return Err(anyhow::anyhow!(
                "{} must be non-empty and must not contain '{}'",
                var,
                LOCATOR_SEPARATOR
            ));
        }

        Ok(())
    }

    fn validate_signing_secret(&self) -> Result<(), anyhow::Error> {
        match self.url_signing_secret.as_deref() {
            Some(secret) if secret.len() >= MIN_SIGNING_SECRET_LEN => Ok(()),
            Some(_) => Err(anyhow::anyhow!(
                "URL_SIGNING_SECRET must be at least {} characters long",
                MIN_SIGNING_SECRET_LEN
            )),
            None => Err(anyhow::anyhow!(
                "URL_SIGNING_SECRET must be set for local and memory storage backends"
            )),
        }
    }
}

/// Convert a `MAX_VIDEO_SIZE_MB` value to bytes.
fn megabytes_to_bytes(mb: u64) -> Result<u64, anyhow::Error> {
    mb.checked_mul(1024 * 1024).ok_or_else(|| {
        anyhow::anyhow!("MAX_VIDEO_SIZE_MB is too large: {} MiB overflows a byte count", mb)
    })
}
