//! Ingestion pipeline: validate → stage → remux → classify → upload → persist.
//!
//! Every temporary file is owned by a [`StagedFile`] local to one
//! [`IngestionPipeline::ingest`] call, so any early return releases it. The
//! record is only written after the upload succeeded; if that write fails the
//! uploaded object is deleted on a best-effort basis.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::pin::Pin;
use std::sync::Arc;

use reelvault_core::{AspectClass, Config, ErrorMetadata, LogLevel, StorageLocator, VideoRecord};
use reelvault_storage::{
    derive_storage_key, locator_for, LocatorError, PersistedLocator, Storage, StorageError,
};
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::records::{RecordError, VideoRecords};
use crate::staging::{StagingError, UploadStager};
use crate::upload::ObjectStoreUploader;
use crate::validator::{MediaValidator, ValidationError};
use crate::video::{AspectClassifier, FastStartTranscoder, MediaTool, MediaToolError, VideoGeometry};

/// Inbound upload for an existing video resource.
pub struct UploadRequest {
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub content_type: String,
    /// Declared by the client; only used for an early rejection.
    pub content_length: Option<u64>,
    pub body: Pin<Box<dyn AsyncRead + Send + Unpin>>,
}

/// Stage at which an ingestion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Validation,
    Staging,
    Transcode,
    Probe,
    Upload,
    Persist,
}

impl Display for IngestStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            IngestStage::Validation => "validation",
            IngestStage::Staging => "staging",
            IngestStage::Transcode => "transcode",
            IngestStage::Probe => "probe",
            IngestStage::Upload => "upload",
            IngestStage::Persist => "persist",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to load video record: {0}")]
    RecordLookup(#[source] RecordError),

    #[error("Staging failed: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Transcode failed: {0}")]
    Transcode(#[source] MediaToolError),

    #[error("Probe failed: {0}")]
    Probe(#[source] MediaToolError),

    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("Invalid locator: {0}")]
    Locator(#[from] LocatorError),

    #[error("Failed to persist video record: {0}")]
    Persist(#[source] RecordError),
}

impl IngestError {
    pub fn stage(&self) -> IngestStage {
        match self {
            IngestError::Validation(_) | IngestError::RecordLookup(_) => IngestStage::Validation,
            IngestError::Staging(_) => IngestStage::Staging,
            IngestError::Transcode(_) => IngestStage::Transcode,
            IngestError::Probe(_) => IngestStage::Probe,
            IngestError::Upload(_) => IngestStage::Upload,
            IngestError::Locator(_) | IngestError::Persist(_) => IngestStage::Persist,
        }
    }
}

impl From<StagingError> for IngestError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::Rejected(e) => IngestError::Validation(e),
            StagingError::Io(e) => IngestError::Staging(e),
        }
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        match self {
            IngestError::Validation(ValidationError::UnsupportedMediaType { .. }) => 415,
            IngestError::Validation(ValidationError::PayloadTooLarge { .. }) => 413,
            IngestError::Validation(ValidationError::NotFound(_)) => 404,
            IngestError::Validation(ValidationError::Forbidden { .. }) => 403,
            _ => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            IngestError::Validation(ValidationError::UnsupportedMediaType { .. }) => {
                "UNSUPPORTED_MEDIA_TYPE"
            }
            IngestError::Validation(ValidationError::PayloadTooLarge { .. }) => "PAYLOAD_TOO_LARGE",
            IngestError::Validation(ValidationError::NotFound(_)) => "NOT_FOUND",
            IngestError::Validation(ValidationError::Forbidden { .. }) => "FORBIDDEN",
            IngestError::RecordLookup(_) | IngestError::Persist(_) => "PERSIST_FAILED",
            IngestError::Staging(_) => "STAGING_FAILED",
            IngestError::Transcode(_) => "TRANSCODE_FAILED",
            IngestError::Probe(_) => "PROBE_FAILED",
            IngestError::Upload(_) => "UPLOAD_FAILED",
            IngestError::Locator(_) => "INVALID_LOCATOR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IngestError::Staging(_)
                | IngestError::Upload(_)
                | IngestError::RecordLookup(_)
                | IngestError::Persist(_)
        )
    }

    fn client_message(&self) -> String {
        match self {
            IngestError::Validation(e) => e.to_string(),
            IngestError::Staging(_) => "Could not read the uploaded file".to_string(),
            IngestError::Transcode(_) => "Error processing video".to_string(),
            IngestError::Probe(_) => "Could not read video dimensions".to_string(),
            IngestError::Upload(_) => "Could not store video".to_string(),
            IngestError::RecordLookup(_) | IngestError::Locator(_) | IngestError::Persist(_) => {
                "Could not update video".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            IngestError::Validation(_) => LogLevel::Debug,
            IngestError::Staging(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub record: VideoRecord,
    pub locator: PersistedLocator,
    pub aspect_class: AspectClass,
    pub geometry: VideoGeometry,
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct IngestionPipeline {
    stager: UploadStager,
    transcoder: FastStartTranscoder,
    classifier: AspectClassifier,
    uploader: ObjectStoreUploader,
    records: Arc<dyn VideoRecords>,
}

impl IngestionPipeline {
    pub fn new(
        stager: UploadStager,
        tool: Arc<dyn MediaTool>,
        storage: Arc<dyn Storage>,
        records: Arc<dyn VideoRecords>,
    ) -> Self {
        Self {
            transcoder: FastStartTranscoder::new(tool.clone(), stager.staging_dir()),
            classifier: AspectClassifier::new(tool),
            uploader: ObjectStoreUploader::new(storage),
            stager,
            records,
        }
    }

    /// Build a pipeline with the size bound, allow-list and staging directory from `config`.
    pub fn from_config(
        config: &Config,
        tool: Arc<dyn MediaTool>,
        storage: Arc<dyn Storage>,
        records: Arc<dyn VideoRecords>,
    ) -> Self {
        let validator = MediaValidator::new(
            config.max_video_size_bytes(),
            config.video_allowed_content_types().to_vec(),
        );
        let stager = UploadStager::new(config.staging_dir(), validator);
        Self::new(stager, tool, storage, records)
    }

    /// Run one ingestion to completion.
    #[tracing::instrument(skip(self, request), fields(
        user_id = %request.user_id,
        video_id = %request.video_id,
        content_type = %request.content_type
    ))]
    pub async fn ingest(&self, request: UploadRequest) -> Result<IngestOutcome, IngestError> {
        let start = std::time::Instant::now();
        let result = self.run(request).await;

        match &result {
            Ok(outcome) => tracing::info!(
                key = %outcome.locator.locator(),
                store_id = %outcome.locator.store_id(),
                aspect_class = %outcome.aspect_class,
                size_bytes = outcome.size_bytes,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Video ingested"
            ),
            Err(e) => match e.log_level() {
                LogLevel::Debug => tracing::debug!(error = %e, stage = %e.stage(), "Video ingestion rejected"),
                LogLevel::Warn => tracing::warn!(error = %e, stage = %e.stage(), "Video ingestion failed"),
                LogLevel::Error => tracing::error!(error = %e, stage = %e.stage(), "Video ingestion failed"),
            },
        }

        result
    }

    async fn run(&self, request: UploadRequest) -> Result<IngestOutcome, IngestError> {
        let UploadRequest {
            user_id,
            video_id,
            content_type,
            content_length,
            body,
        } = request;

        let video = self.authorize(user_id, video_id).await?;

        let staged = self
            .stager
            .stage(&content_type, content_length, body)
            .await?;

        let transcoded = self
            .transcoder
            .transcode(&staged)
            .await
            .map_err(IngestError::Transcode)?;
        drop(staged);

        let (aspect_class, geometry) = self
            .classifier
            .classify(transcoded.path())
            .await
            .map_err(IngestError::Probe)?;

        let key = derive_storage_key(transcoded.media_type());
        let locator = locator_for(aspect_class, &key);
        self.uploader
            .upload(&transcoded, &locator, transcoded.media_type())
            .await?;

        let (record, persisted) = self.persist(&video, locator, transcoded.size()).await?;

        Ok(IngestOutcome {
            record,
            locator: persisted,
            aspect_class,
            geometry,
            size_bytes: transcoded.size(),
        })
    }

    /// Load the target record and check it belongs to `user_id`.
    async fn authorize(&self, user_id: Uuid, video_id: Uuid) -> Result<VideoRecord, IngestError> {
        let video = self
            .records
            .get_video(video_id)
            .await
            .map_err(IngestError::RecordLookup)?
            .ok_or(ValidationError::NotFound(video_id))?;

        if video.user_id != user_id {
            return Err(ValidationError::Forbidden { user_id, video_id }.into());
        }
        Ok(video)
    }

    /// Point the record at the uploaded object. Deletes the object if that fails.
    async fn persist(
        &self,
        video: &VideoRecord,
        locator: StorageLocator,
        size_bytes: u64,
    ) -> Result<(VideoRecord, PersistedLocator), IngestError> {
        let store_id = self.uploader.storage().store_id();
        let persisted = match PersistedLocator::new(store_id, locator.clone()) {
            Ok(persisted) => persisted,
            Err(e) => {
                self.uploader.discard(&locator).await;
                return Err(e.into());
            }
        };

        let updated = video.with_video_url(persisted.encode());
        if let Err(e) = self.records.update_video(&updated).await {
            tracing::warn!(
                error = %e,
                key = %locator,
                size_bytes,
                "Record update failed after upload; removing object"
            );
            self.uploader.discard(&locator).await;
            return Err(IngestError::Persist(e));
        }

        Ok((updated, persisted))
    }
}
