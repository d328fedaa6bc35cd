use anyhow::Context;
use reelvault_core::{AspectClass, VideoRecord};
use reelvault_processing::{IngestOutcome, UploadRequest};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Build an upload request that streams `path` from disk.
pub async fn upload_request_from_file(
    path: &Path,
    content_type: &str,
    user_id: Uuid,
    video_id: Uuid,
) -> anyhow::Result<UploadRequest> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let content_length = file.metadata().await.ok().map(|m| m.len());

    Ok(UploadRequest {
        user_id,
        video_id,
        content_type: content_type.to_string(),
        content_length,
        body: Box::pin(file),
    })
}

/// What `reelvault ingest` prints.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub video: VideoRecord,
    pub locator: String,
    pub aspect_class: AspectClass,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

impl IngestReport {
    /// `video` is the record as a reader would see it (URL already signed).
    pub fn new(outcome: &IngestOutcome, video: VideoRecord) -> Self {
        Self {
            video,
            locator: outcome.locator.encode(),
            aspect_class: outcome.aspect_class,
            width: outcome.geometry.width,
            height: outcome.geometry.height,
            size_bytes: outcome.size_bytes,
        }
    }
}
