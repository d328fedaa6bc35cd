#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelvault_core::{StorageLocator, VideoRecord};
use reelvault_processing::{
    IngestionPipeline, InMemoryVideoRecords, MediaTool, MediaToolError, MediaValidator,
    PresignedUrlIssuer, RecordError, UploadRequest, UploadStager, VideoGeometry, VideoRecords,
};
use reelvault_storage::{
    MemoryStorage, Storage, StorageBackend, StorageError, StorageResult, UrlSigner,
};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const STORE_ID: &str = "mem";
pub const SIGNING_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const BASE_URL: &str = "https://videos.example.com";
pub const MAX_UPLOAD_BYTES: u64 = 1024;

/// Copies instead of remuxing; reports a fixed geometry.
pub struct FakeMediaTool {
    geometry: VideoGeometry,
    fail_remux: bool,
    fail_probe: bool,
    remux_calls: AtomicUsize,
}

impl FakeMediaTool {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            geometry: VideoGeometry::new(width, height),
            fail_remux: false,
            fail_probe: false,
            remux_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_remux(mut self) -> Self {
        self.fail_remux = true;
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    pub fn remux_calls(&self) -> usize {
        self.remux_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTool for FakeMediaTool {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaToolError> {
        self.remux_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_remux {
            tokio::fs::write(output, b"half-written").await?;
            return Err(MediaToolError::Failed {
                tool: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn probe(&self, _input: &Path) -> Result<VideoGeometry, MediaToolError> {
        if self.fail_probe {
            return Err(MediaToolError::NoVideoStream);
        }
        Ok(self.geometry)
    }
}

/// Storage whose uploads always fail.
pub struct BrokenStorage;

#[async_trait]
impl Storage for BrokenStorage {
    fn store_id(&self) -> &str {
        STORE_ID
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn upload_file(
        &self,
        _locator: &StorageLocator,
        _path: &Path,
        _content_type: &str,
    ) -> StorageResult<String> {
        Err(StorageError::UploadFailed("connection reset".to_string()))
    }

    async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn get_presigned_url(
        &self,
        _storage_key: &str,
        _expires_at: DateTime<Utc>,
    ) -> StorageResult<String> {
        Err(StorageError::SigningFailed("unavailable".to_string()))
    }
}

/// Record store that serves reads but rejects every update.
pub struct ReadOnlyRecords {
    inner: InMemoryVideoRecords,
}

#[async_trait]
impl VideoRecords for ReadOnlyRecords {
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, RecordError> {
        self.inner.get_video(id).await
    }

    async fn update_video(&self, _record: &VideoRecord) -> Result<(), RecordError> {
        Err(RecordError::Backend("database is read-only".to_string()))
    }
}

pub struct TestPipeline {
    pub pipeline: IngestionPipeline,
    pub storage: Arc<MemoryStorage>,
    pub records: Arc<InMemoryVideoRecords>,
    pub tool: Arc<FakeMediaTool>,
    pub issuer: PresignedUrlIssuer,
    pub staging: TempDir,
    pub owner: Uuid,
    pub video: VideoRecord,
}

impl TestPipeline {
    pub fn request(&self, content_type: &str, body: Vec<u8>) -> UploadRequest {
        request(self.owner, self.video.id, content_type, body)
    }

    pub fn staging_is_empty(&self) -> bool {
        std::fs::read_dir(self.staging.path()).unwrap().next().is_none()
    }

    pub async fn stored_record(&self) -> VideoRecord {
        self.records.get_video(self.video.id).await.unwrap().unwrap()
    }
}

pub fn memory_storage() -> Arc<MemoryStorage> {
    Arc::new(MemoryStorage::new(
        STORE_ID,
        NonZeroUsize::new(16).unwrap(),
        UrlSigner::new(SIGNING_SECRET, BASE_URL),
    ))
}

pub fn request(user_id: Uuid, video_id: Uuid, content_type: &str, body: Vec<u8>) -> UploadRequest {
    UploadRequest {
        user_id,
        video_id,
        content_type: content_type.to_string(),
        content_length: Some(body.len() as u64),
        body: Box::pin(std::io::Cursor::new(body)),
    }
}

fn stager(staging: &TempDir) -> UploadStager {
    UploadStager::new(
        staging.path(),
        MediaValidator::new(MAX_UPLOAD_BYTES, vec!["video/mp4".to_string()]),
    )
}

fn seeded_records(owner: Uuid) -> (Arc<InMemoryVideoRecords>, VideoRecord) {
    let records = Arc::new(InMemoryVideoRecords::new());
    let video = VideoRecord::new(Uuid::new_v4(), owner, "holiday clip");
    records.insert(video.clone()).unwrap();
    (records, video)
}

/// Pipeline over an in-memory store and record set with one video owned by `owner`.
pub fn setup_test_pipeline(tool: FakeMediaTool) -> TestPipeline {
    let staging = tempfile::tempdir().unwrap();
    let storage = memory_storage();
    let owner = Uuid::new_v4();
    let (records, video) = seeded_records(owner);
    let tool = Arc::new(tool);

    let pipeline = IngestionPipeline::new(
        stager(&staging),
        tool.clone(),
        storage.clone(),
        records.clone(),
    );
    let issuer = PresignedUrlIssuer::new(Duration::from_secs(3600)).with_store(storage.clone());

    TestPipeline {
        pipeline,
        storage,
        records,
        tool,
        issuer,
        staging,
        owner,
        video,
    }
}

/// Pipeline whose uploads fail.
pub fn setup_pipeline_with_broken_storage() -> TestPipeline {
    let mut setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));
    setup.pipeline = IngestionPipeline::new(
        stager(&setup.staging),
        setup.tool.clone(),
        Arc::new(BrokenStorage),
        setup.records.clone(),
    );
    setup
}

/// Pipeline whose record updates fail after a successful upload.
pub fn setup_pipeline_with_read_only_records() -> TestPipeline {
    let mut setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));
    let inner = InMemoryVideoRecords::new();
    inner.insert(setup.video.clone()).unwrap();
    setup.pipeline = IngestionPipeline::new(
        stager(&setup.staging),
        setup.tool.clone(),
        setup.storage.clone(),
        Arc::new(ReadOnlyRecords { inner }),
    );
    setup
}

/// Bytes that stand in for an MP4 upload.
pub fn fake_mp4(len: usize) -> Vec<u8> {
    let mut body = b"\x00\x00\x00\x18ftypmp42".to_vec();
    body.resize(len.max(body.len()), 0xAB);
    body
}
