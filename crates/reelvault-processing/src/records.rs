//! Video record capability
//!
//! The metadata database lives outside this crate. The pipeline reads the
//! target record to check ownership and writes it back with the new locator.

use async_trait::async_trait;
use reelvault_core::VideoRecord;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Video not found: {0}")]
    NotFound(Uuid),

    #[error("Record store error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait VideoRecords: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, RecordError>;

    /// Replace the stored record with `record`. Concurrent updates to the
    /// same id are last-write-wins.
    async fn update_video(&self, record: &VideoRecord) -> Result<(), RecordError>;
}

/// Process-local record store, used by the CLI and tests.
#[derive(Default)]
pub struct InMemoryVideoRecords {
    videos: Mutex<HashMap<Uuid, VideoRecord>>,
}

impl InMemoryVideoRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn videos(&self) -> Result<MutexGuard<'_, HashMap<Uuid, VideoRecord>>, RecordError> {
        self.videos
            .lock()
            .map_err(|_| RecordError::Backend("record store lock poisoned".to_string()))
    }

    pub fn insert(&self, record: VideoRecord) -> Result<(), RecordError> {
        self.videos()?.insert(record.id, record);
        Ok(())
    }
}

#[async_trait]
impl VideoRecords for InMemoryVideoRecords {
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, RecordError> {
        Ok(self.videos()?.get(&id).cloned())
    }

    async fn update_video(&self, record: &VideoRecord) -> Result<(), RecordError> {
        let mut videos = self.videos()?;
        match videos.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(RecordError::NotFound(record.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_replaces_record() {
        let records = InMemoryVideoRecords::new();
        let video = VideoRecord::new(Uuid::new_v4(), Uuid::new_v4(), "clip");
        records.insert(video.clone()).unwrap();

        let updated = video.with_video_url("bucket,landscape/k.mp4".to_string());
        records.update_video(&updated).await.unwrap();

        let stored = records.get_video(video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url.as_deref(), Some("bucket,landscape/k.mp4"));
        assert_eq!(stored.title, "clip");
        assert!(stored.updated_at >= video.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let records = InMemoryVideoRecords::new();
        let video = VideoRecord::new(Uuid::new_v4(), Uuid::new_v4(), "clip");
        assert!(matches!(
            records.update_video(&video).await,
            Err(RecordError::NotFound(_))
        ));
        assert!(records.get_video(video.id).await.unwrap().is_none());
    }
}
