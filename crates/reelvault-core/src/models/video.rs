use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Video resource record as held by the metadata store.
///
/// `video_url` carries the persisted locator field after ingestion. Older
/// records may hold a plain URL there instead; readers pass those through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(id: Uuid, user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            title: title.into(),
            description: None,
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this record pointing at a new persisted locator field.
    pub fn with_video_url(&self, video_url: String) -> Self {
        Self {
            video_url: Some(video_url),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}
