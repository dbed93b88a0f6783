use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::{SpecialtyId, TeacherId, VideoId};
use crate::storage::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: VideoId,
    pub teacher: TeacherId,
    pub specialty: SpecialtyId,
    pub title: String,
    pub video_url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoUpsert {
    Created(VideoRecord),
    Replaced(VideoRecord),
}

impl VideoUpsert {
    pub fn record(&self) -> &VideoRecord {
        match self {
            VideoUpsert::Created(record) | VideoUpsert::Replaced(record) => record,
        }
    }
}

/// Storage for teacher demo videos.
pub trait VideoCatalog: Send + Sync {
    /// Find-or-replace keyed on (teacher, specialty), applied atomically.
    /// A replacement keeps the stored id and overwrites title, url, and upload time.
    fn upsert(&self, record: VideoRecord) -> Result<VideoUpsert, RepositoryError>;
    fn for_teacher(&self, teacher: &TeacherId) -> Result<Vec<VideoRecord>, RepositoryError>;
}
