use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::repository::{VideoCatalog, VideoRecord, VideoUpsert};
use crate::auth::{Requester, Role};
use crate::directory::{DirectoryRepository, SpecialtyId, TeacherId, VideoId};
use crate::storage::RepositoryError;

/// Metadata for an already-hosted video.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRegistration {
    pub specialty_id: Option<String>,
    pub title: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct VideoCatalogService<D, V> {
    directory: Arc<D>,
    catalog: Arc<V>,
}

impl<D, V> VideoCatalogService<D, V>
where
    D: DirectoryRepository + 'static,
    V: VideoCatalog + 'static,
{
    pub fn new(directory: Arc<D>, catalog: Arc<V>) -> Self {
        Self { directory, catalog }
    }

    /// Register or replace the requesting teacher's video for one of their specialties.
    pub fn register(
        &self,
        requester: &Requester,
        registration: VideoRegistration,
    ) -> Result<VideoUpsert, CatalogError> {
        if requester.role != Role::Teacher {
            return Err(CatalogError::Forbidden("Only teachers can upload videos"));
        }

        let teacher_id = TeacherId(requester.user_id.clone());
        let teacher = self
            .directory
            .teacher(&teacher_id)?
            .ok_or(CatalogError::NotFound("Teacher not found"))?;

        let specialty_id = required("Specialty", registration.specialty_id)?;
        let video_url = required("Video URL", registration.video_url)?;

        let specialty_id = SpecialtyId(specialty_id);
        let specialty = self
            .directory
            .specialty(&specialty_id)?
            .ok_or(CatalogError::NotFound("Specialty not found"))?;

        if !teacher.has_specialty(&specialty.id) {
            return Err(CatalogError::Forbidden(
                "You can only upload videos for your registered specialties",
            ));
        }

        let title = registration
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| format!("{} - {}", specialty.display_name(), teacher.full_name));

        let outcome = self.catalog.upsert(VideoRecord {
            id: VideoId(uuid::Uuid::new_v4().to_string()),
            teacher: teacher.id.clone(),
            specialty: specialty.id,
            title,
            video_url,
            uploaded_at: Utc::now(),
        })?;

        if let VideoUpsert::Created(record) = &outcome {
            self.directory.attach_video(&teacher.id, &record.id)?;
        }

        info!(
            teacher = %teacher.id,
            video = %outcome.record().id,
            replaced = matches!(outcome, VideoUpsert::Replaced(_)),
            "teacher video registered"
        );
        Ok(outcome)
    }

    pub fn teacher_videos(&self, teacher: &TeacherId) -> Result<Vec<VideoRecord>, CatalogError> {
        if self.directory.teacher(teacher)?.is_none() {
            return Err(CatalogError::NotFound("Teacher not found"));
        }
        Ok(self.catalog.for_teacher(teacher)?)
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, CatalogError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(CatalogError::MissingField(field))
}
