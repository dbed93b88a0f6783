use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{Gender, Teacher, TeacherId, TeacherSummary};
use super::repository::{DirectoryRepository, TeacherFilter};
use crate::storage::{PageRequest, Pagination, RepositoryError};

pub const TEACHER_PAGE_LIMIT: usize = 10;

/// Query string of `GET /api/teachers`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub stage: Option<String>,
    pub gender: Option<String>,
    pub worked_in_oman_before: Option<String>,
}

impl TeacherQuery {
    /// `None` when the query can match no teacher, e.g. an unknown gender.
    fn filter(&self) -> Option<TeacherFilter> {
        let gender = match non_empty(self.gender.as_deref()) {
            Some(raw) => Some(Gender::parse(raw)?),
            None => None,
        };

        Some(TeacherFilter {
            stage: non_empty(self.stage.as_deref()).map(str::to_string),
            gender,
            worked_in_oman_before: self.worked_in_oman_before.as_deref().map(|raw| raw == "true"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherPage {
    pub teachers: Vec<TeacherSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read-only teacher discovery for authenticated callers.
pub struct TeacherDirectory<D> {
    directory: Arc<D>,
}

impl<D> TeacherDirectory<D>
where
    D: DirectoryRepository + 'static,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    pub fn list(&self, query: TeacherQuery) -> Result<TeacherPage, DirectoryError> {
        let page = PageRequest::parse_with_limit(
            query.page.as_deref(),
            query.limit.as_deref(),
            TEACHER_PAGE_LIMIT,
        );
        let matching = match query.filter() {
            Some(filter) => self.directory.teachers(&filter)?,
            None => Vec::new(),
        };

        let pagination = page.pagination(matching.len());
        let teachers = page.apply(matching).iter().map(Teacher::summary).collect();
        Ok(TeacherPage {
            teachers,
            pagination,
        })
    }

    pub fn teacher(&self, id: &TeacherId) -> Result<Teacher, DirectoryError> {
        self.directory
            .teacher(id)?
            .ok_or(DirectoryError::NotFound("Teacher not found"))
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
