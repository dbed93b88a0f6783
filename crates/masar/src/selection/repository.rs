use chrono::{DateTime, Utc};

use super::domain::{AcceptanceId, AcceptanceRecord, AcceptanceReview, AcceptanceStatus};
use crate::directory::{SchoolId, TeacherId};
use crate::storage::RepositoryError;

/// Filter applied by [`AcceptanceRepository::find`]. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptanceFilter {
    pub status: Option<AcceptanceStatus>,
    pub school: Option<SchoolId>,
    pub teacher: Option<TeacherId>,
}

impl AcceptanceFilter {
    pub fn matches(&self, record: &AcceptanceRecord) -> bool {
        self.status.map_or(true, |status| record.status == status)
            && self.school.as_ref().map_or(true, |school| &record.school == school)
            && self
                .teacher
                .as_ref()
                .map_or(true, |teacher| &record.teacher == teacher)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptanceInsert {
    Inserted(AcceptanceRecord),
    /// The pair already had a record; it is returned unchanged.
    Existing(AcceptanceRecord),
}

/// Storage for acceptance records.
///
/// `insert_if_absent` must check and insert under one critical section (or a
/// unique index on school + teacher) so concurrent creates for the same pair
/// yield exactly one record.
pub trait AcceptanceRepository: Send + Sync {
    fn insert_if_absent(
        &self,
        record: AcceptanceRecord,
    ) -> Result<AcceptanceInsert, RepositoryError>;

    /// Applies the review in place. `None` when the id does not exist.
    fn review(
        &self,
        id: &AcceptanceId,
        review: AcceptanceReview,
        at: DateTime<Utc>,
    ) -> Result<Option<AcceptanceRecord>, RepositoryError>;

    fn delete(&self, id: &AcceptanceId) -> Result<Option<AcceptanceRecord>, RepositoryError>;

    /// Matching records, newest `accepted_at` first.
    fn find(&self, filter: &AcceptanceFilter) -> Result<Vec<AcceptanceRecord>, RepositoryError>;
}
