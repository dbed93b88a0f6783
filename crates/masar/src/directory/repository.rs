use super::domain::{
    AdminAccount, Gender, School, SchoolId, Specialty, SpecialtyId, Teacher, TeacherId, VideoId,
};
use crate::storage::{MembershipChange, RepositoryError};

/// Filter applied by [`DirectoryRepository::teachers`]. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherFilter {
    /// Matches teachers whose taught stages include this one.
    pub stage: Option<String>,
    pub gender: Option<Gender>,
    pub worked_in_oman_before: Option<bool>,
}

impl TeacherFilter {
    pub fn matches(&self, teacher: &Teacher) -> bool {
        self.stage
            .as_ref()
            .map_or(true, |stage| teacher.taught_stages.contains(stage))
            && self.gender.map_or(true, |gender| teacher.gender == gender)
            && self
                .worked_in_oman_before
                .map_or(true, |worked| teacher.worked_in_oman_before == worked)
    }
}

/// Storage abstraction over teacher, school, admin, and specialty records.
///
/// Implementations must apply `add_selected_teacher` and
/// `remove_selected_teacher` as single atomic set operations so concurrent
/// selections of the same pair cannot both observe the teacher as absent.
pub trait DirectoryRepository: Send + Sync {
    fn teacher(&self, id: &TeacherId) -> Result<Option<Teacher>, RepositoryError>;
    fn school(&self, id: &SchoolId) -> Result<Option<School>, RepositoryError>;
    fn specialty(&self, id: &SpecialtyId) -> Result<Option<Specialty>, RepositoryError>;

    fn teacher_by_phone(&self, phone: &str) -> Result<Option<Teacher>, RepositoryError>;
    fn teacher_by_national_id(&self, national_id: &str)
        -> Result<Option<Teacher>, RepositoryError>;
    fn school_by_whatsapp(&self, phone: &str) -> Result<Option<School>, RepositoryError>;
    fn admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, RepositoryError>;

    fn schools(&self) -> Result<Vec<School>, RepositoryError>;

    /// Matching teachers ordered by id.
    fn teachers(&self, filter: &TeacherFilter) -> Result<Vec<Teacher>, RepositoryError>;

    /// Registration fails with `Conflict` on a duplicate id or unique key.
    fn register_teacher(&self, teacher: Teacher) -> Result<Teacher, RepositoryError>;
    fn register_school(&self, school: School) -> Result<School, RepositoryError>;
    fn register_admin(&self, admin: AdminAccount) -> Result<AdminAccount, RepositoryError>;
    fn register_specialty(&self, specialty: Specialty) -> Result<Specialty, RepositoryError>;

    /// Add-to-set on the school's shortlist. `NotFound` when the school is unknown.
    fn add_selected_teacher(
        &self,
        school: &SchoolId,
        teacher: &TeacherId,
    ) -> Result<MembershipChange, RepositoryError>;

    fn remove_selected_teacher(
        &self,
        school: &SchoolId,
        teacher: &TeacherId,
    ) -> Result<MembershipChange, RepositoryError>;

    /// Records a video reference on the teacher once.
    fn attach_video(&self, teacher: &TeacherId, video: &VideoId) -> Result<(), RepositoryError>;
}
