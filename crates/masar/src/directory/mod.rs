//! Identity directory: teacher, school, admin, and specialty records.

pub mod discovery;
pub mod domain;
pub mod repository;
pub mod router;
pub mod seed;

pub use discovery::{DirectoryError, TeacherDirectory, TeacherPage, TeacherQuery};
pub use domain::{
    AdminAccount, AdminId, FlightTicket, Gender, PartyRef, School, SchoolId, SchoolSummary,
    Specialty, SpecialtyId, Teacher, TeacherId, TeacherSummary, VideoId,
};
pub use repository::{DirectoryRepository, TeacherFilter};
pub use router::teacher_router;
pub use seed::{ensure_admin, DirectorySeed, SeedError, SeedSummary};
