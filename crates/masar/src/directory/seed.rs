use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{
    AdminAccount, AdminId, FlightTicket, Gender, School, SchoolId, Specialty, SpecialtyId,
    Teacher, TeacherId,
};
use super::repository::DirectoryRepository;
use crate::config::AdminConfig;
use crate::storage::RepositoryError;

/// Directory fixture loaded at startup or used by the CLI demo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub specialties: Vec<Specialty>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub schools: Vec<School>,
    #[serde(default)]
    pub admins: Vec<AdminAccount>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub registered: usize,
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("unable to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("seed file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DirectorySeed {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SeedError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Registers every record, skipping those whose id or unique key already exists.
    pub fn apply<D>(&self, directory: &D) -> Result<SeedSummary, SeedError>
    where
        D: DirectoryRepository + ?Sized,
    {
        let mut summary = SeedSummary::default();

        for specialty in &self.specialties {
            tally(&mut summary, directory.register_specialty(specialty.clone()))?;
        }
        for teacher in &self.teachers {
            tally(&mut summary, directory.register_teacher(teacher.clone()))?;
        }
        for school in &self.schools {
            tally(&mut summary, directory.register_school(school.clone()))?;
        }
        for admin in &self.admins {
            tally(&mut summary, directory.register_admin(admin.clone()))?;
        }

        info!(
            registered = summary.registered,
            skipped = summary.skipped,
            "directory seed applied"
        );
        Ok(summary)
    }

    /// Small fixture used by the CLI demo.
    pub fn demo() -> Self {
        let math = Specialty {
            id: SpecialtyId("math".to_string()),
            name: "Mathematics".to_string(),
            name_ar: Some("الرياضيات".to_string()),
        };
        let physics = Specialty {
            id: SpecialtyId("physics".to_string()),
            name: "Physics".to_string(),
            name_ar: Some("الفيزياء".to_string()),
        };

        let teacher = |id: &str, name: &str, phone: &str, national_id: &str, specialty: &Specialty| {
            Teacher {
                id: TeacherId(id.to_string()),
                full_name: name.to_string(),
                phone_number: phone.to_string(),
                national_id: national_id.to_string(),
                gender: Gender::Female,
                age: 31,
                address: "Muscat".to_string(),
                academic_qualification: "Bachelor of Education".to_string(),
                diploma: None,
                courses: Vec::new(),
                specialties: vec![specialty.id.clone()],
                taught_stages: vec!["secondary".to_string()],
                worked_in_oman_before: true,
                videos: Vec::new(),
            }
        };

        let school = |id: &str, name: &str, phone: &str, location: &str| School {
            id: SchoolId(id.to_string()),
            manager_name: "Principal".to_string(),
            whatsapp_phone: phone.to_string(),
            school_name: name.to_string(),
            school_location: location.to_string(),
            stages_needed: vec!["stageTwo".to_string()],
            specialties_needed: vec![math.id.clone(), physics.id.clone()],
            expected_salary_range: "600-800 OMR".to_string(),
            flight_ticket_provided: FlightTicket::Full,
            housing_provided: true,
            housing_allowance: None,
            selected_teachers: Vec::new(),
        };

        Self {
            teachers: vec![
                teacher("t1", "Aisha Al-Balushi", "+96890000001", "OM-1001", &math),
                teacher("t2", "Salim Al-Harthy", "+96890000002", "OM-1002", &physics),
            ],
            schools: vec![
                school("s1", "Muscat International School", "+96891000001", "Muscat"),
                school("s2", "Sohar Academy", "+96891000002", "Sohar"),
            ],
            specialties: vec![math, physics],
            admins: Vec::new(),
        }
    }
}

fn tally<T>(
    summary: &mut SeedSummary,
    result: Result<T, RepositoryError>,
) -> Result<(), SeedError> {
    match result {
        Ok(_) => summary.registered += 1,
        Err(RepositoryError::Conflict(key)) => {
            debug!(%key, "seed record already present");
            summary.skipped += 1;
        }
        Err(other) => return Err(other.into()),
    }
    Ok(())
}

/// Registers the configured admin account unless one with that email exists.
pub fn ensure_admin<D>(directory: &D, config: &AdminConfig) -> Result<AdminAccount, RepositoryError>
where
    D: DirectoryRepository + ?Sized,
{
    if let Some(existing) = directory.admin_by_email(&config.email)? {
        debug!(email = %existing.email, "admin account already exists");
        return Ok(existing);
    }

    let admin = directory.register_admin(AdminAccount {
        id: AdminId(format!("admin-{}", uuid::Uuid::new_v4())),
        email: config.email.clone(),
    })?;
    info!(email = %admin.email, "admin account created");
    Ok(admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_config, MemoryDirectory};

    #[test]
    fn reapplying_a_seed_skips_existing_records() {
        let directory = MemoryDirectory::default();
        let seed = DirectorySeed::demo();

        let first = seed.apply(&directory).expect("first apply");
        assert_eq!(first, SeedSummary { registered: 6, skipped: 0 });

        let second = seed.apply(&directory).expect("second apply");
        assert_eq!(second, SeedSummary { registered: 0, skipped: 6 });
    }

    #[test]
    fn seed_parses_camel_case_fixture() {
        let raw = r#"{
            "specialties": [{"id": "chem", "name": "Chemistry"}],
            "teachers": [{
                "id": "t7", "fullName": "Maryam Al-Rawahi", "phoneNumber": "+96890000007",
                "nationalID": "OM-7", "gender": "female", "age": 29, "address": "Nizwa",
                "academicQualification": "MSc", "specialties": ["chem"]
            }]
        }"#;

        let seed = DirectorySeed::from_reader(raw.as_bytes()).expect("fixture parses");
        assert_eq!(seed.teachers[0].national_id, "OM-7");
        assert!(seed.teachers[0].videos.is_empty());
        assert!(seed.schools.is_empty());
    }

    #[test]
    fn ensure_admin_is_idempotent() {
        let directory = MemoryDirectory::default();
        let config = admin_config();

        let created = ensure_admin(&directory, &config).expect("admin created");
        let again = ensure_admin(&directory, &config).expect("admin found");

        assert_eq!(created, again);
        assert!(created.id.0.starts_with("admin-"));
    }
}
