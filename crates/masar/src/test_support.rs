use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::SecretString;
use serde_json::Value;

use crate::auth::{Claims, Role, TokenVerifier};
use crate::catalog::{VideoCatalog, VideoRecord, VideoUpsert};
use crate::config::AdminConfig;
use crate::directory::{
    AdminAccount, DirectoryRepository, DirectorySeed, FlightTicket, School, SchoolId, Specialty,
    SpecialtyId, Teacher, TeacherFilter, TeacherId, VideoId,
};
use crate::notifications::{NotificationError, NotificationSink, OutboundMessage};
use crate::selection::{
    AcceptanceFilter, AcceptanceId, AcceptanceInsert, AcceptanceRecord, AcceptanceRepository,
    AcceptanceReview,
};
use crate::storage::{MembershipChange, RepositoryError};

pub(crate) const SECRET: &str = "test-secret";

pub(crate) fn admin_config() -> AdminConfig {
    AdminConfig::default()
}

pub(crate) fn verifier() -> Arc<TokenVerifier> {
    Arc::new(TokenVerifier::new(&SecretString::from(SECRET.to_string())))
}

pub(crate) fn token(user_id: &str, role: Role) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        user_id: user_id.to_string(),
        role,
        iat: Some(now),
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token encodes")
}

pub(crate) fn school(id: &str, name: &str) -> School {
    School {
        id: SchoolId(id.to_string()),
        manager_name: "Principal".to_string(),
        whatsapp_phone: format!("+968{id}"),
        school_name: name.to_string(),
        school_location: "Muscat".to_string(),
        stages_needed: Vec::new(),
        specialties_needed: Vec::new(),
        expected_salary_range: "600-800 OMR".to_string(),
        flight_ticket_provided: FlightTicket::None,
        housing_provided: false,
        housing_allowance: None,
        selected_teachers: Vec::new(),
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
struct DirectoryState {
    teachers: HashMap<TeacherId, Teacher>,
    schools: HashMap<SchoolId, School>,
    specialties: HashMap<SpecialtyId, Specialty>,
    admins: Vec<AdminAccount>,
}

/// Directory backed by a single mutex, seeded with the demo fixture.
#[derive(Default, Clone)]
pub(crate) struct MemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl MemoryDirectory {
    pub(crate) fn seeded() -> Self {
        let directory = Self::default();
        DirectorySeed::demo()
            .apply(&directory)
            .expect("demo seed applies");
        directory
    }

    pub(crate) fn remove_teacher(&self, id: &TeacherId) {
        self.lock().teachers.remove(id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DirectoryState> {
        self.state.lock().expect("directory mutex poisoned")
    }
}

impl DirectoryRepository for MemoryDirectory {
    fn teacher(&self, id: &TeacherId) -> Result<Option<Teacher>, RepositoryError> {
        Ok(self.lock().teachers.get(id).cloned())
    }

    fn school(&self, id: &SchoolId) -> Result<Option<School>, RepositoryError> {
        Ok(self.lock().schools.get(id).cloned())
    }

    fn specialty(&self, id: &SpecialtyId) -> Result<Option<Specialty>, RepositoryError> {
        Ok(self.lock().specialties.get(id).cloned())
    }

    fn teacher_by_phone(&self, phone: &str) -> Result<Option<Teacher>, RepositoryError> {
        Ok(self
            .lock()
            .teachers
            .values()
            .find(|teacher| teacher.phone_number == phone)
            .cloned())
    }

    fn teacher_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<Teacher>, RepositoryError> {
        Ok(self
            .lock()
            .teachers
            .values()
            .find(|teacher| teacher.national_id == national_id)
            .cloned())
    }

    fn school_by_whatsapp(&self, phone: &str) -> Result<Option<School>, RepositoryError> {
        Ok(self
            .lock()
            .schools
            .values()
            .find(|school| school.whatsapp_phone == phone)
            .cloned())
    }

    fn admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, RepositoryError> {
        Ok(self
            .lock()
            .admins
            .iter()
            .find(|admin| admin.email == email)
            .cloned())
    }

    fn schools(&self) -> Result<Vec<School>, RepositoryError> {
        let mut schools: Vec<School> = self.lock().schools.values().cloned().collect();
        schools.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(schools)
    }

    fn teachers(&self, filter: &TeacherFilter) -> Result<Vec<Teacher>, RepositoryError> {
        let mut teachers: Vec<Teacher> = self.lock()
            .teachers
            .values()
            .filter(|teacher| filter.matches(teacher))
            .cloned()
            .collect();
        teachers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(teachers)
    }

    fn register_teacher(&self, teacher: Teacher) -> Result<Teacher, RepositoryError> {
        let mut state = self.lock();
        if state.teachers.contains_key(&teacher.id) {
            return Err(RepositoryError::Conflict(teacher.id.to_string()));
        }
        state.teachers.insert(teacher.id.clone(), teacher.clone());
        Ok(teacher)
    }

    fn register_school(&self, school: School) -> Result<School, RepositoryError> {
        let mut state = self.lock();
        if state.schools.contains_key(&school.id) {
            return Err(RepositoryError::Conflict(school.id.to_string()));
        }
        state.schools.insert(school.id.clone(), school.clone());
        Ok(school)
    }

    fn register_admin(&self, admin: AdminAccount) -> Result<AdminAccount, RepositoryError> {
        let mut state = self.lock();
        if state.admins.iter().any(|existing| existing.email == admin.email) {
            return Err(RepositoryError::Conflict(admin.email));
        }
        state.admins.push(admin.clone());
        Ok(admin)
    }

    fn register_specialty(&self, specialty: Specialty) -> Result<Specialty, RepositoryError> {
        let mut state = self.lock();
        if state.specialties.contains_key(&specialty.id) {
            return Err(RepositoryError::Conflict(specialty.id.to_string()));
        }
        state.specialties.insert(specialty.id.clone(), specialty.clone());
        Ok(specialty)
    }

    fn add_selected_teacher(
        &self,
        school: &SchoolId,
        teacher: &TeacherId,
    ) -> Result<MembershipChange, RepositoryError> {
        let mut state = self.lock();
        let school = state.schools.get_mut(school).ok_or(RepositoryError::NotFound)?;
        if school.has_selected(teacher) {
            return Ok(MembershipChange::Unchanged);
        }
        school.selected_teachers.push(teacher.clone());
        Ok(MembershipChange::Added)
    }

    fn remove_selected_teacher(
        &self,
        school: &SchoolId,
        teacher: &TeacherId,
    ) -> Result<MembershipChange, RepositoryError> {
        let mut state = self.lock();
        let school = state.schools.get_mut(school).ok_or(RepositoryError::NotFound)?;
        let before = school.selected_teachers.len();
        school.selected_teachers.retain(|id| id != teacher);
        if school.selected_teachers.len() == before {
            Ok(MembershipChange::Unchanged)
        } else {
            Ok(MembershipChange::Removed)
        }
    }

    fn attach_video(&self, teacher: &TeacherId, video: &VideoId) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let teacher = state.teachers.get_mut(teacher).ok_or(RepositoryError::NotFound)?;
        if !teacher.videos.contains(video) {
            teacher.videos.push(video.clone());
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryAcceptances {
    records: Arc<Mutex<Vec<AcceptanceRecord>>>,
}

impl MemoryAcceptances {
    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("acceptance mutex poisoned").len()
    }

    pub(crate) fn put(&self, record: AcceptanceRecord) {
        self.records
            .lock()
            .expect("acceptance mutex poisoned")
            .push(record);
    }
}

impl AcceptanceRepository for MemoryAcceptances {
    fn insert_if_absent(
        &self,
        record: AcceptanceRecord,
    ) -> Result<AcceptanceInsert, RepositoryError> {
        let mut records = self.records.lock().expect("acceptance mutex poisoned");
        if let Some(existing) = records
            .iter()
            .find(|existing| existing.is_pair(&record.school, &record.teacher))
        {
            return Ok(AcceptanceInsert::Existing(existing.clone()));
        }
        records.push(record.clone());
        Ok(AcceptanceInsert::Inserted(record))
    }

    fn review(
        &self,
        id: &AcceptanceId,
        review: AcceptanceReview,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<AcceptanceRecord>, RepositoryError> {
        let mut records = self.records.lock().expect("acceptance mutex poisoned");
        Ok(records.iter_mut().find(|record| &record.id == id).map(|record| {
            record.status = review.status;
            record.notes = review.notes;
            record.updated_at = at;
            record.clone()
        }))
    }

    fn delete(&self, id: &AcceptanceId) -> Result<Option<AcceptanceRecord>, RepositoryError> {
        let mut records = self.records.lock().expect("acceptance mutex poisoned");
        Ok(records
            .iter()
            .position(|record| &record.id == id)
            .map(|index| records.remove(index)))
    }

    fn find(&self, filter: &AcceptanceFilter) -> Result<Vec<AcceptanceRecord>, RepositoryError> {
        let records = self.records.lock().expect("acceptance mutex poisoned");
        let mut matching: Vec<AcceptanceRecord> = records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.accepted_at.cmp(&a.accepted_at));
        Ok(matching)
    }
}

pub(crate) struct UnavailableAcceptances;

impl AcceptanceRepository for UnavailableAcceptances {
    fn insert_if_absent(
        &self,
        _record: AcceptanceRecord,
    ) -> Result<AcceptanceInsert, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn review(
        &self,
        _id: &AcceptanceId,
        _review: AcceptanceReview,
        _at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<AcceptanceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &AcceptanceId) -> Result<Option<AcceptanceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find(&self, _filter: &AcceptanceFilter) -> Result<Vec<AcceptanceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryCatalog {
    videos: Arc<Mutex<Vec<VideoRecord>>>,
}

impl VideoCatalog for MemoryCatalog {
    fn upsert(&self, record: VideoRecord) -> Result<VideoUpsert, RepositoryError> {
        let mut videos = self.videos.lock().expect("catalog mutex poisoned");
        if let Some(existing) = videos
            .iter_mut()
            .find(|video| video.teacher == record.teacher && video.specialty == record.specialty)
        {
            existing.title = record.title;
            existing.video_url = record.video_url;
            existing.uploaded_at = record.uploaded_at;
            return Ok(VideoUpsert::Replaced(existing.clone()));
        }
        videos.push(record.clone());
        Ok(VideoUpsert::Created(record))
    }

    fn for_teacher(&self, teacher: &TeacherId) -> Result<Vec<VideoRecord>, RepositoryError> {
        let videos = self.videos.lock().expect("catalog mutex poisoned");
        Ok(videos
            .iter()
            .filter(|video| &video.teacher == teacher)
            .cloned()
            .collect())
    }
}

/// Sink that keeps every delivered message.
#[derive(Default)]
pub(crate) struct RecordingSink {
    delivered: Mutex<Vec<OutboundMessage>>,
}

impl RecordingSink {
    pub(crate) fn delivered(&self) -> Vec<OutboundMessage> {
        self.delivered.lock().expect("sink mutex poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), NotificationError> {
        self.delivered
            .lock()
            .expect("sink mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

pub(crate) struct FailingSink;

impl NotificationSink for FailingSink {
    fn deliver(&self, _message: &OutboundMessage) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("gateway offline".to_string()))
    }
}
