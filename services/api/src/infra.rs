use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use masar::catalog::{VideoCatalog, VideoRecord, VideoUpsert};
use masar::directory::{
    AdminAccount, DirectoryRepository, School, SchoolId, Specialty, SpecialtyId, Teacher,
    TeacherFilter, TeacherId, VideoId,
};
use masar::selection::{
    AcceptanceFilter, AcceptanceId, AcceptanceInsert, AcceptanceRecord, AcceptanceRepository,
    AcceptanceReview,
};
use masar::storage::{MembershipChange, RepositoryError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn guard<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} lock poisoned")))
}

#[derive(Default)]
struct DirectoryState {
    teachers: HashMap<TeacherId, Teacher>,
    schools: HashMap<SchoolId, School>,
    specialties: HashMap<SpecialtyId, Specialty>,
    admins: Vec<AdminAccount>,
}

/// Process-local directory. Every operation runs under one lock, so shortlist
/// updates are atomic set operations.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl InMemoryDirectory {
    fn state(&self) -> Result<MutexGuard<'_, DirectoryState>, RepositoryError> {
        guard(&self.state, "directory")
    }
}

impl DirectoryRepository for InMemoryDirectory {
    fn teacher(&self, id: &TeacherId) -> Result<Option<Teacher>, RepositoryError> {
        Ok(self.state()?.teachers.get(id).cloned())
    }

    fn school(&self, id: &SchoolId) -> Result<Option<School>, RepositoryError> {
        Ok(self.state()?.schools.get(id).cloned())
    }

    fn specialty(&self, id: &SpecialtyId) -> Result<Option<Specialty>, RepositoryError> {
        Ok(self.state()?.specialties.get(id).cloned())
    }

    fn teacher_by_phone(&self, phone: &str) -> Result<Option<Teacher>, RepositoryError> {
        Ok(self
            .state()?
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
            .state()?
            .teachers
            .values()
            .find(|teacher| teacher.national_id == national_id)
            .cloned())
    }

    fn school_by_whatsapp(&self, phone: &str) -> Result<Option<School>, RepositoryError> {
        Ok(self
            .state()?
            .schools
            .values()
            .find(|school| school.whatsapp_phone == phone)
            .cloned())
    }

    fn admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>, RepositoryError> {
        Ok(self
            .state()?
            .admins
            .iter()
            .find(|admin| admin.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn schools(&self) -> Result<Vec<School>, RepositoryError> {
        let mut schools: Vec<School> = self.state()?.schools.values().cloned().collect();
        schools.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(schools)
    }

    fn teachers(&self, filter: &TeacherFilter) -> Result<Vec<Teacher>, RepositoryError> {
        let mut teachers: Vec<Teacher> = self.state()?
            .teachers
            .values()
            .filter(|teacher| filter.matches(teacher))
            .cloned()
            .collect();
        teachers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(teachers)
    }

    fn register_teacher(&self, teacher: Teacher) -> Result<Teacher, RepositoryError> {
        let mut state = self.state()?;
        if state.teachers.contains_key(&teacher.id) {
            return Err(RepositoryError::Conflict(format!("teacher {}", teacher.id)));
        }
        if state.teachers.values().any(|existing| {
            existing.phone_number == teacher.phone_number
                || existing.national_id == teacher.national_id
        }) {
            return Err(RepositoryError::Conflict(format!(
                "teacher phone {} or national id",
                teacher.phone_number
            )));
        }
        state.teachers.insert(teacher.id.clone(), teacher.clone());
        Ok(teacher)
    }

    fn register_school(&self, school: School) -> Result<School, RepositoryError> {
        let mut state = self.state()?;
        if state.schools.contains_key(&school.id) {
            return Err(RepositoryError::Conflict(format!("school {}", school.id)));
        }
        if state
            .schools
            .values()
            .any(|existing| existing.whatsapp_phone == school.whatsapp_phone)
        {
            return Err(RepositoryError::Conflict(format!(
                "school whatsapp {}",
                school.whatsapp_phone
            )));
        }
        state.schools.insert(school.id.clone(), school.clone());
        Ok(school)
    }

    fn register_admin(&self, admin: AdminAccount) -> Result<AdminAccount, RepositoryError> {
        let mut state = self.state()?;
        if state
            .admins
            .iter()
            .any(|existing| existing.id == admin.id || existing.email.eq_ignore_ascii_case(&admin.email))
        {
            return Err(RepositoryError::Conflict(format!("admin {}", admin.email)));
        }
        state.admins.push(admin.clone());
        Ok(admin)
    }

    fn register_specialty(&self, specialty: Specialty) -> Result<Specialty, RepositoryError> {
        let mut state = self.state()?;
        if state.specialties.contains_key(&specialty.id) {
            return Err(RepositoryError::Conflict(format!("specialty {}", specialty.id)));
        }
        state.specialties.insert(specialty.id.clone(), specialty.clone());
        Ok(specialty)
    }

    fn add_selected_teacher(
        &self,
        school: &SchoolId,
        teacher: &TeacherId,
    ) -> Result<MembershipChange, RepositoryError> {
        let mut state = self.state()?;
        let school = state
            .schools
            .get_mut(school)
            .ok_or(RepositoryError::NotFound)?;
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
        let mut state = self.state()?;
        let school = state
            .schools
            .get_mut(school)
            .ok_or(RepositoryError::NotFound)?;
        let before = school.selected_teachers.len();
        school.selected_teachers.retain(|id| id != teacher);
        Ok(if school.selected_teachers.len() < before {
            MembershipChange::Removed
        } else {
            MembershipChange::Unchanged
        })
    }

    fn attach_video(&self, teacher: &TeacherId, video: &VideoId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let teacher = state
            .teachers
            .get_mut(teacher)
            .ok_or(RepositoryError::NotFound)?;
        if !teacher.videos.contains(video) {
            teacher.videos.push(video.clone());
        }
        Ok(())
    }
}

#[derive(Default)]
struct AcceptanceState {
    records: HashMap<AcceptanceId, AcceptanceRecord>,
    pairs: HashMap<(SchoolId, TeacherId), AcceptanceId>,
}

/// Acceptance store with a unique (school, teacher) index.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAcceptanceRepository {
    state: Arc<Mutex<AcceptanceState>>,
}

impl AcceptanceRepository for InMemoryAcceptanceRepository {
    fn insert_if_absent(
        &self,
        record: AcceptanceRecord,
    ) -> Result<AcceptanceInsert, RepositoryError> {
        let mut state = guard(&self.state, "acceptance")?;
        let key = (record.school.clone(), record.teacher.clone());
        if let Some(existing) = state
            .pairs
            .get(&key)
            .and_then(|id| state.records.get(id))
        {
            return Ok(AcceptanceInsert::Existing(existing.clone()));
        }
        state.pairs.insert(key, record.id.clone());
        state.records.insert(record.id.clone(), record.clone());
        Ok(AcceptanceInsert::Inserted(record))
    }

    fn review(
        &self,
        id: &AcceptanceId,
        review: AcceptanceReview,
        at: DateTime<Utc>,
    ) -> Result<Option<AcceptanceRecord>, RepositoryError> {
        let mut state = guard(&self.state, "acceptance")?;
        Ok(state.records.get_mut(id).map(|record| {
            record.status = review.status;
            record.notes = review.notes;
            record.updated_at = at;
            record.clone()
        }))
    }

    fn delete(&self, id: &AcceptanceId) -> Result<Option<AcceptanceRecord>, RepositoryError> {
        let mut state = guard(&self.state, "acceptance")?;
        let removed = state.records.remove(id);
        if let Some(record) = &removed {
            state
                .pairs
                .remove(&(record.school.clone(), record.teacher.clone()));
        }
        Ok(removed)
    }

    fn find(&self, filter: &AcceptanceFilter) -> Result<Vec<AcceptanceRecord>, RepositoryError> {
        let state = guard(&self.state, "acceptance")?;
        let mut matching: Vec<AcceptanceRecord> = state
            .records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.accepted_at
                .cmp(&a.accepted_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(matching)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryVideoCatalog {
    videos: Arc<Mutex<HashMap<(TeacherId, SpecialtyId), VideoRecord>>>,
}

impl VideoCatalog for InMemoryVideoCatalog {
    fn upsert(&self, record: VideoRecord) -> Result<VideoUpsert, RepositoryError> {
        let mut videos = guard(&self.videos, "video catalog")?;
        let key = (record.teacher.clone(), record.specialty.clone());
        match videos.get_mut(&key) {
            Some(existing) => {
                existing.title = record.title;
                existing.video_url = record.video_url;
                existing.uploaded_at = record.uploaded_at;
                Ok(VideoUpsert::Replaced(existing.clone()))
            }
            None => {
                videos.insert(key, record.clone());
                Ok(VideoUpsert::Created(record))
            }
        }
    }

    fn for_teacher(&self, teacher: &TeacherId) -> Result<Vec<VideoRecord>, RepositoryError> {
        let videos = guard(&self.videos, "video catalog")?;
        let mut records: Vec<VideoRecord> = videos
            .values()
            .filter(|video| &video.teacher == teacher)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masar::directory::DirectorySeed;
    use std::thread;

    fn seeded_directory() -> InMemoryDirectory {
        let directory = InMemoryDirectory::default();
        DirectorySeed::demo()
            .apply(&directory)
            .expect("demo seed applies");
        directory
    }

    #[test]
    fn concurrent_selections_add_teacher_exactly_once() {
        let directory = seeded_directory();
        let school = SchoolId("s1".to_string());
        let teacher = TeacherId("t1".to_string());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let directory = directory.clone();
                let school = school.clone();
                let teacher = teacher.clone();
                thread::spawn(move || {
                    directory
                        .add_selected_teacher(&school, &teacher)
                        .expect("add succeeds")
                })
            })
            .collect();

        let added = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .filter(|change| *change == MembershipChange::Added)
            .count();

        assert_eq!(added, 1);
        let stored = directory.school(&school).expect("lookup").expect("school");
        assert_eq!(stored.selected_teachers, vec![teacher]);
    }

    #[test]
    fn concurrent_acceptances_for_one_pair_yield_one_record() {
        let repository = InMemoryAcceptanceRepository::default();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repository = repository.clone();
                thread::spawn(move || {
                    let record = AcceptanceRecord::pending(
                        SchoolId("s1".to_string()),
                        TeacherId("t1".to_string()),
                        None,
                        Utc::now(),
                    );
                    repository.insert_if_absent(record).expect("insert runs")
                })
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .filter(|outcome| matches!(outcome, AcceptanceInsert::Inserted(_)))
            .count();

        assert_eq!(inserted, 1);
        let all = repository
            .find(&AcceptanceFilter::default())
            .expect("find succeeds");
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn deleting_an_acceptance_frees_the_pair() {
        let repository = InMemoryAcceptanceRepository::default();
        let record = AcceptanceRecord::pending(
            SchoolId("s1".to_string()),
            TeacherId("t1".to_string()),
            None,
            Utc::now(),
        );
        let id = record.id.clone();
        repository.insert_if_absent(record).expect("insert");

        assert!(repository.delete(&id).expect("delete").is_some());
        let again = AcceptanceRecord::pending(
            SchoolId("s1".to_string()),
            TeacherId("t1".to_string()),
            None,
            Utc::now(),
        );
        assert!(matches!(
            repository.insert_if_absent(again).expect("insert"),
            AcceptanceInsert::Inserted(_)
        ));
    }

    #[test]
    fn duplicate_unique_keys_are_conflicts() {
        let directory = seeded_directory();
        let mut clone = directory
            .teacher(&TeacherId("t1".to_string()))
            .expect("lookup")
            .expect("teacher");
        clone.id = TeacherId("t3".to_string());

        assert!(matches!(
            directory.register_teacher(clone),
            Err(RepositoryError::Conflict(_))
        ));
        assert!(directory
            .school_by_whatsapp("+96891000002")
            .expect("lookup")
            .is_some());
    }
}
