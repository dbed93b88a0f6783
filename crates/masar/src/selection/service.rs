use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::audit::{reconcile, ReconciliationReport};
use super::domain::{
    AcceptanceId, AcceptancePage, AcceptanceQuery, AcceptanceRecord, AcceptanceRequest,
    AcceptanceReview, AcceptanceStatus, AcceptanceView, OwnAcceptanceQuery, RemovalRequest,
    SchoolAcceptances, SchoolSelections, SelectionReceipt, SelectionRequest, StatusUpdate,
};
use super::repository::{AcceptanceFilter, AcceptanceInsert, AcceptanceRepository};
use crate::auth::{Requester, Role};
use crate::config::AdminConfig;
use crate::directory::{DirectoryRepository, School, SchoolId, Teacher, TeacherId};
use crate::notifications::{format_selection_message, NotificationDispatcher, OutboundMessage};
use crate::storage::{MembershipChange, PageRequest, RepositoryError};

const INVALID_STATUS: &str = "Valid status is required (pending, approved, rejected)";

/// Mediates the school -> teacher shortlist and the moderated acceptance workflow.
///
/// The two flows are kept independent: the shortlist lives on the school
/// record and notifies the admin channel, acceptances are separate records
/// moderated by admins. [`reconciliation_report`](Self::reconciliation_report)
/// surfaces pairs where they disagree.
pub struct SelectionEngine<D, A> {
    directory: Arc<D>,
    acceptances: Arc<A>,
    notifier: NotificationDispatcher,
    admin: AdminConfig,
}

impl<D, A> SelectionEngine<D, A>
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    pub fn new(
        directory: Arc<D>,
        acceptances: Arc<A>,
        notifier: NotificationDispatcher,
        admin: AdminConfig,
    ) -> Self {
        Self {
            directory,
            acceptances,
            notifier,
            admin,
        }
    }

    /// Add a teacher to a school's shortlist and alert the admin channel.
    pub fn select(
        &self,
        requester: &Requester,
        request: SelectionRequest,
    ) -> Result<SelectionReceipt, SelectionError> {
        const REQUIRED: &str = "School ID and Teacher ID are required";
        let school_id = SchoolId(required(request.school_id, REQUIRED)?);
        let teacher_id = TeacherId(required(request.teacher_id, REQUIRED)?);

        authorize_school_scope(
            requester,
            &school_id,
            "You can only select teachers for your own school",
        )?;

        let school = self.school(&school_id)?;
        let teacher = self.teacher(&teacher_id)?;

        match self
            .directory
            .add_selected_teacher(&school.id, &teacher.id)
        {
            Ok(MembershipChange::Added) => {}
            Ok(_) => return Err(SelectionError::AlreadySelected),
            Err(RepositoryError::NotFound) => return Err(SelectionError::NotFound("School not found")),
            Err(other) => return Err(other.into()),
        }

        info!(school = %school.id, teacher = %teacher.id, "teacher shortlisted");

        self.notifier.dispatch(OutboundMessage {
            to: self.admin.whatsapp_number.clone(),
            body: format_selection_message(&school.school_name, &teacher.full_name, &teacher.id),
        });

        Ok(SelectionReceipt {
            school: school.party(),
            teacher: teacher.party(),
            video_id: request.video_id.filter(|id| !id.trim().is_empty()),
        })
    }

    /// The school's shortlist resolved to teacher summaries, in selection order.
    pub fn list_selections(
        &self,
        requester: &Requester,
        school_id: &SchoolId,
    ) -> Result<SchoolSelections, SelectionError> {
        authorize_school_scope(requester, school_id, "You can only view your own selections")?;

        let school = self.school(school_id)?;
        let mut selected_teachers = Vec::with_capacity(school.selected_teachers.len());
        for teacher_id in &school.selected_teachers {
            match self.directory.teacher(teacher_id)? {
                Some(teacher) => selected_teachers.push(teacher.summary()),
                None => warn!(school = %school.id, teacher = %teacher_id, "shortlisted teacher no longer exists"),
            }
        }

        Ok(SchoolSelections {
            school: school.party(),
            selected_teachers,
        })
    }

    /// Remove a teacher from the shortlist. Removing an absent teacher succeeds.
    pub fn remove(
        &self,
        requester: &Requester,
        request: RemovalRequest,
    ) -> Result<(), SelectionError> {
        const REQUIRED: &str = "School ID and Teacher ID are required";
        let school_id = SchoolId(required(request.school_id, REQUIRED)?);
        let teacher_id = TeacherId(required(request.teacher_id, REQUIRED)?);

        authorize_school_scope(requester, &school_id, "You can only manage your own selections")?;

        match self
            .directory
            .remove_selected_teacher(&school_id, &teacher_id)
        {
            Ok(change) => {
                if change == MembershipChange::Removed {
                    info!(school = %school_id, teacher = %teacher_id, "teacher removed from shortlist");
                }
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(SelectionError::NotFound("School not found")),
            Err(other) => Err(other.into()),
        }
    }

    /// Create a pending acceptance for the requesting school.
    pub fn accept(
        &self,
        requester: &Requester,
        request: AcceptanceRequest,
    ) -> Result<AcceptanceView, SelectionError> {
        if requester.role != Role::School {
            return Err(SelectionError::Forbidden("Only schools can accept teachers"));
        }

        let teacher_id = TeacherId(required(request.teacher_id, "Teacher ID is required")?);
        let school = self.school(&SchoolId(requester.user_id.clone()))?;
        let teacher = self.teacher(&teacher_id)?;

        let record = AcceptanceRecord::pending(
            school.id.clone(),
            teacher.id.clone(),
            Some(request.notes.unwrap_or_default()),
            Utc::now(),
        );

        match self.acceptances.insert_if_absent(record)? {
            AcceptanceInsert::Inserted(record) => {
                info!(acceptance = %record.id, school = %school.id, teacher = %teacher.id, "acceptance created");
                Ok(self.view(record)?)
            }
            AcceptanceInsert::Existing(record) => {
                Err(SelectionError::AlreadyAccepted(Box::new(self.view(record)?)))
            }
        }
    }

    /// The requesting school's acceptances, newest first.
    pub fn school_acceptances(
        &self,
        requester: &Requester,
        query: OwnAcceptanceQuery,
    ) -> Result<SchoolAcceptances, SelectionError> {
        if requester.role != Role::School {
            return Err(SelectionError::Forbidden("Only schools can access this endpoint"));
        }

        let Some(status) = status_filter(query.status) else {
            return Ok(SchoolAcceptances {
                count: 0,
                acceptances: Vec::new(),
            });
        };
        let filter = AcceptanceFilter {
            status,
            school: Some(SchoolId(requester.user_id.clone())),
            teacher: None,
        };

        let acceptances = self.views(self.acceptances.find(&filter)?)?;
        Ok(SchoolAcceptances {
            count: acceptances.len(),
            acceptances,
        })
    }

    /// Every acceptance matching the filters, paginated, newest first.
    pub fn all_acceptances(
        &self,
        requester: &Requester,
        query: AcceptanceQuery,
    ) -> Result<AcceptancePage, SelectionError> {
        if !requester.is_admin() {
            return Err(SelectionError::Forbidden("Only admins can access this endpoint"));
        }

        let page = PageRequest::parse(query.page.as_deref(), query.limit.as_deref());
        let matching = match status_filter(query.status) {
            Some(status) => self.acceptances.find(&AcceptanceFilter {
                status,
                school: non_empty(query.school_id).map(SchoolId),
                teacher: non_empty(query.teacher_id).map(TeacherId),
            })?,
            None => Vec::new(),
        };
        let pagination = page.pagination(matching.len());
        let acceptances = self.views(page.apply(matching))?;

        Ok(AcceptancePage {
            acceptances,
            pagination,
        })
    }

    /// Admin transition to any status. Notes replace the stored notes.
    pub fn update_status(
        &self,
        requester: &Requester,
        id: &AcceptanceId,
        update: StatusUpdate,
    ) -> Result<AcceptanceView, SelectionError> {
        if !requester.is_admin() {
            return Err(SelectionError::Forbidden(
                "Only admins can update acceptance status",
            ));
        }

        let status = update
            .status
            .as_deref()
            .and_then(|raw| raw.parse::<AcceptanceStatus>().ok())
            .ok_or_else(|| SelectionError::InvalidInput(INVALID_STATUS.to_string()))?;

        let review = AcceptanceReview {
            status,
            notes: update.notes,
        };
        let record = self
            .acceptances
            .review(id, review, Utc::now())?
            .ok_or(SelectionError::NotFound("Acceptance not found"))?;

        info!(acceptance = %record.id, status = %record.status, "acceptance reviewed");
        Ok(self.view(record)?)
    }

    pub fn delete_acceptance(
        &self,
        requester: &Requester,
        id: &AcceptanceId,
    ) -> Result<(), SelectionError> {
        if !requester.is_admin() {
            return Err(SelectionError::Forbidden("Only admins can delete acceptances"));
        }

        let removed = self
            .acceptances
            .delete(id)?
            .ok_or(SelectionError::NotFound("Acceptance not found"))?;

        info!(acceptance = %removed.id, school = %removed.school, teacher = %removed.teacher, "acceptance deleted");
        Ok(())
    }

    /// Pairs on which the shortlist and the acceptance records disagree.
    pub fn reconciliation_report(
        &self,
        requester: &Requester,
    ) -> Result<ReconciliationReport, SelectionError> {
        if !requester.is_admin() {
            return Err(SelectionError::Forbidden("Only admins can access this endpoint"));
        }

        let schools = self.directory.schools()?;
        let acceptances = self.acceptances.find(&AcceptanceFilter::default())?;
        Ok(reconcile(&schools, &acceptances, Utc::now()))
    }

    fn school(&self, id: &SchoolId) -> Result<School, SelectionError> {
        self.directory
            .school(id)?
            .ok_or(SelectionError::NotFound("School not found"))
    }

    fn teacher(&self, id: &TeacherId) -> Result<Teacher, SelectionError> {
        self.directory
            .teacher(id)?
            .ok_or(SelectionError::NotFound("Teacher not found"))
    }

    fn view(&self, record: AcceptanceRecord) -> Result<AcceptanceView, RepositoryError> {
        let school = self.directory.school(&record.school)?.map(|s| s.summary());
        let teacher = self.directory.teacher(&record.teacher)?.map(|t| t.summary());

        Ok(AcceptanceView {
            id: record.id,
            school,
            teacher,
            accepted_at: record.accepted_at,
            status: record.status,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn views(&self, records: Vec<AcceptanceRecord>) -> Result<Vec<AcceptanceView>, RepositoryError> {
        records.into_iter().map(|record| self.view(record)).collect()
    }
}

/// Admins act on any school; a school only on itself.
fn authorize_school_scope(
    requester: &Requester,
    school: &SchoolId,
    denial: &'static str,
) -> Result<(), SelectionError> {
    if requester.is_admin() || requester.is(Role::School, &school.0) {
        Ok(())
    } else {
        Err(SelectionError::Forbidden(denial))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(value: Option<String>, message: &'static str) -> Result<String, SelectionError> {
    non_empty(value).ok_or(SelectionError::MissingField(message))
}

/// Outer `None` for a status outside the domain: such a filter matches nothing.
fn status_filter(raw: Option<String>) -> Option<Option<AcceptanceStatus>> {
    match non_empty(raw) {
        None => Some(None),
        Some(raw) => raw.parse::<AcceptanceStatus>().ok().map(Some),
    }
}

/// Error raised by the selection engine.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Teacher is already selected by this school")]
    AlreadySelected,
    #[error("You have already accepted this teacher")]
    AlreadyAccepted(Box<AcceptanceView>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
