use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::{
    PartyRef, SchoolId, SchoolSummary, TeacherId, TeacherSummary,
};
use crate::storage::Pagination;

/// Identifier wrapper for acceptance records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcceptanceId(pub String);

impl AcceptanceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for AcceptanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Moderation state of an acceptance. Any state may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptanceStatus {
    Pending,
    Approved,
    Rejected,
}

impl AcceptanceStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub const fn label(self) -> &'static str {
        match self {
            AcceptanceStatus::Pending => "pending",
            AcceptanceStatus::Approved => "approved",
            AcceptanceStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AcceptanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown acceptance status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for AcceptanceStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == raw)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

/// Durable acceptance record. At most one exists per (school, teacher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceRecord {
    pub id: AcceptanceId,
    pub school: SchoolId,
    pub teacher: TeacherId,
    pub accepted_at: DateTime<Utc>,
    pub status: AcceptanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcceptanceRecord {
    pub fn pending(
        school: SchoolId,
        teacher: TeacherId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AcceptanceId::generate(),
            school,
            teacher,
            accepted_at: now,
            status: AcceptanceStatus::Pending,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pair(&self, school: &SchoolId, teacher: &TeacherId) -> bool {
        &self.school == school && &self.teacher == teacher
    }
}

/// Admin decision applied to an acceptance. Notes replace the stored value wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceReview {
    pub status: AcceptanceStatus,
    pub notes: Option<String>,
}

/// Acceptance with both parties resolved. A party whose record is gone is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceView {
    pub id: AcceptanceId,
    pub school: Option<SchoolSummary>,
    pub teacher: Option<TeacherSummary>,
    pub accepted_at: DateTime<Utc>,
    pub status: AcceptanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub school_id: Option<String>,
    pub teacher_id: Option<String>,
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalRequest {
    pub school_id: Option<String>,
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceRequest {
    pub teacher_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnAcceptanceQuery {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceQuery {
    pub status: Option<String>,
    pub school_id: Option<String>,
    pub teacher_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Result of a successful shortlist selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReceipt {
    pub school: PartyRef<SchoolId>,
    pub teacher: PartyRef<TeacherId>,
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSelections {
    pub school: PartyRef<SchoolId>,
    pub selected_teachers: Vec<TeacherSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolAcceptances {
    pub count: usize,
    pub acceptances: Vec<AcceptanceView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptancePage {
    pub acceptances: Vec<AcceptanceView>,
    pub pagination: Pagination,
}
