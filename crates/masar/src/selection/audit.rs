//! Reconciliation between school shortlists and acceptance records.
//!
//! The two representations are maintained independently, so a pair can be
//! shortlisted without an acceptance, accepted without being shortlisted, or
//! shortlisted while its acceptance was rejected. The report lists those pairs
//! and leaves any repair to an operator.

use std::collections::BTreeMap;
use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AcceptanceId, AcceptanceRecord, AcceptanceStatus};
use crate::directory::{School, SchoolId, TeacherId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Divergence {
    ShortlistOnly,
    AcceptanceOnly,
    RejectedButShortlisted,
}

impl Divergence {
    pub const fn label(self) -> &'static str {
        match self {
            Divergence::ShortlistOnly => "shortlist_only",
            Divergence::AcceptanceOnly => "acceptance_only",
            Divergence::RejectedButShortlisted => "rejected_but_shortlisted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationEntry {
    pub school: SchoolId,
    pub teacher: TeacherId,
    pub divergence: Divergence,
    pub acceptance_id: Option<AcceptanceId>,
    pub acceptance_status: Option<AcceptanceStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub generated_at: DateTime<Utc>,
    pub schools_scanned: usize,
    pub shortlist_entries: usize,
    pub acceptance_records: usize,
    pub consistent_pairs: usize,
    pub entries: Vec<ReconciliationEntry>,
}

#[derive(Default)]
struct PairState<'a> {
    shortlisted: bool,
    acceptance: Option<&'a AcceptanceRecord>,
}

/// Compares every shortlist entry with every acceptance record.
pub fn reconcile(
    schools: &[School],
    acceptances: &[AcceptanceRecord],
    generated_at: DateTime<Utc>,
) -> ReconciliationReport {
    let mut pairs: BTreeMap<(SchoolId, TeacherId), PairState<'_>> = BTreeMap::new();
    let mut shortlist_entries = 0;

    for school in schools {
        for teacher in &school.selected_teachers {
            shortlist_entries += 1;
            pairs
                .entry((school.id.clone(), teacher.clone()))
                .or_default()
                .shortlisted = true;
        }
    }

    for record in acceptances {
        pairs
            .entry((record.school.clone(), record.teacher.clone()))
            .or_default()
            .acceptance = Some(record);
    }

    let mut consistent_pairs = 0;
    let mut entries = Vec::new();
    for ((school, teacher), state) in pairs {
        let divergence = match (state.shortlisted, state.acceptance) {
            (true, None) => Some(Divergence::ShortlistOnly),
            (false, Some(_)) => Some(Divergence::AcceptanceOnly),
            (true, Some(record)) if record.status == AcceptanceStatus::Rejected => {
                Some(Divergence::RejectedButShortlisted)
            }
            _ => None,
        };

        match divergence {
            Some(divergence) => entries.push(ReconciliationEntry {
                school,
                teacher,
                divergence,
                acceptance_id: state.acceptance.map(|record| record.id.clone()),
                acceptance_status: state.acceptance.map(|record| record.status),
            }),
            None => consistent_pairs += 1,
        }
    }

    ReconciliationReport {
        generated_at,
        schools_scanned: schools.len(),
        shortlist_entries,
        acceptance_records: acceptances.len(),
        consistent_pairs,
        entries,
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    school_id: &'a str,
    teacher_id: &'a str,
    divergence: &'static str,
    acceptance_id: &'a str,
    acceptance_status: &'static str,
}

impl ReconciliationReport {
    pub fn is_consistent(&self) -> bool {
        self.entries.is_empty()
    }

    /// One row per divergent pair, with a header row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        if self.entries.is_empty() {
            writer.write_record([
                "school_id",
                "teacher_id",
                "divergence",
                "acceptance_id",
                "acceptance_status",
            ])?;
        }
        for entry in &self.entries {
            writer.serialize(CsvRow {
                school_id: &entry.school.0,
                teacher_id: &entry.teacher.0,
                divergence: entry.divergence.label(),
                acceptance_id: entry
                    .acceptance_id
                    .as_ref()
                    .map(|id| id.0.as_str())
                    .unwrap_or_default(),
                acceptance_status: entry
                    .acceptance_status
                    .map(AcceptanceStatus::label)
                    .unwrap_or_default(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}
