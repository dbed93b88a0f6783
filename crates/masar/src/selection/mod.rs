//! School -> teacher shortlist and the moderated acceptance workflow.

pub mod audit;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use audit::{reconcile, Divergence, ReconciliationEntry, ReconciliationReport};
pub use domain::{
    AcceptanceId, AcceptancePage, AcceptanceQuery, AcceptanceRecord, AcceptanceRequest,
    AcceptanceReview, AcceptanceStatus, AcceptanceView, OwnAcceptanceQuery, RemovalRequest,
    SchoolAcceptances, SchoolSelections, SelectionReceipt, SelectionRequest, StatusUpdate,
    UnknownStatus,
};
pub use repository::{AcceptanceFilter, AcceptanceInsert, AcceptanceRepository};
pub use router::selection_router;
pub use service::{SelectionEngine, SelectionError};

#[cfg(test)]
mod tests;
