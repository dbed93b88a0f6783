use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Response,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use tracing::error;

use super::domain::{
    AcceptanceId, AcceptanceQuery, AcceptanceRequest, OwnAcceptanceQuery, RemovalRequest,
    SelectionRequest, StatusUpdate,
};
use super::repository::AcceptanceRepository;
use super::service::{SelectionEngine, SelectionError};
use crate::auth::{require_auth, Requester, TokenVerifier};
use crate::directory::{DirectoryRepository, SchoolId};
use crate::http;

/// Shortlist, acceptance, and audit endpoints. Every route requires a bearer token.
pub fn selection_router<D, A>(
    engine: Arc<SelectionEngine<D, A>>,
    verifier: Arc<TokenVerifier>,
) -> Router
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    Router::new()
        .route("/api/selection/accept", post(select_handler::<D, A>))
        .route(
            "/api/selection/school/:school_id",
            get(list_selections_handler::<D, A>),
        )
        .route("/api/selection/remove", delete(remove_handler::<D, A>))
        .route("/api/acceptance/accept", post(accept_handler::<D, A>))
        .route(
            "/api/acceptance/school",
            get(school_acceptances_handler::<D, A>),
        )
        .route("/api/acceptance/all", get(all_acceptances_handler::<D, A>))
        .route(
            "/api/acceptance/:id/status",
            put(update_status_handler::<D, A>),
        )
        .route("/api/acceptance/:id", delete(delete_acceptance_handler::<D, A>))
        .route("/api/audit/selections", get(audit_handler::<D, A>))
        .route_layer(middleware::from_fn_with_state(verifier, require_auth))
        .with_state(engine)
}

type Engine<D, A> = State<Arc<SelectionEngine<D, A>>>;

fn body_or_default<T: Default>(body: Option<Json<T>>) -> T {
    body.map(|Json(body)| body).unwrap_or_default()
}

pub(crate) async fn select_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
    body: Option<Json<SelectionRequest>>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.select(&requester, body_or_default(body)) {
        Ok(receipt) => http::success(
            StatusCode::OK,
            Some("Teacher selected successfully"),
            receipt,
        ),
        Err(error) => selection_failure(error),
    }
}

pub(crate) async fn list_selections_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
    Path(school_id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.list_selections(&requester, &SchoolId(school_id)) {
        Ok(selections) => http::success(StatusCode::OK, None, selections),
        Err(error) => selection_failure(error),
    }
}

pub(crate) async fn remove_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
    body: Option<Json<RemovalRequest>>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.remove(&requester, body_or_default(body)) {
        Ok(()) => http::message(StatusCode::OK, "Teacher removed from selections"),
        Err(error) => selection_failure(error),
    }
}

pub(crate) async fn accept_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
    body: Option<Json<AcceptanceRequest>>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.accept(&requester, body_or_default(body)) {
        Ok(acceptance) => http::success(
            StatusCode::CREATED,
            Some("Teacher accepted successfully"),
            acceptance,
        ),
        Err(error) => selection_failure(error),
    }
}

pub(crate) async fn school_acceptances_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
    Query(query): Query<OwnAcceptanceQuery>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.school_acceptances(&requester, query) {
        Ok(acceptances) => http::success(StatusCode::OK, None, acceptances),
        Err(error) => selection_failure(error),
    }
}

pub(crate) async fn all_acceptances_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
    Query(query): Query<AcceptanceQuery>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.all_acceptances(&requester, query) {
        Ok(page) => http::success(StatusCode::OK, None, page),
        Err(error) => selection_failure(error),
    }
}

pub(crate) async fn update_status_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
    body: Option<Json<StatusUpdate>>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.update_status(&requester, &AcceptanceId(id), body_or_default(body)) {
        Ok(acceptance) => http::success(
            StatusCode::OK,
            Some("Acceptance status updated successfully"),
            acceptance,
        ),
        Err(error) => selection_failure(error),
    }
}

pub(crate) async fn delete_acceptance_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.delete_acceptance(&requester, &AcceptanceId(id)) {
        Ok(()) => http::message(StatusCode::OK, "Acceptance deleted successfully"),
        Err(error) => selection_failure(error),
    }
}

pub(crate) async fn audit_handler<D, A>(
    State(engine): Engine<D, A>,
    Extension(requester): Extension<Requester>,
) -> Response
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
{
    match engine.reconciliation_report(&requester) {
        Ok(report) => http::success(StatusCode::OK, None, report),
        Err(error) => selection_failure(error),
    }
}

fn selection_failure(error: SelectionError) -> Response {
    let status = match &error {
        SelectionError::Forbidden(_) => StatusCode::FORBIDDEN,
        SelectionError::NotFound(_) => StatusCode::NOT_FOUND,
        SelectionError::MissingField(_)
        | SelectionError::InvalidInput(_)
        | SelectionError::AlreadySelected => StatusCode::BAD_REQUEST,
        SelectionError::AlreadyAccepted(existing) => {
            return http::failure_with_data(
                StatusCode::BAD_REQUEST,
                error.to_string(),
                existing.as_ref(),
            );
        }
        SelectionError::Repository(_) => {
            error!(%error, "selection operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    http::failure(status, error.to_string())
}
