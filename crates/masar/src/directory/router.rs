use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Response,
    routing::get,
    Router,
};
use tracing::error;

use super::discovery::{DirectoryError, TeacherDirectory, TeacherQuery};
use super::domain::TeacherId;
use super::repository::DirectoryRepository;
use crate::auth::{require_auth, TokenVerifier};
use crate::http;

/// Teacher discovery endpoints. Every route requires a bearer token.
pub fn teacher_router<D>(service: Arc<TeacherDirectory<D>>, verifier: Arc<TokenVerifier>) -> Router
where
    D: DirectoryRepository + 'static,
{
    Router::new()
        .route("/api/teachers", get(list_teachers_handler::<D>))
        .route("/api/teachers/:id", get(teacher_handler::<D>))
        .route_layer(middleware::from_fn_with_state(verifier, require_auth))
        .with_state(service)
}

async fn list_teachers_handler<D>(
    State(service): State<Arc<TeacherDirectory<D>>>,
    Query(query): Query<TeacherQuery>,
) -> Response
where
    D: DirectoryRepository + 'static,
{
    match service.list(query) {
        Ok(page) => http::success(StatusCode::OK, None, page),
        Err(error) => directory_failure(error),
    }
}

async fn teacher_handler<D>(
    State(service): State<Arc<TeacherDirectory<D>>>,
    Path(id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
{
    match service.teacher(&TeacherId(id)) {
        Ok(teacher) => http::success(StatusCode::OK, None, teacher),
        Err(error) => directory_failure(error),
    }
}

fn directory_failure(error: DirectoryError) -> Response {
    let status = match &error {
        DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
        DirectoryError::Repository(_) => {
            error!(%error, "teacher directory lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    http::failure(status, error.to_string())
}
