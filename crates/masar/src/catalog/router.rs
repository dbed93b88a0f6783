use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use tracing::error;

use super::repository::{VideoCatalog, VideoUpsert};
use super::service::{CatalogError, VideoCatalogService, VideoRegistration};
use crate::auth::{require_auth, Requester, TokenVerifier};
use crate::directory::{DirectoryRepository, TeacherId};
use crate::http;

/// Video metadata endpoints. Every route requires a bearer token.
pub fn video_router<D, V>(
    service: Arc<VideoCatalogService<D, V>>,
    verifier: Arc<TokenVerifier>,
) -> Router
where
    D: DirectoryRepository + 'static,
    V: VideoCatalog + 'static,
{
    Router::new()
        .route("/api/videos", post(register_handler::<D, V>))
        .route(
            "/api/videos/teacher/:teacher_id",
            get(teacher_videos_handler::<D, V>),
        )
        .route_layer(middleware::from_fn_with_state(verifier, require_auth))
        .with_state(service)
}

pub(crate) async fn register_handler<D, V>(
    State(service): State<Arc<VideoCatalogService<D, V>>>,
    Extension(requester): Extension<Requester>,
    body: Option<Json<VideoRegistration>>,
) -> Response
where
    D: DirectoryRepository + 'static,
    V: VideoCatalog + 'static,
{
    let registration = body.map(|Json(body)| body).unwrap_or_default();
    match service.register(&requester, registration) {
        Ok(VideoUpsert::Created(record)) => http::success(
            StatusCode::CREATED,
            Some("Video uploaded successfully"),
            record,
        ),
        Ok(VideoUpsert::Replaced(record)) => http::success(
            StatusCode::OK,
            Some("Video replaced successfully"),
            record,
        ),
        Err(error) => catalog_failure(error),
    }
}

pub(crate) async fn teacher_videos_handler<D, V>(
    State(service): State<Arc<VideoCatalogService<D, V>>>,
    Extension(_requester): Extension<Requester>,
    Path(teacher_id): Path<String>,
) -> Response
where
    D: DirectoryRepository + 'static,
    V: VideoCatalog + 'static,
{
    match service.teacher_videos(&TeacherId(teacher_id)) {
        Ok(videos) => http::success(StatusCode::OK, None, videos),
        Err(error) => catalog_failure(error),
    }
}

fn catalog_failure(error: CatalogError) -> Response {
    let status = match &error {
        CatalogError::Forbidden(_) => StatusCode::FORBIDDEN,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::MissingField(_) => StatusCode::BAD_REQUEST,
        CatalogError::Repository(_) => {
            error!(%error, "video catalog operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    http::failure(status, error.to_string())
}
