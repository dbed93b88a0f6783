use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use masar::auth::TokenVerifier;
use masar::catalog::{video_router, VideoCatalog, VideoCatalogService};
use masar::directory::{teacher_router, DirectoryRepository, TeacherDirectory};
use masar::http;
use masar::selection::{selection_router, AcceptanceRepository, SelectionEngine};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Full HTTP surface: engine, catalog, and teacher routes, probes, and the 404 fallback.
pub(crate) fn with_api_routes<D, A, V>(
    engine: Arc<SelectionEngine<D, A>>,
    catalog: Arc<VideoCatalogService<D, V>>,
    teachers: Arc<TeacherDirectory<D>>,
    verifier: Arc<TokenVerifier>,
) -> Router
where
    D: DirectoryRepository + 'static,
    A: AcceptanceRepository + 'static,
    V: VideoCatalog + 'static,
{
    selection_router(engine, verifier.clone())
        .merge(video_router(catalog, verifier.clone()))
        .merge(teacher_router(teachers, verifier))
        .route("/", get(api_index))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .fallback(http::route_not_found)
}

pub(crate) async fn api_index() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Masar Backend API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "selection": "/api/selection",
                "acceptance": "/api/acceptance",
                "teachers": "/api/teachers",
                "videos": "/api/videos",
                "audit": "/api/audit/selections",
            },
        })),
    )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
