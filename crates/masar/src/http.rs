//! JSON envelope shared by every endpoint: `{success, message?, data?}`.

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T: Serialize>(status: StatusCode, message: Option<&str>, data: T) -> Response {
    let body = ApiResponse {
        success: true,
        message: message.map(str::to_string),
        data: Some(data),
    };
    (status, Json(body)).into_response()
}

pub fn message(status: StatusCode, message: &str) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: status.is_success(),
        message: Some(message.to_string()),
        data: None,
    };
    (status, Json(body)).into_response()
}

pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        message: Some(message.into()),
        data: None,
    };
    (status, Json(body)).into_response()
}

pub fn failure_with_data<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> Response {
    let body = ApiResponse {
        success: false,
        message: Some(message.into()),
        data: Some(data),
    };
    (status, Json(body)).into_response()
}

/// Fallback handler for unknown routes.
pub async fn route_not_found(uri: Uri) -> Response {
    failure(StatusCode::NOT_FOUND, format!("Route {} not found", uri.path()))
}
