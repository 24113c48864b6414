use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::models::message::ErrorResponse;

pub mod health;
pub mod messages;
pub mod metrics;

/// API routes that share `AppState`. `/metrics` is mounted separately in `main`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/message", post(messages::create_message))
        .route("/api/v1/message/{job_id}", get(messages::get_message))
}

/// Handler error rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
}

impl ApiError {
    pub fn job_not_found() -> Self {
        ApiError::NotFound("Message job not found".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ApiError::Unavailable(detail) => (StatusCode::SERVICE_UNAVAILABLE, detail),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
