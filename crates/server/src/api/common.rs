//! Shared helpers and type aliases for API handlers.

use std::fmt::Display;

use axum::http::StatusCode;
use axum::Json;

use crate::state::AppState;

use super::ErrorResponse;

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);
pub(crate) type ApiResult<T> = Result<T, ApiError>;

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn require_pg(state: &AppState) -> ApiResult<&sqlx::PgPool> {
    state
        .pg_pool
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "PostgreSQL not configured"))
}

pub(crate) fn internal_error(e: impl Display) -> ApiError {
    tracing::error!(error = %e, "request failed");
    error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

pub(crate) fn not_found(resource: &str, id: impl Display) -> ApiError {
    error(StatusCode::NOT_FOUND, format!("{} not found: {}", resource, id))
}

pub(crate) fn bad_request(msg: impl Into<String>) -> ApiError {
    error(StatusCode::BAD_REQUEST, msg)
}
