//! Health check and fallback handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::AppState;
use crate::models::{ErrorResponse, HealthStatus};

/// Health check with the active backend.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        service: "kioskwatch",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.backend.as_str(),
        persistent: state.persistent,
        uptime: state.uptime_secs(),
    })
}

/// Pre-flight `OPTIONS`: empty `200`.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

/// Known path, unsupported verb.
pub async fn method_not_allowed_handler() -> ErrorResponse {
    ErrorResponse::method_not_allowed()
}

/// Unknown path.
pub async fn not_found_handler() -> ErrorResponse {
    ErrorResponse::not_found("Route not found")
}
