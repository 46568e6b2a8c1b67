//! Unified error handling for the API.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use kioskwatch_core::{IngestError, QueryError};

/// Stable error codes returned to callers.
pub mod codes {
    pub const INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const STORE_FAILURE: &str = "STORE_FAILURE";
}

/// API error response with its HTTP status.
///
/// Rendered as `{"ok": false, "error": {"code": ..., "message": ...}}`.
/// Messages are written for untrusted callers; backend detail is logged at the
/// point of failure and never copied in here.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ErrorResponse {
    pub fn new(code: &'static str, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code,
            message: message.into(),
            status,
        }
    }

    /// Bad request (400).
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PAYLOAD, message, StatusCode::BAD_REQUEST)
    }

    /// Unauthorized (401).
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(codes::UNAUTHORIZED, message, StatusCode::UNAUTHORIZED)
    }

    /// Method not allowed (405).
    pub fn method_not_allowed() -> Self {
        Self::new(
            codes::METHOD_NOT_ALLOWED,
            "Method not allowed",
            StatusCode::METHOD_NOT_ALLOWED,
        )
    }

    /// Not found (404).
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(codes::NOT_FOUND, message, StatusCode::NOT_FOUND)
    }

    /// Store failure (500).
    pub fn store_failure(message: impl Into<String>) -> Self {
        Self::new(
            codes::STORE_FAILURE,
            message,
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "ok": false,
            "error": self,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

impl From<IngestError> for ErrorResponse {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::InvalidPayload(reason) => Self::invalid_payload(reason),
            IngestError::Store(_) => Self::store_failure("Failed to store status report"),
        }
    }
}

impl From<QueryError> for ErrorResponse {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::NotFound(key) => {
                Self::not_found(format!("No status recorded for device {}", key))
            }
            QueryError::Store(_) => Self::store_failure("Failed to read device status"),
        }
    }
}
