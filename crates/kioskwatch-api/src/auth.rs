//! Shared-secret check for report submission.
//!
//! When an API key is configured, `POST /report` must carry it in either the
//! `x-api-key` header or `Authorization: Bearer <key>`. The check runs as
//! route middleware, so a rejected request is answered before its body is
//! read and leaves the store untouched.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use kioskwatch_core::AuthConfig;

use crate::models::ErrorResponse;

/// Hash an API key for comparison (one-way).
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hasher.update(b"KioskWatch-API-Key-v1");
    format!("{:x}", hasher.finalize())
}

/// Configured shared secret, kept only as its hash.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    key_hash: Option<String>,
}

impl AuthState {
    /// No key configured: every report is accepted.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_key(api_key: &str) -> Self {
        Self {
            key_hash: Some(hash_api_key(api_key)),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        match config.api_key.as_deref() {
            Some(key) => Self::with_key(key),
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.key_hash.is_some()
    }

    pub fn validate_key(&self, api_key: &str) -> bool {
        match &self.key_hash {
            Some(expected) => hash_api_key(api_key) == *expected,
            None => true,
        }
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
}

/// API key middleware for the report routes.
///
/// Only `POST` is gated; other methods fall through to the route's own
/// handling (pre-flight, 405).
pub async fn api_key_middleware(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Result<Response, ErrorResponse> {
    if !auth.is_enabled() || req.method() != Method::POST {
        return Ok(next.run(req).await);
    }

    let api_key = extract_api_key(req.headers()).ok_or_else(|| {
        tracing::warn!(category = "auth", "Report rejected: missing API key");
        ErrorResponse::unauthorized(
            "Missing API key. Provide X-API-Key header or Authorization: Bearer <key>",
        )
    })?;

    if !auth.validate_key(api_key) {
        tracing::warn!(category = "auth", "Report rejected: invalid API key");
        return Err(ErrorResponse::unauthorized("Invalid API key"));
    }

    Ok(next.run(req).await)
}
