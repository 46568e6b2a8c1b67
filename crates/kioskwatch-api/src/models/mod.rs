//! Request and response models for the collector API.

use serde::Serialize;

use kioskwatch_core::{Ack, StatusEntry};

pub mod error;

pub use error::{codes, ErrorResponse};

/// Handler result type.
pub type ApiResult<T> = Result<T, ErrorResponse>;

/// `POST /report` success body.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub ack: Ack,
}

/// `GET /status` success body.
#[derive(Debug, Serialize)]
pub struct StatusListResponse {
    pub ok: bool,
    pub results: Vec<StatusEntry>,
}

/// `GET /status/:id` success body.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub result: StatusEntry,
}

/// `GET /health` body.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
    pub persistent: bool,
    pub uptime: u64,
}
