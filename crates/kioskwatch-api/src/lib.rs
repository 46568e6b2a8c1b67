//! HTTP collector for KioskWatch.
//!
//! Kiosks `POST /report` their health snapshots; dashboards read the latest
//! snapshot per device from `GET /status`.

pub mod auth;
pub mod handlers;
pub mod models;
pub mod server;
pub mod shutdown;

pub use auth::{hash_api_key, AuthState};
pub use models::{ErrorResponse, ReportResponse, StatusListResponse, StatusResponse};
pub use server::{create_router, run, serve, AppState};
