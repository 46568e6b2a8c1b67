//! API handlers.

pub mod basic;
pub mod report;
pub mod status;

pub use crate::server::AppState;

pub use basic::{health_handler, method_not_allowed_handler, not_found_handler, preflight_handler};
pub use report::report_handler;
pub use status::{get_status_handler, list_status_handler};
