//! Shared application state.

use std::sync::Arc;

use kioskwatch_core::{
    AuthConfig, BackendKind, Clock, IngestionService, QueryService, StatusStore, SystemClock,
};

use crate::auth::AuthState;

/// State handed to every handler.
///
/// Both services wrap the same store instance, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub ingestion: IngestionService,
    pub query: QueryService,
    pub auth: AuthState,
    pub backend: BackendKind,
    pub persistent: bool,
    /// Server start time (Unix seconds).
    pub started_at: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn StatusStore>, auth: &AuthConfig) -> Self {
        Self::with_clock(store, auth, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn StatusStore>, auth: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend: store.backend(),
            persistent: store.is_persistent(),
            ingestion: IngestionService::with_clock(store.clone(), clock),
            query: QueryService::new(store),
            auth: AuthState::from_config(auth),
            started_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        (chrono::Utc::now().timestamp() - self.started_at).max(0) as u64
    }
}
