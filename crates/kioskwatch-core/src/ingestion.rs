//! Report ingestion service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::identity::{self, DeviceKey};
use crate::record::{iso_millis, StatusRecord};
use crate::store::{StatusStore, StoreError};

/// Source of the server-side `receivedAt` stamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Ingestion errors.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Body missing, empty, or not JSON.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The store rejected the write.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

/// Acknowledgement returned to the reporting device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    /// Key the report was recorded under.
    pub id: DeviceKey,
    #[serde(with = "iso_millis")]
    pub received_at: DateTime<Utc>,
}

/// Validates inbound reports and writes them through to the store.
///
/// Writes are attempted once. A lost report is superseded by the device's
/// next periodic report.
#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn StatusStore>,
    clock: Arc<dyn Clock>,
}

impl IngestionService {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn StatusStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Parse a raw report body and record it.
    pub async fn ingest(&self, raw_body: &[u8]) -> Result<Ack, IngestError> {
        let payload = parse_body(raw_body).inspect_err(|e| {
            warn!(category = "ingest", error = %e, "Rejected report");
        })?;
        self.ingest_value(payload).await
    }

    /// Record an already parsed report body.
    pub async fn ingest_value(&self, payload: Value) -> Result<Ack, IngestError> {
        let key = identity::resolve(&payload);
        if key.is_unknown() {
            debug!(category = "ingest", "Report carries no identity field, storing as unknown");
        }

        let record = StatusRecord::new(self.clock.now(), payload);
        let received_at = record.received_at;

        if let Err(e) = self.store.put(&key, &record).await {
            error!(
                category = "ingest",
                device = %key,
                backend = %self.store.backend(),
                error = %e,
                "Failed to store report"
            );
            return Err(IngestError::Store(e));
        }

        info!(category = "ingest", device = %key, "Stored status report");
        Ok(Ack {
            id: key,
            received_at,
        })
    }
}

fn parse_body(raw_body: &[u8]) -> Result<Value, IngestError> {
    if raw_body.iter().all(u8::is_ascii_whitespace) {
        return Err(IngestError::InvalidPayload("request body is empty".to_string()));
    }
    serde_json::from_slice(raw_body).map_err(|e| IngestError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_rejects_empty() {
        assert!(matches!(parse_body(b""), Err(IngestError::InvalidPayload(_))));
        assert!(matches!(parse_body(b" \n\t"), Err(IngestError::InvalidPayload(_))));
    }

    #[test]
    fn test_parse_body_rejects_malformed() {
        assert!(matches!(parse_body(b"{\"Device\":"), Err(IngestError::InvalidPayload(_))));
        assert!(matches!(parse_body(b"not json"), Err(IngestError::InvalidPayload(_))));
    }

    #[test]
    fn test_parse_body_accepts_any_json() {
        assert!(parse_body(b"{\"Device\":\"k\"}").is_ok());
        assert!(parse_body(b"[1,2]").is_ok());
    }
}
