//! Status query service.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, warn};

use crate::identity::DeviceKey;
use crate::record::StatusEntry;
use crate::store::{StatusStore, StoreError};

/// Query errors.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// No record exists for the requested key.
    #[error("No status recorded for {0}")]
    NotFound(DeviceKey),

    /// The store could not be read.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

/// Result of a full listing, including how many records were unreadable.
#[derive(Debug, Default)]
pub struct QueryOutcome {
    pub entries: Vec<StatusEntry>,
    pub skipped: usize,
}

/// Reads the current snapshot of the fleet.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn StatusStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// Every current record, in store order. Unreadable records are skipped.
    pub async fn query_all(&self) -> Result<Vec<StatusEntry>, QueryError> {
        Ok(self.query_all_detailed().await?.entries)
    }

    /// Like [`query_all`](Self::query_all), also reporting skipped records.
    pub async fn query_all_detailed(&self) -> Result<QueryOutcome, QueryError> {
        let mut outcome = QueryOutcome::default();
        let mut stream = self.store.list();

        while let Some(item) = stream.next().await {
            match item {
                Ok((key, record)) => outcome.entries.push(record.into_entry(key)),
                Err(e) if e.is_record_local() => {
                    warn!(category = "query", error = %e, "Skipping unreadable status record");
                    outcome.skipped += 1;
                }
                Err(e) => {
                    error!(
                        category = "query",
                        backend = %self.store.backend(),
                        error = %e,
                        "Failed to list status records"
                    );
                    return Err(QueryError::Store(e));
                }
            }
        }

        debug!(
            category = "query",
            count = outcome.entries.len(),
            skipped = outcome.skipped,
            "Listed status records"
        );
        Ok(outcome)
    }

    /// The current record for one device.
    pub async fn query_one(&self, key: &DeviceKey) -> Result<StatusEntry, QueryError> {
        match self.store.get(key).await? {
            Some(record) => Ok(record.into_entry(key.clone())),
            None => Err(QueryError::NotFound(key.clone())),
        }
    }
}
