//! In-memory status store.
//!
//! Records live for the life of the process. One instance is created at
//! startup and shared by the ingestion and query services.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;

use kioskwatch_core::store::Result;
use kioskwatch_core::{BackendKind, DeviceKey, StatusRecord, StatusStore, StatusStream};

/// Sharded concurrent map keyed by device.
///
/// Writers to different keys land on different shards in the common case and
/// only serialise with writers to the same key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<DeviceKey, StatusRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn put(&self, key: &DeviceKey, record: &StatusRecord) -> Result<()> {
        self.records.insert(key.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, key: &DeviceKey) -> Result<Option<StatusRecord>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    fn list(&self) -> StatusStream<'_> {
        let snapshot: Vec<_> = self
            .records
            .iter()
            .map(|entry| Ok((entry.key().clone(), entry.value().clone())))
            .collect();
        futures::stream::iter(snapshot).boxed()
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
