//! Redb status store.
//!
//! Records are kept as JSON documents in a single table keyed by device, so
//! they survive restarts. redb is synchronous; every call runs on the tokio
//! blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use redb::{Database, ReadableTable, TableDefinition, TableError};

use kioskwatch_core::store::{ListItem, Result};
use kioskwatch_core::{BackendKind, DeviceKey, StatusRecord, StatusStore, StatusStream, StoreError};

// key = device key, value = StatusRecord (JSON)
const STATUS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("status_records");

fn backend_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("Redb error: {}", e))
}

fn decode(key: String, bytes: &[u8]) -> ListItem {
    match serde_json::from_slice::<StatusRecord>(bytes) {
        Ok(record) => Ok((DeviceKey::new(key), record)),
        Err(e) => Err(StoreError::corrupt(key, e)),
    }
}

/// redb-backed persistent status store.
///
/// redb admits one write transaction at a time, so concurrent puts queue
/// behind each other even for different keys. Reads run alongside writes.
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path).map_err(backend_err)?;

        // Make sure the table exists so readers never race its creation.
        let txn = db.begin_write().map_err(backend_err)?;
        txn.open_table(STATUS_TABLE).map_err(backend_err)?;
        txn.commit().map_err(backend_err)?;

        tracing::debug!(path = %path.display(), "Opened redb status store");
        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Backend(format!("Task join error: {}", e)))?
    }
}

fn read_all(db: &Database) -> Result<Vec<(String, Vec<u8>)>> {
    // One read transaction: a consistent snapshot of the table.
    let txn = db.begin_read().map_err(backend_err)?;
    let table = match txn.open_table(STATUS_TABLE) {
        Ok(table) => table,
        Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
        Err(e) => return Err(backend_err(e)),
    };

    let mut rows = Vec::new();
    for item in table.iter().map_err(backend_err)? {
        let (key, value) = item.map_err(backend_err)?;
        rows.push((key.value().to_string(), value.value().to_vec()));
    }
    Ok(rows)
}

#[async_trait]
impl StatusStore for RedbStore {
    async fn put(&self, key: &DeviceKey, record: &StatusRecord) -> Result<()> {
        let key = key.as_str().to_string();
        let bytes = serde_json::to_vec(record)?;

        self.blocking(move |db| {
            let txn = db.begin_write().map_err(backend_err)?;
            {
                let mut table = txn.open_table(STATUS_TABLE).map_err(backend_err)?;
                table.insert(key.as_str(), bytes.as_slice()).map_err(backend_err)?;
            }
            txn.commit().map_err(backend_err)?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &DeviceKey) -> Result<Option<StatusRecord>> {
        let key = key.as_str().to_string();

        self.blocking(move |db| {
            let txn = db.begin_read().map_err(backend_err)?;
            let table = txn.open_table(STATUS_TABLE).map_err(backend_err)?;
            let bytes = match table.get(key.as_str()).map_err(backend_err)? {
                Some(value) => value.value().to_vec(),
                None => return Ok(None),
            };
            decode(key, &bytes).map(|(_, record)| Some(record))
        })
        .await
    }

    fn list(&self) -> StatusStream<'_> {
        let rows = self.blocking(read_all);

        futures::stream::once(rows)
            .flat_map(|rows| match rows {
                Ok(rows) => futures::stream::iter(rows)
                    .map(|(key, bytes)| decode(key, &bytes))
                    .left_stream(),
                Err(e) => futures::stream::once(async move { Err(e) }).right_stream(),
            })
            .boxed()
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Redb
    }

    fn is_persistent(&self) -> bool {
        true
    }
}
