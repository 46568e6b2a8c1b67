//! Status store backend implementations.
//!
//! `memory` is always built; `redb` and `remote` are feature-gated.

use std::sync::Arc;

use kioskwatch_core::store::Result;
use kioskwatch_core::{BackendKind, StatusStore, StoreConfig, StoreError};

pub mod memory;

#[cfg(feature = "redb")]
pub mod redb;

#[cfg(feature = "remote")]
pub mod remote;

pub use memory::MemoryStore;

#[cfg(feature = "redb")]
pub use redb::RedbStore;

#[cfg(feature = "remote")]
pub use remote::RemoteStore;

/// Create the store selected by `config`.
///
/// # Example
/// ```
/// use kioskwatch_core::StoreConfig;
/// use kioskwatch_storage::backends::create_store;
///
/// let store = create_store(&StoreConfig::memory()).unwrap();
/// assert!(!store.is_persistent());
/// ```
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn StatusStore>> {
    let store: Arc<dyn StatusStore> = match config.backend {
        BackendKind::Memory => Arc::new(MemoryStore::new()),

        #[cfg(feature = "redb")]
        BackendKind::Redb => Arc::new(RedbStore::open(&config.path)?),

        #[cfg(feature = "remote")]
        BackendKind::Remote => Arc::new(RemoteStore::from_config(config)?),

        #[allow(unreachable_patterns)]
        other => {
            return Err(StoreError::Configuration(format!(
                "Backend {} is not compiled in. Available backends: {}",
                other,
                available_backends().join(", ")
            )))
        }
    };

    tracing::info!(
        category = "storage",
        backend = %store.backend(),
        persistent = store.is_persistent(),
        "Status store ready"
    );
    Ok(store)
}

/// Backend types compiled into this build.
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = vec![BackendKind::Memory.as_str()];
    #[cfg(feature = "redb")]
    backends.push(BackendKind::Redb.as_str());
    #[cfg(feature = "remote")]
    backends.push(BackendKind::Remote.as_str());
    backends
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_backends() {
        let backends = available_backends();
        assert!(backends.contains(&"memory"));
    }

    #[test]
    fn test_create_memory_store() {
        let store = create_store(&StoreConfig::memory()).unwrap();
        assert_eq!(store.backend(), BackendKind::Memory);
        assert!(!store.is_persistent());
    }

    #[cfg(feature = "redb")]
    #[test]
    fn test_create_redb_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.redb");
        let store = create_store(&StoreConfig::redb(path.to_string_lossy())).unwrap();
        assert_eq!(store.backend(), BackendKind::Redb);
        assert!(store.is_persistent());
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_create_remote_store_without_url() {
        let mut config = StoreConfig::remote("x");
        config.base_url = None;
        assert!(matches!(create_store(&config), Err(StoreError::Configuration(_))));
    }
}
