//! Status store contract.
//!
//! This module defines the backend-agnostic key-value interface the
//! ingestion and query services are written against. Implementations live in
//! `kioskwatch-storage`.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::identity::DeviceKey;
use crate::record::StatusRecord;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// One item of a [`StatusStore::list`] enumeration.
pub type ListItem = Result<(DeviceKey, StatusRecord)>;

/// Stream returned by [`StatusStore::list`].
pub type StatusStream<'a> = BoxStream<'a, ListItem>;

/// Store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Backend call exceeded its deadline.
    #[error("Store request timed out: {0}")]
    Timeout(String),

    /// A single stored record could not be decoded.
    #[error("Corrupt record for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Backend rejected the operation or returned malformed data.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Encoding a record failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Store could not be built from its configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Corrupt record error for `key`.
    pub fn corrupt(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error concerns one record only, so a listing may continue
    /// past it.
    pub fn is_record_local(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Recognised store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process map; contents are lost on restart.
    #[default]
    Memory,
    /// Embedded redb database file.
    Redb,
    /// External blob service over HTTP.
    Remote,
}

impl BackendKind {
    pub const ALL: &'static [BackendKind] = &[Self::Memory, Self::Redb, Self::Remote];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redb" => Ok(Self::Redb),
            "remote" => Ok(Self::Remote),
            other => Err(StoreError::Configuration(format!(
                "Unknown backend type: {}. Available backends: memory, redb, remote",
                other
            ))),
        }
    }
}

/// Key-value store holding one [`StatusRecord`] per [`DeviceKey`].
///
/// `put` replaces the whole record for a key and must be atomic with respect
/// to other calls on the same key. Calls on different keys are independent.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Insert or replace the record for `key`.
    async fn put(&self, key: &DeviceKey, record: &StatusRecord) -> Result<()>;

    /// Read the record for `key`; `Ok(None)` when there is none.
    async fn get(&self, key: &DeviceKey) -> Result<Option<StatusRecord>>;

    /// Enumerate every stored record.
    ///
    /// Each key is yielded at most once per call. Items that fail with an
    /// error for which [`StoreError::is_record_local`] holds may be skipped;
    /// any other error ends the enumeration. Calling `list` again starts a
    /// fresh enumeration.
    fn list(&self) -> StatusStream<'_>;

    /// Which backend this is.
    fn backend(&self) -> BackendKind;

    /// Whether records survive a process restart.
    fn is_persistent(&self) -> bool;
}
