//! Core types for the KioskWatch device-status registry.
//!
//! - [`identity`]: maps a report body onto a stable [`DeviceKey`]
//! - [`record`]: the per-device [`StatusRecord`]
//! - [`store`]: the pluggable [`StatusStore`] contract
//! - [`ingestion`] and [`query`]: the write and read paths over a store
//! - [`config`]: startup configuration

pub mod config;
pub mod identity;
pub mod ingestion;
pub mod query;
pub mod record;
pub mod store;

pub use config::{AuthConfig, ConfigError, RegistryConfig, ServerConfig, StoreConfig};
pub use identity::{resolve, DeviceKey, IDENTITY_FIELDS};
pub use ingestion::{Ack, Clock, IngestError, IngestionService, SystemClock};
pub use query::{QueryError, QueryOutcome, QueryService};
pub use record::{format_timestamp, StatusEntry, StatusRecord};
pub use store::{BackendKind, ListItem, StatusStore, StatusStream, StoreError};
