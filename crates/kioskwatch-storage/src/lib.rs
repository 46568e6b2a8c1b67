//! Status store backends for KioskWatch.
//!
//! Every backend implements [`kioskwatch_core::StatusStore`]; callers pick
//! one at startup through [`create_store`] and never see which is active.

pub mod backends;

pub use backends::{available_backends, create_store, MemoryStore};

#[cfg(feature = "redb")]
pub use backends::RedbStore;

#[cfg(feature = "remote")]
pub use backends::RemoteStore;
