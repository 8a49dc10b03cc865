//! Durable key/value persistence behind a swappable interface.
//!
//! The registry persists operator overrides and the one-time "ready" marker through
//! [`KeyValueStore`]. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local map, used by tests and by sessions without a storage path
//! - [`FileStore`]: JSON file on disk, survives restarts
//!
//! Writes are last-write-wins. A session owns its store view exclusively, so no merge or
//! optimistic-locking discipline is applied.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded or decoded.
    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Synchronous get/set/remove over string keys and values.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
