//! Persistence port for tracked paths and accumulated series.
//!
//! State is kept in a durable string-keyed store. Each logical record is a
//! whole JSON document that is replaced on every write; the last writer wins.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt::Debug;

use thiserror::Error;

/// Record holding the JSON array of selected path tokens.
pub const SELECTION_KEY: &str = "selectedItems";

/// Record holding the JSON series snapshot.
pub const SERIES_KEY: &str = "timeSeries";

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid store key: {0:?}")]
    InvalidKey(String),
}

/// A durable string-keyed store.
///
/// # Example
///
/// ```
/// use jsonwatch::{KeyValueStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("selectedItems", "[\"a.b\"]").unwrap();
/// assert_eq!(store.get("selectedItems").unwrap().as_deref(), Some("[\"a.b\"]"));
/// ```
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read a record. `Ok(None)` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace a record.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}
