//! In-memory store, for tests and ephemeral runs.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{KeyValueStore, StoreError};

/// A [`KeyValueStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
