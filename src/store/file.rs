//! File-backed store.
//!
//! Each record is a `<key>.json` file in one directory. Writes go to a
//! temporary sibling first and are renamed into place.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StoreError};

/// A [`KeyValueStore`] keeping one file per record.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    description: String,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let description = format!("file store: {}", dir.display());
        Self { dir, description }
    }

    /// Returns the directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Human-readable description, for logs.
    pub fn description(&self) -> &str {
        &self.description
    }

    fn record_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.record_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.record_path(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
