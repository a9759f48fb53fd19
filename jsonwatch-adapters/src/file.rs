//! Local file fetcher.
//!
//! Reads a JSON document from disk on every fetch. Handy for watching a
//! file another process rewrites, and for offline runs.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::{FetchError, Fetcher};

/// URL prefix accepted by [`FileFetcher`].
pub const FILE_SCHEME: &str = "file://";

/// Fetches documents from the local filesystem.
///
/// Accepts either a `file://` URL or a plain path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    /// Create a new file fetcher.
    pub fn new() -> Self {
        Self
    }

    fn path_of(url: &str) -> &Path {
        Path::new(url.strip_prefix(FILE_SCHEME).unwrap_or(url))
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let content = tokio::fs::read_to_string(Self::path_of(url))
            .await
            .map_err(|e| FetchError::Read(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| FetchError::Parse(e.to_string()))
    }
}
