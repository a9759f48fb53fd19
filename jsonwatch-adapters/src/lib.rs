//! # jsonwatch-adapters
//!
//! Fetchers that turn a URL into a parsed JSON document.
//!
//! ## Supported Sources
//!
//! - **HTTP/HTTPS** (`http` feature, on by default) - [`http::HttpFetcher`]
//! - **Local files** - [`FileFetcher`], for `file://` URLs
//!
//! [`RoutingFetcher`] picks between them by URL scheme.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jsonwatch_adapters::{Fetcher, RoutingFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = RoutingFetcher::new()?;
//!     let doc = fetcher.fetch("http://numbersapi.com/random/math?json").await?;
//!     println!("{}", doc["number"]);
//!     Ok(())
//! }
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub mod error;
mod file;

#[cfg(feature = "http")]
pub mod http;

pub use error::FetchError;
pub use file::{FileFetcher, FILE_SCHEME};

/// Something that can fetch a JSON document for a URL.
///
/// Any failure - transport error, non-success status, unparseable body -
/// is reported as a [`FetchError`]; callers decide how to recover.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Fetch and parse the document at `url`.
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        (**self).fetch(url).await
    }
}

/// Dispatches to a file or HTTP fetcher based on the URL scheme.
#[derive(Debug, Clone)]
pub struct RoutingFetcher {
    file: FileFetcher,
    #[cfg(feature = "http")]
    http: http::HttpFetcher,
}

impl RoutingFetcher {
    /// Create a routing fetcher with default sub-fetchers.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            file: FileFetcher::new(),
            #[cfg(feature = "http")]
            http: http::HttpFetcher::new()?,
        })
    }

    /// Use a preconfigured HTTP fetcher.
    #[cfg(feature = "http")]
    pub fn with_http(http: http::HttpFetcher) -> Self {
        Self {
            file: FileFetcher::new(),
            http,
        }
    }
}

#[async_trait]
impl Fetcher for RoutingFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        if url.starts_with(FILE_SCHEME) {
            return self.file.fetch(url).await;
        }

        #[cfg(feature = "http")]
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.http.fetch(url).await;
        }

        Err(FetchError::Unsupported(url.to_string()))
    }
}
