//! Error types for fetchers.

use thiserror::Error;

/// Errors that can occur while fetching a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint answered with a non-success status.
    #[error("HTTP error! Status: {0}")]
    Status(u16),

    /// HTTP request failed before a status was received.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Reading a local document failed.
    #[error("Read error: {0}")]
    Read(String),

    /// The body was not valid JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The URL scheme has no fetcher.
    #[error("Unsupported URL: {0}")]
    Unsupported(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}
