//! HTTP fetcher built on `reqwest`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use jsonwatch_adapters::{http::HttpFetcher, Fetcher};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpFetcher::builder()
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let doc = fetcher.fetch("http://numbersapi.com/random/math?json").await?;
//!     println!("{}", doc);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{FetchError, Fetcher};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches documents with HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    /// Create a new builder for configuring the fetcher.
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(document)
    }
}

/// Builder for [`HttpFetcher`].
#[derive(Debug, Default)]
pub struct HttpFetcherBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HttpFetcherBuilder {
    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the fetcher.
    pub fn build(self) -> Result<HttpFetcher, FetchError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| concat!("jsonwatch/", env!("CARGO_PKG_VERSION")).to_string());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(HttpFetcher { client, timeout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and return the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/doc", addr)
    }

    #[test]
    fn test_builder_defaults() {
        let fetcher = HttpFetcher::builder().build().unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_builder_custom_timeout() {
        let fetcher = HttpFetcher::builder()
            .timeout(Duration::from_millis(250))
            .user_agent("test-agent")
            .build()
            .unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_fetch_parses_json_body() {
        let url = serve_once("HTTP/1.1 200 OK", r#"{"number": 42, "found": true}"#).await;
        let fetcher = HttpFetcher::new().unwrap();

        let doc = fetcher.fetch(&url).await.unwrap();
        assert_eq!(doc["number"], 42);
        assert_eq!(doc["found"], true);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable", "{}").await;
        let fetcher = HttpFetcher::new().unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let url = serve_once("HTTP/1.1 200 OK", "not json").await;
        let fetcher = HttpFetcher::new().unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&format!("http://{}/", addr)).await.unwrap_err();
        assert!(matches!(err, FetchError::Connection(_)));
    }
}
