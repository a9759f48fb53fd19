//! Fetchers and stores for exercising the sampler and scheduler.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use jsonwatch_adapters::{FetchError, Fetcher};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};

use crate::store::{KeyValueStore, StoreError};

/// Replays queued responses, then keeps returning `fallback`.
#[derive(Debug)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Value, FetchError>>>,
    fallback: Value,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<Value, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: Value::Null,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn documents(documents: Vec<Value>) -> Self {
        Self::new(documents.into_iter().map(Ok).collect())
    }

    pub fn always(document: Value) -> Self {
        Self {
            fallback: document,
            ..Self::new(Vec::new())
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().len()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        self.urls.lock().push(url.to_string());
        let next = self.responses.lock().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Blocks every fetch until the test releases it.
#[derive(Debug)]
pub struct GateFetcher {
    document: Value,
    entered: mpsc::UnboundedSender<()>,
    release: Semaphore,
    calls: AtomicUsize,
}

impl GateFetcher {
    /// Returns the fetcher and a receiver that yields once per fetch started.
    pub fn new(document: Value) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (entered, rx) = mpsc::unbounded_channel();
        let fetcher = Self {
            document,
            entered,
            release: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        };
        (fetcher, rx)
    }

    /// Let one blocked fetch complete.
    pub fn release_one(&self) {
        self.release.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for GateFetcher {
    async fn fetch(&self, _url: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.entered.send(());
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
        Ok(self.document.clone())
    }
}

/// Takes `delay` per fetch and records how many fetches overlapped.
#[derive(Debug)]
pub struct SlowFetcher {
    document: Value,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowFetcher {
    pub fn new(document: Value, delay: Duration) -> Self {
        Self {
            document,
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for SlowFetcher {
    async fn fetch(&self, _url: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.document.clone())
    }
}

/// A store whose writes always fail and whose reads return nothing.
#[derive(Debug, Default)]
pub struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "store is read-only",
        )))
    }
}
