//! One poll cycle: fetch, resolve, append, normalize, persist.
//!
//! The [`Sampler`] owns the tracked-path selection and the series store
//! behind a single mutex. Every mutation, whether from a cycle or from a
//! user action, happens under that lock and persists before releasing it,
//! so writes to the store are whole-snapshot replacements in lock order.
//! The lock is never held across the fetch.

use std::sync::Arc;

use jsonwatch_adapters::{FetchError, Fetcher};
use jsonwatch_types::{current_timestamp_ms, resolve, Observation, PathAddress, Resolved};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::data::{SelectionSet, SeriesStore};
use crate::store::{KeyValueStore, SELECTION_KEY, SERIES_KEY};

/// Tracked paths, accumulated series and the most recent document.
#[derive(Debug, Default)]
pub struct TrackerState {
    pub selection: SelectionSet,
    pub series: SeriesStore,
    /// The last fetched document, or the error document of a failed fetch.
    pub last_document: Option<Value>,
    /// Message of the last failed persistence write, cleared on success.
    pub persist_warning: Option<String>,
}

/// What a single cycle did.
#[derive(Debug)]
pub struct CycleReport {
    /// Unix timestamp in milliseconds when the cycle started.
    pub started_at_ms: u64,
    /// The URL the document was requested from.
    pub url: String,
    /// The fetched document, or `{"error": "..."}` if the fetch failed.
    pub document: Value,
    /// Why the fetch failed, if it did.
    pub fetch_error: Option<FetchError>,
    /// Paths that received a new observation.
    pub appended: Vec<PathAddress>,
    /// Selected paths missing from the document.
    pub absent: Vec<PathAddress>,
    /// Persistence failure, if the state could not be written.
    pub persist_error: Option<String>,
}

impl CycleReport {
    /// Check if the document was fetched.
    pub fn is_success(&self) -> bool {
        self.fetch_error.is_none()
    }
}

/// Build the document shown in place of a failed fetch.
pub fn error_document(err: &FetchError) -> Value {
    json!({ "error": err.to_string() })
}

#[derive(Debug, Clone, Copy)]
enum Records {
    Selection,
    Both,
}

/// Samples tracked paths from a polled document.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use jsonwatch::{FileStore, Sampler};
/// use jsonwatch_adapters::RoutingFetcher;
///
/// # tokio_test::block_on(async {
/// let sampler = Sampler::open(
///     "http://numbersapi.com/random/math?json",
///     Arc::new(RoutingFetcher::new().unwrap()),
///     Arc::new(FileStore::new(".jsonwatch")),
/// );
/// sampler.select("number".parse().unwrap());
///
/// let report = sampler.run_cycle().await;
/// println!("appended {} observations", report.appended.len());
/// # });
/// ```
#[derive(Debug)]
pub struct Sampler {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn KeyValueStore>,
    url: RwLock<String>,
    state: Mutex<TrackerState>,
}

impl Sampler {
    /// Create a sampler with empty state. Nothing is read from `store`.
    pub fn new(
        url: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            fetcher,
            store,
            url: RwLock::new(url.into()),
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Create a sampler and restore selection and series from `store`.
    ///
    /// Missing records start empty. Unreadable or corrupt records are
    /// logged and also start empty; they are overwritten on the next write.
    pub fn open(
        url: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let sampler = Self::new(url, fetcher, store);
        {
            let mut state = sampler.state.lock();
            state.selection = sampler.restore_selection();
            state.series = sampler.restore_series();
            debug!(
                selected = state.selection.len(),
                series = state.series.len(),
                "restored state"
            );
        }
        sampler
    }

    fn restore_selection(&self) -> SelectionSet {
        match self.store.get(SELECTION_KEY) {
            Ok(Some(raw)) => SelectionSet::from_json(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring corrupt selection record");
                SelectionSet::new()
            }),
            Ok(None) => SelectionSet::new(),
            Err(e) => {
                warn!(error = %e, "could not read selection record");
                SelectionSet::new()
            }
        }
    }

    fn restore_series(&self) -> SeriesStore {
        match self.store.get(SERIES_KEY) {
            Ok(Some(raw)) => SeriesStore::from_json(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring corrupt series record");
                SeriesStore::new()
            }),
            Ok(None) => SeriesStore::new(),
            Err(e) => {
                warn!(error = %e, "could not read series record");
                SeriesStore::new()
            }
        }
    }

    /// The URL polled by the next cycle.
    pub fn url(&self) -> String {
        self.url.read().clone()
    }

    /// Change the polled URL. Takes effect from the next cycle.
    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.write() = url.into();
    }

    /// Toggle tracking of `address`. Returns whether it is tracked afterwards.
    ///
    /// Deselecting keeps the accumulated series.
    pub fn toggle(&self, address: PathAddress) -> bool {
        let mut state = self.state.lock();
        let selected = state.selection.toggle(address);
        self.persist(&mut state, Records::Selection);
        selected
    }

    /// Start tracking `address`. Returns false if it already was.
    pub fn select(&self, address: PathAddress) -> bool {
        let mut state = self.state.lock();
        let changed = state.selection.insert(address);
        if changed {
            self.persist(&mut state, Records::Selection);
        }
        changed
    }

    /// Stop tracking `address`, keeping its series. Returns false if it was not tracked.
    pub fn deselect(&self, address: &PathAddress) -> bool {
        let mut state = self.state.lock();
        let changed = state.selection.remove(address);
        if changed {
            self.persist(&mut state, Records::Selection);
        }
        changed
    }

    /// Drop the series for `address` and stop tracking it.
    ///
    /// Returns false if there was neither a series nor a selection.
    pub fn delete_path(&self, address: &PathAddress) -> bool {
        let mut state = self.state.lock();
        let had_series = state.series.remove(address).is_some();
        let was_selected = state.selection.remove(address);
        self.persist(&mut state, Records::Both);
        had_series || was_selected
    }

    /// Observations for `address`, most recent first, as pretty JSON.
    pub fn export(&self, address: &PathAddress) -> Result<Option<String>, serde_json::Error> {
        self.state.lock().series.export(address)
    }

    /// Tracked paths.
    pub fn selection(&self) -> Vec<PathAddress> {
        self.state.lock().selection.iter().cloned().collect()
    }

    /// A copy of all accumulated series.
    pub fn series(&self) -> SeriesStore {
        self.state.lock().series.clone()
    }

    /// The most recent document, if any cycle has run.
    pub fn last_document(&self) -> Option<Value> {
        self.state.lock().last_document.clone()
    }

    /// The last persistence failure, if the latest write failed.
    pub fn persist_warning(&self) -> Option<String> {
        self.state.lock().persist_warning.clone()
    }

    /// Run `f` with shared access to the whole state.
    pub fn with_state<R>(&self, f: impl FnOnce(&TrackerState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Run one cycle.
    ///
    /// Only paths selected when the cycle starts are sampled. A failed fetch
    /// yields an error document, appends nothing and persists nothing.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at_ms = current_timestamp_ms();
        let url = self.url();
        let selected: Vec<PathAddress> = self.selection();

        debug!(url = %url, paths = selected.len(), "starting cycle");
        let fetched = self.fetcher.fetch(&url).await;

        let mut state = self.state.lock();
        let document = match fetched {
            Ok(document) => document,
            Err(err) => {
                warn!(url = %url, error = %err, "fetch failed");
                let document = error_document(&err);
                state.last_document = Some(document.clone());
                return CycleReport {
                    started_at_ms,
                    url,
                    document,
                    fetch_error: Some(err),
                    appended: Vec::new(),
                    absent: Vec::new(),
                    persist_error: None,
                };
            }
        };

        let timestamp_ms = current_timestamp_ms();
        let mut appended = Vec::new();
        let mut absent = Vec::new();

        for path in selected {
            match resolve(&document, &path) {
                Resolved::Present(value) => {
                    let len = state
                        .series
                        .append(&path, Observation::with_timestamp(timestamp_ms, value.clone()));
                    debug!(path = %path, len, "appended observation");
                    appended.push(path);
                }
                Resolved::Absent { depth } => {
                    debug!(path = %path, depth, "path absent");
                    absent.push(path);
                }
            }
        }

        for path in &appended {
            state.series.normalize(path);
        }

        let persist_error = self.persist(&mut state, Records::Both);
        state.last_document = Some(document.clone());

        CycleReport {
            started_at_ms,
            url,
            document,
            fetch_error: None,
            appended,
            absent,
            persist_error,
        }
    }

    fn persist(&self, state: &mut TrackerState, records: Records) -> Option<String> {
        let result = match records {
            Records::Selection => self.write_selection(state),
            Records::Both => self
                .write_selection(state)
                .and_then(|()| self.write_series(state)),
        };

        match result {
            Ok(()) => {
                state.persist_warning = None;
                None
            }
            Err(message) => {
                warn!(error = %message, "could not persist state; keeping in-memory copy");
                state.persist_warning = Some(message.clone());
                Some(message)
            }
        }
    }

    fn write_selection(&self, state: &TrackerState) -> Result<(), String> {
        self.store
            .set(SELECTION_KEY, &state.selection.to_json())
            .map_err(|e| e.to_string())
    }

    fn write_series(&self, state: &TrackerState) -> Result<(), String> {
        let json = state.series.to_json().map_err(|e| e.to_string())?;
        self.store.set(SERIES_KEY, &json).map_err(|e| e.to_string())
    }
}
