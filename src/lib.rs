//! # jsonwatch
//!
//! Sample values out of a polled JSON document and keep them as
//! per-path time series.
//!
//! A document is fetched on a fixed period. Each tracked path is resolved
//! against it and, when present, its value is appended to that path's
//! series with a shared timestamp. Numeric series carry a normalized copy
//! of every value scaled by the series maximum. Tracked paths and series
//! survive restarts through a small key-value store.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          jsonwatch                             │
//! │  ┌───────────────┐   tick   ┌─────────────────────────────┐   │
//! │  │ PollScheduler │─────────▶│ Sampler                     │   │
//! │  └───────────────┘          │  ┌──────────┐ ┌───────────┐ │   │
//! │                             │  │Selection │ │SeriesStore│ │   │
//! │                             │  │   Set    │ │           │ │   │
//! │                             │  └──────────┘ └───────────┘ │   │
//! │                             └───────┬───────────────┬─────┘   │
//! │                                     │ fetch         │ persist │
//! │                                     ▼               ▼         │
//! │                          ┌──────────────┐  ┌──────────────┐   │
//! │                          │ Fetcher      │  │ KeyValueStore│   │
//! │                          │ (adapters)   │  │ File/Memory  │   │
//! │                          └──────────────┘  └──────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`data`]**: [`SelectionSet`] and [`SeriesStore`]
//! - **[`sampler`]**: one fetch-resolve-append-persist cycle
//! - **[`scheduler`]**: periodic, non-overlapping cycles
//! - **[`store`]**: the persistence port and its file and memory stores
//! - **[`settings`]**: layered configuration for the binary
//!
//! Path addressing and observations live in [`jsonwatch_types`]; fetching
//! lives in [`jsonwatch_adapters`].
//!
//! ## Usage
//!
//! ```bash
//! # Track a field and poll every 2 seconds
//! jsonwatch track number
//! jsonwatch --interval 2000 watch
//!
//! # Dump the series, newest first
//! jsonwatch export number
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use jsonwatch::{MemoryStore, Sampler};
//! use jsonwatch_adapters::RoutingFetcher;
//!
//! let sampler = Sampler::new(
//!     "file:///tmp/doc.json",
//!     Arc::new(RoutingFetcher::new().unwrap()),
//!     Arc::new(MemoryStore::new()),
//! );
//! assert!(sampler.toggle("stats.count".parse().unwrap()));
//! ```

pub mod data;
pub mod sampler;
pub mod scheduler;
pub mod settings;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use data::{SelectionSet, Series, SeriesSnapshot, SeriesStore, SnapshotError};
pub use sampler::{CycleReport, Sampler, TrackerState};
pub use scheduler::{PollScheduler, SchedulerState, MIN_PERIOD};
pub use settings::{Overrides, Settings};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

pub use jsonwatch_adapters::{FetchError, Fetcher, RoutingFetcher};
pub use jsonwatch_types::{Observation, PathAddress, PathKey, Resolved};
