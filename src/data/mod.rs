//! Tracked paths and the series accumulated for them.
//!
//! ## Submodules
//!
//! - [`selection`]: [`SelectionSet`], the paths resolved on every cycle
//! - [`series`]: [`Series`] and [`SeriesStore`], append-only observations
//!   with per-series normalization
//!
//! ## Data Flow
//!
//! ```text
//! document (serde_json::Value)
//!        │
//!        ▼
//! resolve(document, path)  for path in SelectionSet
//!        │
//!        ├──▶ Absent: skipped for this cycle
//!        │
//!        └──▶ SeriesStore::append() ──▶ SeriesStore::normalize()
//! ```

pub mod selection;
pub mod series;

pub use selection::SelectionSet;
pub use series::{Series, SeriesSnapshot, SeriesStore, SnapshotError};
