//! Append-only series of observations, one per tracked path.

use std::collections::BTreeMap;

use jsonwatch_types::{Observation, PathAddress, SchemaVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chronological observations of a single path.
///
/// Observations are only ever appended. The one field that changes after
/// an append is [`Observation::normalized`], rewritten by [`Series::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Observation>", into = "Vec<Observation>")]
pub struct Series {
    observations: Vec<Observation>,
    /// Set by appends; cleared by normalization.
    stale: bool,
}

impl From<Vec<Observation>> for Series {
    fn from(observations: Vec<Observation>) -> Self {
        Self {
            observations,
            stale: true,
        }
    }
}

impl From<Series> for Vec<Observation> {
    fn from(series: Series) -> Self {
        series.observations
    }
}

impl Series {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observations in append order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The most recent observation.
    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Whether an append happened since the last normalization.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Append an observation at the end.
    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
        self.stale = true;
    }

    /// Largest finite numeric value in the series.
    pub fn max_numeric(&self) -> Option<f64> {
        self.observations
            .iter()
            .filter_map(Observation::numeric_value)
            .fold(None, |max, value| Some(max.map_or(value, |m: f64| m.max(value))))
    }

    /// Recompute `normalized` for every observation.
    ///
    /// Numeric observations become `value / max`. When the series holds no
    /// numeric value, or its maximum is zero or negative, every `normalized`
    /// is cleared. Non-numeric observations are always left unset.
    pub fn normalize(&mut self) {
        match self.max_numeric() {
            Some(max) if max > 0.0 => {
                for observation in &mut self.observations {
                    observation.normalized = observation.numeric_value().map(|v| v / max);
                }
            }
            _ => {
                for observation in &mut self.observations {
                    observation.normalized = None;
                }
            }
        }
        self.stale = false;
    }
}

/// Errors loading a persisted series snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Incompatible snapshot version {}.{}", .0.major, .0.minor)]
    IncompatibleVersion(SchemaVersion),
}

/// Persisted form of a [`SeriesStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    /// Schema version for forward compatibility.
    #[serde(default)]
    pub version: SchemaVersion,

    /// Series keyed by path token.
    pub series: BTreeMap<PathAddress, Series>,
}

/// All accumulated series, keyed by path.
///
/// May hold series for paths that are no longer selected: deselecting a
/// path keeps its history, only [`remove`](Self::remove) drops it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStore {
    series: BTreeMap<PathAddress, Series>,
}

impl SeriesStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `observation` to the series for `path`, creating it if new.
    ///
    /// Returns the new series length.
    pub fn append(&mut self, path: &PathAddress, observation: Observation) -> usize {
        let series = self.series.entry(path.clone()).or_default();
        series.push(observation);
        series.len()
    }

    /// Drop the whole series for `path`. Idempotent.
    pub fn remove(&mut self, path: &PathAddress) -> Option<Series> {
        self.series.remove(path)
    }

    /// Renormalize the series for `path`. Returns false if there is none.
    pub fn normalize(&mut self, path: &PathAddress) -> bool {
        match self.series.get_mut(path) {
            Some(series) => {
                series.normalize();
                true
            }
            None => false,
        }
    }

    /// Renormalize every series appended to since its last normalization.
    pub fn normalize_stale(&mut self) -> usize {
        let mut count = 0;
        for series in self.series.values_mut().filter(|s| s.is_stale()) {
            series.normalize();
            count += 1;
        }
        count
    }

    /// The series for `path`.
    pub fn get(&self, path: &PathAddress) -> Option<&Series> {
        self.series.get(path)
    }

    /// Iterate over all series in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathAddress, &Series)> {
        self.series.iter()
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Check if there are no series.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total observations across all series.
    pub fn total_observations(&self) -> usize {
        self.series.values().map(Series::len).sum()
    }

    /// Observations of one series, most recent first, as pretty JSON.
    ///
    /// Returns `Ok(None)` if the path has no series.
    pub fn export(&self, path: &PathAddress) -> Result<Option<String>, serde_json::Error> {
        let Some(series) = self.series.get(path) else {
            return Ok(None);
        };
        let newest_first: Vec<&Observation> = series.observations().iter().rev().collect();
        serde_json::to_string_pretty(&newest_first).map(Some)
    }

    /// Whole-store snapshot for persistence.
    pub fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            version: SchemaVersion::current(),
            series: self.series.clone(),
        }
    }

    /// Rebuild a store from a snapshot.
    pub fn load(snapshot: SeriesSnapshot) -> Result<Self, SnapshotError> {
        if !snapshot.version.is_compatible() {
            return Err(SnapshotError::IncompatibleVersion(snapshot.version));
        }
        Ok(Self {
            series: snapshot.series,
        })
    }

    /// Parse the persisted JSON form.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: SeriesSnapshot = serde_json::from_str(raw)?;
        Self::load(snapshot)
    }

    /// The persisted JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }
}
