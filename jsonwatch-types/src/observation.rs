//! Observation - one sampled value of a tracked path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single sampled value with its capture time.
///
/// `value` is kept exactly as it appeared in the document. `normalized` is
/// filled in by series normalization and is the only field that changes
/// after the observation has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Unix timestamp in milliseconds when the value was captured.
    pub timestamp_ms: u64,

    /// The raw value found at the tracked path.
    pub value: Value,

    /// Value scaled into `[0, 1]` against the series maximum, if numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<f64>,
}

impl Observation {
    /// Create an observation stamped with the current time.
    pub fn new(value: Value) -> Self {
        Self::with_timestamp(current_timestamp_ms(), value)
    }

    /// Create an observation with a specific timestamp.
    pub fn with_timestamp(timestamp_ms: u64, value: Value) -> Self {
        Self {
            timestamp_ms,
            value,
            normalized: None,
        }
    }

    /// The raw value as a finite number, if it is one.
    pub fn numeric_value(&self) -> Option<f64> {
        numeric_value(&self.value)
    }
}

/// Interpret a JSON value as a finite number.
///
/// Numbers and strings holding a number (`"42"`, `" 3.5 "`) qualify;
/// everything else, and anything that parses to NaN or infinity, does not.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

/// Milliseconds since the Unix epoch.
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
