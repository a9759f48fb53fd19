//! # jsonwatch-types
//!
//! Core types for tracking fields of a polled JSON document.
//!
//! - [`PathAddress`]: a location inside a document, with a reversible
//!   flat token form for storage and display
//! - [`resolve`]: walk an address down a document, yielding
//!   [`Resolved::Absent`] when the node is not there
//! - [`Observation`]: one sampled value, its capture time and its
//!   normalized value
//!
//! ## Example
//!
//! ```rust
//! use jsonwatch_types::{resolve, Observation, PathAddress};
//! use serde_json::json;
//!
//! let doc = json!({"weather": {"temp": 21.5}});
//! let address: PathAddress = "weather.temp".parse().unwrap();
//!
//! if let Some(value) = resolve(&doc, &address).value() {
//!     let observation = Observation::new(value.clone());
//!     assert_eq!(observation.numeric_value(), Some(21.5));
//! }
//! ```

mod observation;
mod path;
mod resolve;
mod version;

pub use observation::*;
pub use path::*;
pub use resolve::*;
pub use version::*;

/// Current schema version of persisted series records.
pub const SCHEMA_VERSION: u32 = 1;
