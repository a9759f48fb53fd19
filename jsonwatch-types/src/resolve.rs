//! Resolution of a [`PathAddress`] against a document.

use serde_json::Value;

use crate::{PathAddress, PathKey};

/// Outcome of resolving an address against a document.
///
/// `Absent` is an ordinary result: the document simply does not have a node
/// at that address this time (schema drift, an error payload, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// The node found at the address.
    Present(&'a Value),
    /// The walk stopped at key number `depth` (zero-based).
    Absent {
        /// Index of the first key that could not be followed.
        depth: usize,
    },
}

impl<'a> Resolved<'a> {
    /// The resolved value, if present.
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Resolved::Present(value) => Some(value),
            Resolved::Absent { .. } => None,
        }
    }

    /// Check whether a value was found.
    pub fn is_present(&self) -> bool {
        matches!(self, Resolved::Present(_))
    }

    /// Check whether the address is missing from the document.
    pub fn is_absent(&self) -> bool {
        !self.is_present()
    }
}

/// Walk `address` down from the root of `document`.
///
/// Names only index objects and indices only index arrays; there is no
/// coercion between the two. A `null` leaf counts as present.
///
/// # Example
///
/// ```rust
/// use jsonwatch_types::{resolve, PathAddress, Resolved};
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": 7}});
/// let found = resolve(&doc, &PathAddress::from_token("a.b"));
/// assert_eq!(found.value(), Some(&json!(7)));
///
/// let missing = resolve(&doc, &PathAddress::from_token("a.c"));
/// assert_eq!(missing, Resolved::Absent { depth: 1 });
/// ```
pub fn resolve<'a>(document: &'a Value, address: &PathAddress) -> Resolved<'a> {
    let mut current = document;

    for (depth, key) in address.keys().iter().enumerate() {
        let next = match (current, key) {
            (Value::Object(members), PathKey::Name(name)) => members.get(name),
            (Value::Array(items), PathKey::Index(index)) => items.get(*index),
            _ => None,
        };

        match next {
            Some(value) => current = value,
            None => return Resolved::Absent { depth },
        }
    }

    Resolved::Present(current)
}
