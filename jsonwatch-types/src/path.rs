//! Path addresses - stable locations inside a dynamically-shaped JSON document.
//!
//! A [`PathAddress`] is an ordered list of keys describing a descent from the
//! document root. Its canonical identity is the key list itself; the flat
//! token form (`a.b.0.c`) exists for storage and display.
//!
//! ## Token grammar
//!
//! ```text
//! token    := "" | segment ("." segment)*
//! segment  := ["\:"] (char | "\." | "\\")*
//! ```
//!
//! - An all-digit segment is an array index; `\:` forces a member name.
//! - `\.` and `\\` are a literal dot and backslash inside a name.
//! - A bare leading `root` segment is the marker tree widgets put in front
//!   of every path and is dropped.
//! - Any other backslash is kept as-is, so every string decodes.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Leading segment that tree widgets use for the document root.
pub const ROOT_MARKER: &str = "root";

/// A single step in a [`PathAddress`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathKey {
    /// Member name of an object.
    Name(String),
    /// Position in an array.
    Index(usize),
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        PathKey::Name(name.to_string())
    }
}

impl From<String> for PathKey {
    fn from(name: String) -> Self {
        PathKey::Name(name)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Name(name) => f.write_str(name),
            PathKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Location of a node inside a JSON document.
///
/// The empty address is the document root.
///
/// # Example
///
/// ```rust
/// use jsonwatch_types::{PathAddress, PathKey};
///
/// let address = PathAddress::root().child("items").child(0usize).child("price");
/// assert_eq!(address.to_token(), "items.0.price");
///
/// let parsed: PathAddress = "items.0.price".parse().unwrap();
/// assert_eq!(parsed, address);
/// assert_eq!(parsed.keys()[1], PathKey::Index(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathAddress {
    keys: Vec<PathKey>,
}

impl PathAddress {
    /// The address of the document itself.
    pub fn root() -> Self {
        Self { keys: Vec::new() }
    }

    /// Create an address from an explicit key list.
    pub fn new(keys: Vec<PathKey>) -> Self {
        Self { keys }
    }

    /// The keys of this address, outermost first.
    pub fn keys(&self) -> &[PathKey] {
        &self.keys
    }

    /// Whether this address points at the document root.
    pub fn is_root(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of keys in the address.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Same as [`is_root`](Self::is_root).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// A new address one level below this one.
    pub fn child(&self, key: impl Into<PathKey>) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key.into());
        Self { keys }
    }

    /// Encode the address as a flat token.
    pub fn to_token(&self) -> String {
        let mut out = String::new();
        for (position, key) in self.keys.iter().enumerate() {
            if position > 0 {
                out.push('.');
            }
            match key {
                PathKey::Index(index) => out.push_str(&index.to_string()),
                PathKey::Name(name) => encode_name(name, position == 0, &mut out),
            }
        }
        out
    }

    /// Decode a flat token. Never fails; unknown shapes become member names.
    pub fn from_token(token: &str) -> Self {
        if token.is_empty() {
            return Self::root();
        }

        let mut segments: Vec<(String, bool)> = Vec::new();
        let mut segment = String::new();
        // A segment is "bare" until an escape or a name marker touches it.
        let mut bare = true;
        let mut chars = token.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.peek().copied() {
                    Some(next @ ('.' | '\\')) => {
                        chars.next();
                        segment.push(next);
                        bare = false;
                    }
                    Some(':') if segment.is_empty() && bare => {
                        chars.next();
                        bare = false;
                    }
                    _ => segment.push('\\'),
                },
                '.' => {
                    segments.push((std::mem::take(&mut segment), bare));
                    bare = true;
                }
                c => segment.push(c),
            }
        }
        segments.push((segment, bare));

        let mut iter = segments.into_iter().peekable();
        if matches!(iter.peek(), Some((name, true)) if name == ROOT_MARKER) {
            iter.next();
        }

        let keys = iter
            .map(|(segment, bare)| {
                if bare && is_index(&segment) {
                    if let Ok(index) = segment.parse::<usize>() {
                        return PathKey::Index(index);
                    }
                }
                PathKey::Name(segment)
            })
            .collect();

        Self { keys }
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn encode_name(name: &str, leading: bool, out: &mut String) {
    if name.is_empty() || is_index(name) || (leading && name == ROOT_MARKER) {
        out.push_str("\\:");
    }
    for c in name.chars() {
        match c {
            '.' => out.push_str("\\."),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
}

impl From<Vec<PathKey>> for PathAddress {
    fn from(keys: Vec<PathKey>) -> Self {
        Self::new(keys)
    }
}

impl FromIterator<PathKey> for PathAddress {
    fn from_iter<I: IntoIterator<Item = PathKey>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FromStr for PathAddress {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_token(token))
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_token())
    }
}

impl Serialize for PathAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_token())
    }
}

impl<'de> Deserialize<'de> for PathAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::from_token(&token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PathKey {
        PathKey::Name(s.to_string())
    }

    #[test]
    fn test_root_is_empty_token() {
        assert_eq!(PathAddress::root().to_token(), "");
        assert!(PathAddress::from_token("").is_root());
    }

    #[test]
    fn test_dot_joined_token() {
        let address = PathAddress::new(vec![name("a"), name("b")]);
        assert_eq!(address.to_token(), "a.b");
        assert_eq!(PathAddress::from_token("a.b"), address);
    }

    #[test]
    fn test_digit_segments_are_indices() {
        let address = PathAddress::from_token("items.2.id");
        assert_eq!(address.keys(), &[name("items"), PathKey::Index(2), name("id")]);
    }

    #[test]
    fn test_legacy_root_marker_is_dropped() {
        assert_eq!(PathAddress::from_token("root.number"), PathAddress::new(vec![name("number")]));
        assert!(PathAddress::from_token("root").is_root());
    }

    #[test]
    fn test_root_name_below_top_level_is_kept() {
        let address = PathAddress::from_token("tree.root");
        assert_eq!(address.keys(), &[name("tree"), name("root")]);
    }

    #[test]
    fn test_member_literally_named_root_survives() {
        let address = PathAddress::new(vec![name("root"), name("x")]);
        let token = address.to_token();
        assert_eq!(token, "\\:root.x");
        assert_eq!(PathAddress::from_token(&token), address);
    }

    #[test]
    fn test_numeric_member_name_is_not_an_index() {
        let address = PathAddress::new(vec![name("scores"), name("42")]);
        let token = address.to_token();
        assert_eq!(token, "scores.\\:42");
        assert_eq!(PathAddress::from_token(&token), address);
    }

    #[test]
    fn test_dots_and_backslashes_in_names() {
        let address = PathAddress::new(vec![name("host.name"), name("C:\\temp")]);
        let token = address.to_token();
        assert_eq!(token, "host\\.name.C:\\\\temp");
        assert_eq!(PathAddress::from_token(&token), address);
    }

    #[test]
    fn test_empty_member_name() {
        let address = PathAddress::new(vec![name("")]);
        assert_eq!(address.to_token(), "\\:");
        assert_eq!(PathAddress::from_token("\\:"), address);
    }

    #[test]
    fn test_unknown_escape_is_kept_literally() {
        let address = PathAddress::from_token("a\\b.c\\");
        assert_eq!(address.keys(), &[name("a\\b"), name("c\\")]);
    }

    #[test]
    fn test_oversized_index_decodes_as_name() {
        let token = "99999999999999999999999999";
        let address = PathAddress::from_token(token);
        assert_eq!(address.keys(), &[name(token)]);
        assert_eq!(PathAddress::from_token(&address.to_token()), address);
    }

    #[test]
    fn test_child_builds_nested_address() {
        let address = PathAddress::root().child("a").child(3usize);
        assert_eq!(address.len(), 2);
        assert_eq!(address.to_string(), "a.3");
    }

    #[test]
    fn test_serializes_as_token_string() {
        let address = PathAddress::from_token("a.b");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"a.b\"");

        let parsed: PathAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, address);
    }
}
