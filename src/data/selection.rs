//! The set of tracked paths.

use std::collections::BTreeSet;

use jsonwatch_types::PathAddress;

/// Paths the sampler resolves on every cycle.
///
/// Membership is by canonical address, so `root.a.b` and `a.b` loaded from
/// storage collapse into a single entry. No operation here can fail: tokens
/// that do not match anything in future documents simply resolve as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: BTreeSet<PathAddress>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from stored tokens.
    pub fn load<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: tokens
                .into_iter()
                .map(|token| PathAddress::from_token(token.as_ref()))
                .collect(),
        }
    }

    /// Parse the persisted form, a JSON array of tokens.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let tokens: Vec<String> = serde_json::from_str(raw)?;
        Ok(Self::load(tokens))
    }

    /// The persisted form, a JSON array of tokens.
    pub fn to_json(&self) -> String {
        serde_json::Value::from(self.snapshot()).to_string()
    }

    /// Tokens for every tracked path, in canonical order.
    pub fn snapshot(&self) -> Vec<String> {
        self.paths.iter().map(PathAddress::to_token).collect()
    }

    /// Select `address` if it is not tracked, deselect it if it is.
    ///
    /// Returns whether the path is tracked afterwards.
    pub fn toggle(&mut self, address: PathAddress) -> bool {
        if self.paths.remove(&address) {
            false
        } else {
            self.paths.insert(address);
            true
        }
    }

    /// Track `address`. Returns false if it already was.
    pub fn insert(&mut self, address: PathAddress) -> bool {
        self.paths.insert(address)
    }

    /// Stop tracking `address`. Returns false if it was not tracked.
    pub fn remove(&mut self, address: &PathAddress) -> bool {
        self.paths.remove(address)
    }

    /// Check whether `address` is tracked.
    pub fn contains(&self, address: &PathAddress) -> bool {
        self.paths.contains(address)
    }

    /// All tracked paths.
    pub fn all(&self) -> &BTreeSet<PathAddress> {
        &self.paths
    }

    /// Iterate over tracked paths.
    pub fn iter(&self) -> impl Iterator<Item = &PathAddress> {
        self.paths.iter()
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(token: &str) -> PathAddress {
        PathAddress::from_token(token)
    }

    #[test]
    fn test_toggle_twice_from_absent() {
        let mut selection = SelectionSet::new();

        assert!(selection.toggle(at("a.b")));
        assert!(selection.contains(&at("a.b")));

        assert!(!selection.toggle(at("a.b")));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_twice_from_present() {
        let mut selection = SelectionSet::load(["a.b", "c"]);
        let before = selection.clone();

        selection.toggle(at("a.b"));
        assert!(!selection.contains(&at("a.b")));
        selection.toggle(at("a.b"));

        assert_eq!(selection, before);
    }

    #[test]
    fn test_load_deduplicates_canonical_paths() {
        let selection = SelectionSet::load(["root.a.b", "a.b", "a.b"]);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.snapshot(), vec!["a.b".to_string()]);
    }

    #[test]
    fn test_load_accepts_opaque_tokens() {
        let selection = SelectionSet::load(["", "weird\\token..", "0.1.2"]);
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut selection = SelectionSet::load(["x"]);
        assert!(!selection.remove(&at("y")));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_json_persisted_form() {
        let selection = SelectionSet::load(["b", "a.0"]);
        let json = selection.to_json();
        assert_eq!(json, r#"["a.0","b"]"#);

        assert_eq!(SelectionSet::from_json(&json).unwrap(), selection);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(SelectionSet::from_json(r#"{"a": 1}"#).is_err());
        assert!(SelectionSet::from_json("not json").is_err());
    }
}
