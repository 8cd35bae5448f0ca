use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Shared keyed state for one run.
///
/// Nodes read their declared input keys from this map and return output
/// deltas that the engine merges back under their declared output keys.
/// The map is owned exclusively by its run: nodes never hold a reference
/// to it, they only see per-attempt snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    data: HashMap<String, serde_json::Value>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RunState seeded with initial values.
    pub fn from_map(data: HashMap<String, serde_json::Value>) -> Self {
        Self { data }
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Set a value.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Merge a delta into this state (overwrites on conflict, so the last
    /// write wins across sequentially executed nodes).
    pub fn merge(&mut self, delta: HashMap<String, serde_json::Value>) {
        self.data.extend(delta);
    }

    /// Clone the values for the given keys, in order.
    ///
    /// Returns `Err` with the first absent key so callers can report
    /// which input was missing.
    pub fn restrict(&self, keys: &[String]) -> Result<HashMap<String, serde_json::Value>, String> {
        let mut out = HashMap::with_capacity(keys.len());
        for key in keys {
            match self.data.get(key) {
                Some(value) => {
                    out.insert(key.clone(), value.clone());
                }
                None => return Err(key.clone()),
            }
        }
        Ok(out)
    }

    /// Consume the state, returning the underlying map.
    pub fn into_map(self) -> HashMap<String, serde_json::Value> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut state = RunState::new();
        state.set("name", serde_json::json!("Alice"));
        state.set("count", serde_json::json!(42));

        assert_eq!(state.get("name"), Some(&serde_json::json!("Alice")));
        assert_eq!(state.get("count"), Some(&serde_json::json!(42)));
        assert_eq!(state.get("missing"), None);
    }

    #[test]
    fn test_merge_overwrites_on_conflict() {
        let mut state = RunState::new();
        state.set("a", serde_json::json!("1"));
        state.set("b", serde_json::json!("2"));

        let mut delta = HashMap::new();
        delta.insert("b".to_string(), serde_json::json!("overwritten"));
        delta.insert("c".to_string(), serde_json::json!("3"));
        state.merge(delta);

        assert_eq!(state.get("a"), Some(&serde_json::json!("1")));
        assert_eq!(state.get("b"), Some(&serde_json::json!("overwritten")));
        assert_eq!(state.get("c"), Some(&serde_json::json!("3")));
    }

    #[test]
    fn test_restrict_returns_requested_keys() {
        let mut state = RunState::new();
        state.set("topic", serde_json::json!("async Rust"));
        state.set("style", serde_json::json!("tutorial"));
        state.set("unrelated", serde_json::json!("ignored"));

        let snapshot = state
            .restrict(&["topic".to_string(), "style".to_string()])
            .unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["topic"], serde_json::json!("async Rust"));
        assert!(!snapshot.contains_key("unrelated"));
    }

    #[test]
    fn test_restrict_reports_missing_key() {
        let state = RunState::new();
        let err = state.restrict(&["absent".to_string()]).unwrap_err();
        assert_eq!(err, "absent");
    }

    #[test]
    fn test_from_map_and_into_map() {
        let mut map = HashMap::new();
        map.insert("topic".to_string(), serde_json::json!("AI"));
        let state = RunState::from_map(map);
        assert_eq!(state.get("topic"), Some(&serde_json::json!("AI")));

        let map = state.into_map();
        assert_eq!(map.len(), 1);
    }
}
