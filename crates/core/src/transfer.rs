//! Transfer of the resource cache between execution contexts.
//!
//! The producer side serializes every cached entry into one JSON object
//! (`{"<identifier>": <value>, ...}`); the consumer side merges that object
//! back into its own store before anything renders.

use serde_json::{Map, Value};

use crate::cache::Store;
use crate::error::TransferParseError;

impl Store {
    /// Encodes every cached entry as a JSON object with sorted keys.
    pub fn serialize(&self) -> String {
        let state = self.lock();
        let map: Map<String, Value> = state
            .resources
            .entries()
            .map(|(id, value)| (id.to_owned(), value.clone()))
            .collect();
        drop(state);

        Value::Object(map).to_string()
    }

    /// Parses `text` and merges its entries into the cache.
    ///
    /// Existing keys are overwritten, keys missing from `text` are kept. On
    /// error nothing is merged. Returns the number of merged entries.
    pub fn try_restore(&self, text: &str) -> Result<usize, TransferParseError> {
        let entries = match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => map,
            Value::Null => return Err(TransferParseError::NotAnObject("null")),
            Value::Bool(_) => return Err(TransferParseError::NotAnObject("boolean")),
            Value::Number(_) => return Err(TransferParseError::NotAnObject("number")),
            Value::String(_) => return Err(TransferParseError::NotAnObject("string")),
            Value::Array(_) => return Err(TransferParseError::NotAnObject("array")),
        };

        Ok(self.lock().resources.merge(entries))
    }

    /// Like [`Store::try_restore`], but never fails.
    ///
    /// A malformed transfer string is logged and otherwise ignored, leaving
    /// the cache as it was so fetches fall back to the network.
    pub fn restore(&self, text: &str) {
        match self.try_restore(text) {
            Ok(merged) => tracing::debug!(merged, "restored cache from transfer string"),
            Err(e) => tracing::error!(error = %e, "failed to initialize cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_empty() {
        assert_eq!(Store::new().serialize(), "{}");
    }

    #[test]
    fn test_serialize_sorted_keys() {
        let store = Store::new();
        {
            let mut state = store.lock();
            state.resources.set("/b", json!(2));
            state.resources.set("/a", json!([{"name": "Ann"}]));
        }
        assert_eq!(store.serialize(), r#"{"/a":[{"name":"Ann"}],"/b":2}"#);
    }

    #[test]
    fn test_round_trip_into_fresh_store() {
        let source = Store::new();
        {
            let mut state = source.lock();
            state.resources.set("/people", json!([{"name": "Ann"}, {"name": "Bo"}]));
            state.resources.set("/flag", json!(false));
            state.resources.set("/nothing", Value::Null);
            state.resources.set("/nested", json!({"a": {"b": [1, 2.5, "c"]}}));
        }

        let target = Store::new();
        target.restore(&source.serialize());

        assert_eq!(target.len(), 4);
        for id in ["/people", "/flag", "/nothing", "/nested"] {
            assert_eq!(target.cached(id), source.cached(id), "mismatch for {id}");
        }
    }

    #[test]
    fn test_restore_is_additive() {
        let store = Store::new();
        store.lock().resources.set("B", json!("b"));

        store.restore(r#"{"A":"a"}"#);

        assert_eq!(store.cached("A"), Some(json!("a")));
        assert_eq!(store.cached("B"), Some(json!("b")));
    }

    #[test]
    fn test_restore_overwrites_existing() {
        let store = Store::new();
        store.lock().resources.set("A", json!("old"));

        assert_eq!(store.try_restore(r#"{"A":"new"}"#).unwrap(), 1);
        assert_eq!(store.cached("A"), Some(json!("new")));
    }

    #[test]
    fn test_restore_invalid_json_is_contained() {
        let store = Store::new();
        store.restore("not valid json");
        assert!(store.is_empty());
    }

    #[test]
    fn test_restore_empty_string_is_contained() {
        let store = Store::new();
        store.restore("");
        assert!(store.is_empty());
    }

    #[test]
    fn test_try_restore_reports_malformed() {
        let store = Store::new();
        let result = store.try_restore("{\"a\":");
        assert!(matches!(result, Err(TransferParseError::Malformed(_))));
    }

    #[test]
    fn test_try_restore_rejects_non_object() {
        let store = Store::new();
        assert!(matches!(store.try_restore("[1,2]"), Err(TransferParseError::NotAnObject("array"))));
        assert!(matches!(store.try_restore("null"), Err(TransferParseError::NotAnObject("null"))));
        assert!(matches!(store.try_restore("\"x\""), Err(TransferParseError::NotAnObject("string"))));
        assert!(store.is_empty());
    }
}
