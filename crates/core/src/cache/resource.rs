//! Identifier → value map backing the resource cache.

use std::collections::HashMap;

use serde_json::Value;

/// Decoded fetch results keyed by identifier.
///
/// No eviction, no TTL, no size bound. A cached `null`, `0`, `false` or `""`
/// is a hit; only a missing key is a miss.
#[derive(Debug, Clone, Default)]
pub struct ResourceCache {
    entries: HashMap<String, Value>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached value, or `None` when nothing is cached.
    pub fn get(&self, id: &str) -> Option<Value> {
        self.entries.get(id).cloned()
    }

    /// Inserts or overwrites the value for `id`.
    pub fn set(&mut self, id: impl Into<String>, value: Value) {
        self.entries.insert(id.into(), value);
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over every cached entry in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges `entries` into the cache, overwriting keys that already exist.
    ///
    /// Keys not present in `entries` are left untouched. Returns how many
    /// entries were written.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = (String, Value)>) -> usize {
        let mut merged = 0;
        for (id, value) in entries {
            self.entries.insert(id, value);
            merged += 1;
        }
        merged
    }
}
