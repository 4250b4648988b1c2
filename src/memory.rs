// Process-lifetime key/value store shared by every agent
//
// No persistence and no per-run isolation: concurrent runs writing the
// same key follow last-write-wins.

use crate::utils::lock_mutex_recover;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    store: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `key` with `value`
    pub fn add(&self, key: &str, value: Value) {
        lock_mutex_recover(&self.store).insert(key.to_string(), value);
    }

    /// Serialize and store. Serialization failure leaves the previous value intact.
    pub fn add_serialized<T: Serialize>(&self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.add(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        lock_mutex_recover(&self.store).get(key).cloned()
    }

    /// Append to the list at `key`. A missing or non-list value is replaced
    /// by a fresh list first.
    pub fn append(&self, key: &str, value: Value) {
        let mut store = lock_mutex_recover(&self.store);
        let entry = store
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(items) = entry {
            items.push(value);
        }
    }

    /// Items of the list at `key` satisfying `predicate`
    pub fn find<F>(&self, key: &str, predicate: F) -> Vec<Value>
    where
        F: Fn(&Value) -> bool,
    {
        let store = lock_mutex_recover(&self.store);
        match store.get(key) {
            Some(Value::Array(items)) => items.iter().filter(|v| predicate(v)).cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        lock_mutex_recover(&self.store).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_overwrites() {
        let memory = MemoryStore::new();
        memory.add("dataset", json!({"rows": []}));
        memory.add("dataset", json!({"rows": [1]}));
        assert_eq!(memory.get("dataset"), Some(json!({"rows": [1]})));
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let memory = MemoryStore::new();
        assert!(memory.get("nope").is_none());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_append_creates_and_extends_list() {
        let memory = MemoryStore::new();
        memory.append("notes", json!("a"));
        memory.append("notes", json!("b"));
        assert_eq!(memory.get("notes"), Some(json!(["a", "b"])));
    }

    #[test]
    fn test_append_replaces_non_list() {
        let memory = MemoryStore::new();
        memory.add("notes", json!({"not": "a list"}));
        memory.append("notes", json!(1));
        assert_eq!(memory.get("notes"), Some(json!([1])));
    }

    #[test]
    fn test_find_filters_list() {
        let memory = MemoryStore::new();
        for n in 1..=5 {
            memory.append("numbers", json!(n));
        }
        let evens = memory.find("numbers", |v| v.as_i64().map(|n| n % 2 == 0).unwrap_or(false));
        assert_eq!(evens, vec![json!(2), json!(4)]);
    }

    #[test]
    fn test_find_on_missing_or_scalar_is_empty() {
        let memory = MemoryStore::new();
        assert!(memory.find("missing", |_| true).is_empty());
        memory.add("scalar", json!(3));
        assert!(memory.find("scalar", |_| true).is_empty());
    }

    #[test]
    fn test_add_serialized() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
        }
        let memory = MemoryStore::new();
        memory.add_serialized("point", &Point { x: 4 }).unwrap();
        assert_eq!(memory.get("point"), Some(json!({"x": 4})));
    }
}
