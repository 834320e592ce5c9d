//! Durable key-value collaborator behind the persistent cache tier and the
//! rate-limit timestamp. Implementations absorb their own failures: the
//! store is a best-effort durability layer, never a correctness dependency.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Durable string map. `get` returns `None` on a miss or on any underlying
/// failure. `set` is fire-and-forget. Both must be safe to call when
/// storage is full, locked, or gone.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Process-local store for tests and for embedders that accept losing the
/// durable tier on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_misses_on_unknown_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("absent"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store.set("greeting", "hello");
        assert_eq!(store.get("greeting"), Some("hello".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_overwrites_existing_value() {
        let store = MemoryStore::new();
        store.set("k", "first");
        store.set("k", "second");
        assert_eq!(store.get("k"), Some("second".to_string()));
        assert_eq!(store.len(), 1);
    }
}
