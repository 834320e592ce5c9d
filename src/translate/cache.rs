//! Two-tier translation cache.
//! Memory tier: unbounded map, process lifetime, cleared only by reset.
//! Durable tier: key-value store, written through on every fresh
//! translation, promoted into memory on a read hit.
//! Key: blake3 hash of (resolved source | resolved target | stripped text).

use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::metrics::{metric_names, ServiceMetrics};
use crate::store::KeyValueStore;

/// Namespace prefix for per-string entries in the durable store.
const STORE_PREFIX: &str = "trans:";

/// Logical cache key shared by both tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Compute the key from resolved languages and stripped text.
    pub fn derive(source: &str, target: &str, stripped: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(source.as_bytes());
        hasher.update(b"|");
        hasher.update(target.as_bytes());
        hasher.update(b"|");
        hasher.update(stripped.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Namespaced hex form used in the durable store.
    pub fn storage_key(&self) -> String {
        format!("{}{}", STORE_PREFIX, blake3::Hash::from(self.0).to_hex())
    }
}

/// Two-tier cache. The memory tier is deliberately unbounded: entries live
/// until an explicit clear, and the durable tier carries them across
/// restarts.
pub struct TranslationCache {
    memory: Mutex<LruCache<CacheKey, String>>,
    store: Arc<dyn KeyValueStore>,
    metrics: Arc<ServiceMetrics>,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            memory: Mutex::new(LruCache::unbounded()),
            store,
            metrics,
        }
    }

    /// Look up a translation. A durable-tier hit is promoted into memory so
    /// the next lookup never touches the store.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        {
            let mut memory = self.memory.lock();
            if let Some(text) = memory.get(key) {
                self.metrics.incr(metric_names::CACHE_HIT_MEMORY);
                return Some(text.clone());
            }
        }

        if let Some(text) = self.store.get(&key.storage_key()) {
            debug!("durable cache hit, promoting to memory");
            self.metrics.incr(metric_names::CACHE_HIT_PERSISTENT);
            self.memory.lock().put(*key, text.clone());
            return Some(text);
        }

        None
    }

    /// Write a translation to both tiers. The durable write is best-effort.
    pub fn insert(&self, key: &CacheKey, translated: &str) {
        self.memory.lock().put(*key, translated.to_string());
        self.store.set(&key.storage_key(), translated);
    }

    /// Drop the memory tier. Durable entries are untouched.
    pub fn clear_memory(&self) {
        self.memory.lock().clear();
    }

    /// Entries currently held in the memory tier.
    pub fn memory_len(&self) -> usize {
        self.memory.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cache_over(store: Arc<MemoryStore>) -> TranslationCache {
        TranslationCache::new(store, Arc::new(ServiceMetrics::new()))
    }

    #[test]
    fn key_is_deterministic_and_distinct_per_input() {
        let a = CacheKey::derive("en", "fr", "Hello");
        let b = CacheKey::derive("en", "fr", "Hello");
        let c = CacheKey::derive("en", "de", "Hello");
        let d = CacheKey::derive("en", "fr", "Hello!");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn storage_key_is_namespaced_hex() {
        let key = CacheKey::derive("en", "ml", "Hello");
        let storage = key.storage_key();
        assert!(storage.starts_with("trans:"));
        assert_eq!(storage.len(), "trans:".len() + 64);
    }

    #[test]
    fn insert_writes_through_to_both_tiers() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(Arc::clone(&store));
        let key = CacheKey::derive("en", "fr", "Hello");

        cache.insert(&key, "Bonjour");

        assert_eq!(cache.get(&key), Some("Bonjour".to_string()));
        assert_eq!(store.get(&key.storage_key()), Some("Bonjour".to_string()));
    }

    #[test]
    fn durable_hit_promotes_into_memory() {
        let store = Arc::new(MemoryStore::new());
        let key = CacheKey::derive("en", "fr", "Hello");
        store.set(&key.storage_key(), "Bonjour");

        let metrics = Arc::new(ServiceMetrics::new());
        let cache = TranslationCache::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            Arc::clone(&metrics),
        );

        assert_eq!(cache.get(&key), Some("Bonjour".to_string()));
        assert_eq!(metrics.counter(metric_names::CACHE_HIT_PERSISTENT), 1);

        // Second lookup is served from memory
        assert_eq!(cache.get(&key), Some("Bonjour".to_string()));
        assert_eq!(metrics.counter(metric_names::CACHE_HIT_MEMORY), 1);
        assert_eq!(cache.memory_len(), 1);
    }

    #[test]
    fn clear_memory_leaves_durable_tier_intact() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(Arc::clone(&store));
        let key = CacheKey::derive("en", "fr", "Hello");

        cache.insert(&key, "Bonjour");
        cache.clear_memory();

        assert_eq!(cache.memory_len(), 0);
        assert_eq!(store.get(&key.storage_key()), Some("Bonjour".to_string()));
        // The entry comes back through promotion
        assert_eq!(cache.get(&key), Some("Bonjour".to_string()));
        assert_eq!(cache.memory_len(), 1);
    }

    #[test]
    fn unknown_key_misses_both_tiers() {
        let cache = cache_over(Arc::new(MemoryStore::new()));
        let key = CacheKey::derive("en", "fr", "never stored");
        assert_eq!(cache.get(&key), None);
    }
}
