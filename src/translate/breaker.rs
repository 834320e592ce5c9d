//! Global rate-limit circuit breaker. A single 429 from the endpoint
//! suspends every outbound translation for the cooldown window; visitors
//! see source text instead of errors. The deadline is persisted in the
//! durable store so a restart inside the cooldown stays quiet.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::store::KeyValueStore;

/// Fixed store key for the cooldown deadline (epoch milliseconds, 0 means
/// the breaker is closed).
const RATE_LIMIT_KEY: &str = "trans:rate-limited-until";

pub struct RateLimitBreaker {
    limited_until_ms: AtomicU64,
    cooldown: Duration,
    store: Arc<dyn KeyValueStore>,
}

impl RateLimitBreaker {
    /// Load breaker state from the store. A deadline written by a previous
    /// process keeps the breaker open here too.
    pub fn new(store: Arc<dyn KeyValueStore>, cooldown: Duration) -> Self {
        let persisted = store
            .get(RATE_LIMIT_KEY)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        Self {
            limited_until_ms: AtomicU64::new(persisted),
            cooldown,
            store,
        }
    }

    /// True while the cooldown deadline is in the future.
    pub fn is_open(&self) -> bool {
        now_ms() < self.limited_until_ms.load(Ordering::SeqCst)
    }

    /// Open the breaker for the full cooldown window, durably.
    pub fn trip(&self) {
        let until = now_ms() + self.cooldown.as_millis() as u64;
        self.limited_until_ms.store(until, Ordering::SeqCst);
        self.store.set(RATE_LIMIT_KEY, &until.to_string());
        warn!(
            cooldown_secs = self.cooldown.as_secs(),
            "endpoint rate-limited, suspending all translation"
        );
    }

    /// Close the breaker. Only the explicit reset path calls this; an
    /// elapsed deadline closes it implicitly.
    pub fn reset(&self) {
        self.limited_until_ms.store(0, Ordering::SeqCst);
        self.store.set(RATE_LIMIT_KEY, "0");
        info!("rate-limit breaker reset");
    }
}

/// Current time as epoch milliseconds.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn closed_by_default() {
        let breaker = RateLimitBreaker::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        assert!(!breaker.is_open());
    }

    #[test]
    fn trip_opens_until_deadline() {
        let breaker = RateLimitBreaker::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        breaker.trip();
        assert!(breaker.is_open());
    }

    #[test]
    fn deadline_expiry_closes_without_reset() {
        let breaker =
            RateLimitBreaker::new(Arc::new(MemoryStore::new()), Duration::from_millis(30));
        breaker.trip();
        assert!(breaker.is_open());
        std::thread::sleep(Duration::from_millis(60));
        assert!(!breaker.is_open());
    }

    #[test]
    fn deadline_survives_a_new_instance_over_the_same_store() {
        let store = Arc::new(MemoryStore::new());
        let first = RateLimitBreaker::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            Duration::from_secs(60),
        );
        first.trip();

        let second = RateLimitBreaker::new(store, Duration::from_secs(60));
        assert!(second.is_open());
    }

    #[test]
    fn reset_closes_and_persists_the_closed_state() {
        let store = Arc::new(MemoryStore::new());
        let first = RateLimitBreaker::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            Duration::from_secs(60),
        );
        first.trip();
        first.reset();
        assert!(!first.is_open());

        let second = RateLimitBreaker::new(store, Duration::from_secs(60));
        assert!(!second.is_open());
    }

    #[test]
    fn garbage_in_the_store_reads_as_closed() {
        let store = Arc::new(MemoryStore::new());
        store.set(RATE_LIMIT_KEY, "not a number");
        let breaker = RateLimitBreaker::new(store, Duration::from_secs(60));
        assert!(!breaker.is_open());
    }
}
