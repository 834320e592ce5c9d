//! Single-flight gate for provider calls. tokio's semaphore wakes waiters
//! in arrival order, so with one permit this is an exact FIFO queue and at
//! most one call is on the wire at any moment.

use tokio::sync::{Semaphore, SemaphorePermit};

pub struct RequestGate {
    permits: Semaphore,
}

/// Held for the whole network phase of one translation: the post-queue
/// breaker and cache re-checks, every attempt, and the backoff sleeps
/// between them. Dropping it admits the next waiter.
pub struct GatePermit<'a> {
    _permit: SemaphorePermit<'a>,
}

impl RequestGate {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// Wait for a slot. No timeout and no cancellation: once queued, a
    /// request always runs.
    pub async fn acquire(&self) -> GatePermit<'_> {
        // The semaphore is never closed, so acquire cannot fail
        let permit = self
            .permits
            .acquire()
            .await
            .expect("request gate semaphore closed");
        GatePermit { _permit: permit }
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
