//! Scripted provider for tests and local development. Records every call
//! with a timestamp, serves queued replies in order, and panics if two
//! calls ever overlap, which is how the single-flight tests catch a
//! broken gate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::provider::{ProviderError, TranslationProvider};

/// What the next call should produce. `Suffix` is the default echo mode:
/// "Hello" translated to "fr" becomes "Hello:fr".
#[derive(Debug, Clone)]
pub enum MockReply {
    Suffix,
    Translated(String),
    RateLimited,
    Status(u16),
    Malformed,
    Transport,
}

/// One recorded provider call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub text: String,
    pub source: String,
    pub target: String,
    pub at: Instant,
}

pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<MockCall>>,
    in_flight: AtomicBool,
    delay: Duration,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Each call sleeps for `delay` before replying, so overlap and
    /// ordering become observable under the paused test clock.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            delay,
        }
    }

    /// Queue a reply. Replies are consumed in order; once the script runs
    /// out, every further call echoes with `Suffix`.
    pub fn push_reply(&self, reply: MockReply) {
        self.script.lock().push_back(reply);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the in-flight flag even when the reply path errors out.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            panic!("mock provider called while another call was in flight");
        }
        let _guard = FlightGuard(&self.in_flight);

        self.calls.lock().push(MockCall {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            at: Instant::now(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(MockReply::Suffix);
        match reply {
            MockReply::Suffix => Ok(format!("{text}:{target}")),
            MockReply::Translated(out) => Ok(out),
            MockReply::RateLimited => Err(ProviderError::RateLimited),
            MockReply::Status(code) => Err(ProviderError::Status(code)),
            MockReply::Malformed => Err(ProviderError::Malformed("scripted".to_string())),
            MockReply::Transport => Err(ProviderError::Transport("scripted".to_string())),
        }
    }
}
