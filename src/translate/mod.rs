//! Translation engine: the facade the site and admin layers call.
//! Orchestrates normalization, the two-tier cache, the rate-limit breaker,
//! the single-flight gate, and the retry loop. Public methods never fail:
//! every degraded path returns the caller's original text, because a page
//! must always render with some text in place.

pub mod breaker;
pub mod cache;
pub mod gate;
pub mod mock;
pub mod normalize;
pub mod provider;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::TranslationConfig;
use crate::metrics::{metric_names, ServiceMetrics};
use crate::store::KeyValueStore;

use self::breaker::RateLimitBreaker;
use self::cache::{CacheKey, TranslationCache};
use self::gate::RequestGate;
use self::normalize::{resolve_lang, MarkupStripper};
use self::provider::{ProviderError, TranslationProvider};

/// Why a call produced (or did not produce) a translation. The plain
/// `translate*` methods collapse this to a string; callers that care about
/// the distinction use [`TranslationService::translate_outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateOutcome {
    /// Identity language pair, empty input, or markup-only input.
    Skipped,
    /// Served from the memory or durable tier.
    Cached(String),
    /// Fresh network translation, now cached in both tiers.
    Translated(String),
    /// The breaker was already open, or this call tripped it.
    RateLimited,
    Failed(FailureReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Non-success HTTP status other than 429.
    Status(u16),
    /// Response parsed but carried no usable translation.
    MalformedResponse,
    /// Transient failures consumed every attempt.
    AttemptsExhausted,
}

impl TranslateOutcome {
    /// The text a page should render: the translation when one exists,
    /// otherwise the original.
    pub fn into_text(self, original: &str) -> String {
        match self {
            TranslateOutcome::Cached(text) | TranslateOutcome::Translated(text) => text,
            _ => original.to_string(),
        }
    }
}

pub struct TranslationService {
    config: TranslationConfig,
    provider: Arc<dyn TranslationProvider>,
    cache: TranslationCache,
    breaker: RateLimitBreaker,
    gate: RequestGate,
    stripper: MarkupStripper,
    metrics: Arc<ServiceMetrics>,
}

impl TranslationService {
    /// Build a service over an injected provider and store. The same store
    /// backs both the durable cache tier and the breaker deadline.
    pub fn new(
        config: TranslationConfig,
        provider: Arc<dyn TranslationProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let metrics = Arc::new(ServiceMetrics::new());
        let cache = TranslationCache::new(Arc::clone(&store), Arc::clone(&metrics));
        let breaker = RateLimitBreaker::new(store, config.cooldown());
        let gate = RequestGate::new(config.max_concurrent_requests);
        Self {
            provider,
            cache,
            breaker,
            gate,
            stripper: MarkupStripper::new(),
            metrics,
            config,
        }
    }

    /// Translate into `target` from the configured default source language.
    pub async fn translate(&self, text: &str, target: &str) -> String {
        self.translate_outcome(text, target, self.config.default_source_lang.as_str())
            .await
            .into_text(text)
    }

    /// Translate with an explicit source language.
    pub async fn translate_from(&self, text: &str, target: &str, source: &str) -> String {
        self.translate_outcome(text, target, source)
            .await
            .into_text(text)
    }

    /// Full pipeline with a typed outcome. Never returns an error and never
    /// panics; the worst case is `Failed`, which renders as source text.
    pub async fn translate_outcome(
        &self,
        text: &str,
        target: &str,
        source: &str,
    ) -> TranslateOutcome {
        let span = self.metrics.span(metric_names::TRANSLATE_DONE);
        let outcome = self.run_translate(text, target, source).await;
        span.finish();
        outcome
    }

    async fn run_translate(&self, text: &str, target: &str, source: &str) -> TranslateOutcome {
        if text.trim().is_empty() {
            return TranslateOutcome::Skipped;
        }

        let source = resolve_lang(source);
        let target = resolve_lang(target);
        if source == target {
            return TranslateOutcome::Skipped;
        }

        let stripped = self.stripper.strip(text);
        if stripped.is_empty() {
            return TranslateOutcome::Skipped;
        }

        // Breaker before any cache traffic: during a cooldown the whole
        // path degrades straight to source text
        if self.breaker.is_open() {
            self.metrics.incr(metric_names::BREAKER_REJECTIONS);
            debug!("translation suspended by rate-limit cooldown");
            return TranslateOutcome::RateLimited;
        }

        let key = CacheKey::derive(&source, &target, &stripped);
        if let Some(cached) = self.cache.get(&key) {
            return TranslateOutcome::Cached(cached);
        }
        self.metrics.incr(metric_names::CACHE_MISS);

        let wait = self.metrics.span(metric_names::QUEUE_WAIT);
        let _permit = self.gate.acquire().await;
        wait.finish();

        // A caller ahead of us in the queue may have tripped the breaker
        // or already translated this exact string
        if self.breaker.is_open() {
            self.metrics.incr(metric_names::BREAKER_REJECTIONS);
            return TranslateOutcome::RateLimited;
        }
        if let Some(cached) = self.cache.get(&key) {
            return TranslateOutcome::Cached(cached);
        }

        let outcome = self.fetch_with_retry(&stripped, &source, &target).await;
        if let TranslateOutcome::Translated(ref translated) = outcome {
            self.cache.insert(&key, translated);
        }
        outcome
    }

    /// Attempt loop, run while holding the gate permit. Only transient
    /// failures consume extra attempts; policy errors degrade at once.
    async fn fetch_with_retry(
        &self,
        stripped: &str,
        source: &str,
        target: &str,
    ) -> TranslateOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.backoff_base();

        for attempt in 1..=max_attempts {
            self.metrics.incr(metric_names::NETWORK_CALLS);
            let span = self.metrics.span(metric_names::PROVIDER_CALL);
            let result = self.provider.translate(stripped, source, target).await;
            span.finish();

            match result {
                Ok(translated) => {
                    debug!(source = source, target = target, chars = stripped.len(), "translated");
                    return TranslateOutcome::Translated(translated);
                }
                Err(ProviderError::RateLimited) => {
                    self.metrics.incr(metric_names::BREAKER_TRIPS);
                    self.breaker.trip();
                    return TranslateOutcome::RateLimited;
                }
                Err(ProviderError::Status(code)) => {
                    warn!(status = code, "translation endpoint returned an error");
                    return TranslateOutcome::Failed(FailureReason::Status(code));
                }
                Err(ProviderError::Malformed(detail)) => {
                    warn!(%detail, "translation response unusable");
                    return TranslateOutcome::Failed(FailureReason::MalformedResponse);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(
                        error = %err,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient translation failure, retrying"
                    );
                    self.metrics.incr(metric_names::NETWORK_RETRIES);
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(err) => {
                    warn!(error = %err, attempts = max_attempts, "translation attempts exhausted");
                    return TranslateOutcome::Failed(FailureReason::AttemptsExhausted);
                }
            }
        }

        TranslateOutcome::Failed(FailureReason::AttemptsExhausted)
    }

    /// Translate the named string-valued fields of a JSON record, leaving
    /// every other field untouched. Returns a new record. A `None` source
    /// uses the configured default.
    pub async fn translate_fields(
        &self,
        record: &Value,
        fields: &[&str],
        target: &str,
        source: Option<&str>,
    ) -> Value {
        let source = source.unwrap_or(&self.config.default_source_lang);
        if resolve_lang(source) == resolve_lang(target) {
            return record.clone();
        }
        let Some(map) = record.as_object() else {
            return record.clone();
        };

        let mut out = map.clone();
        for field in fields {
            if let Some(Value::String(text)) = map.get(*field) {
                let translated = self.translate_from(text, target, source).await;
                out.insert((*field).to_string(), Value::String(translated));
            }
        }
        Value::Object(out)
    }

    /// Apply [`Self::translate_fields`] to each record, in order. Records
    /// are processed one after another: list pages queue at the gate one
    /// string at a time instead of all at once.
    pub async fn translate_fields_each(
        &self,
        records: &[Value],
        fields: &[&str],
        target: &str,
        source: Option<&str>,
    ) -> Vec<Value> {
        let source_code = source.unwrap_or(&self.config.default_source_lang);
        if resolve_lang(source_code) == resolve_lang(target) {
            return records.to_vec();
        }
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(self.translate_fields(record, fields, target, source).await);
        }
        out
    }

    /// Clear the memory cache tier and close the breaker. Durable
    /// per-string entries survive: they stay valid regardless of breaker
    /// state and will be promoted back on demand.
    pub fn reset(&self) {
        self.cache.clear_memory();
        self.breaker.reset();
        info!("translation cache cleared and breaker closed");
    }

    /// Entries currently held in the memory tier.
    pub fn cached_in_memory(&self) -> usize {
        self.cache.memory_len()
    }

    /// Engine counters and timing histograms.
    pub fn metrics(&self) -> Arc<ServiceMetrics> {
        Arc::clone(&self.metrics)
    }
}
