//! Render-time translation engine for content-managed, multi-language
//! sites. Records rest in their source language; this crate rewrites the
//! displayed strings into the visitor's language on the way out, with a
//! two-tier cache in front of the endpoint, one request on the wire at a
//! time, and a cooldown breaker that degrades the whole site to source
//! text instead of hammering a rate-limited endpoint.
//!
//! Translation is presentation enhancement: no public service method
//! returns an error, and every degraded path yields the original text.
//!
//! ```no_run
//! use std::sync::Arc;
//! use content_translator::{
//!     MyMemoryClient, SqliteStore, TranslationConfig, TranslationService,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslationConfig::default();
//! let provider = Arc::new(MyMemoryClient::new(&config)?);
//! let store = Arc::new(SqliteStore::open(std::path::Path::new("translations.db"))?);
//! let service = TranslationService::new(config, provider, store);
//!
//! let greeting = service.translate("Welcome to the center", "ml").await;
//! # let _ = greeting;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod metrics;
pub mod sqlite_store;
pub mod store;
pub mod translate;

pub use config::{ConfigError, TranslationConfig};
pub use metrics::{metric_names, MetricSummary, ServiceMetrics};
pub use sqlite_store::{SqliteStore, StoreError};
pub use store::{KeyValueStore, MemoryStore};
pub use translate::mock::{MockCall, MockProvider, MockReply};
pub use translate::provider::{MyMemoryClient, ProviderError, TranslationProvider};
pub use translate::{FailureReason, TranslateOutcome, TranslationService};
