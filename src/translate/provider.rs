//! Remote translation endpoint: the trait seam the engine calls through
//! and the MyMemory-style GET client used in production.
//! A provider performs exactly one network attempt; retry policy, caching,
//! and breaker handling live in the service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::TranslationConfig;

/// One network attempt against a translation endpoint.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError>;
}

/// Failure classes for a single attempt.
#[derive(Debug)]
pub enum ProviderError {
    /// HTTP 429. The caller must open the breaker.
    RateLimited,
    /// Any other non-success HTTP status.
    Status(u16),
    /// Body parsed as JSON but carried no usable translation.
    Malformed(String),
    /// Body was not valid JSON.
    Decode(String),
    /// Connection, timeout, or body-read failure.
    Transport(String),
}

impl ProviderError {
    /// Whether the service may spend another attempt on this failure.
    /// Transport and JSON-syntax failures are transient; everything else
    /// reflects endpoint or payload state a retry will not change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport(_) | ProviderError::Decode(_)
        )
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::RateLimited => write!(f, "endpoint rate-limited (429)"),
            ProviderError::Status(code) => write!(f, "endpoint returned status {code}"),
            ProviderError::Malformed(detail) => write!(f, "unusable response: {detail}"),
            ProviderError::Decode(detail) => write!(f, "response was not JSON: {detail}"),
            ProviderError::Transport(detail) => write!(f, "transport failure: {detail}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// MyMemory-style GET client: `?q=<text>&langpair=<source>|<target>`.
pub struct MyMemoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl MyMemoryClient {
    pub fn new(config: &TranslationConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.request_timeout())
            .user_agent(concat!("content-translator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryClient {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError> {
        let langpair = format!("{source}|{target}");
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        debug!(bytes = body.len(), "endpoint response received");
        decode_body(&body)
    }
}

/// Decode in two steps: JSON-syntax failures are retryable transients,
/// shape failures after a successful parse are not.
fn decode_body(body: &str) -> Result<String, ProviderError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
    let parsed: ApiResponse =
        serde_json::from_value(value).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    // A 429 inside the body is endpoint application state, not the HTTP
    // signal that trips the breaker
    if parsed.response_status != 200 {
        return Err(ProviderError::Malformed(format!(
            "responseStatus {}",
            parsed.response_status
        )));
    }

    match parsed.response_data.and_then(|d| d.translated_text) {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ProviderError::Malformed(
            "translatedText missing or empty".to_string(),
        )),
    }
}

// --- Response types ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "responseStatus")]
    response_status: i64,
    #[serde(rename = "responseData", default)]
    response_data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText", default)]
    translated_text: Option<String>,
}
