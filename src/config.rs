//! Engine configuration. Defaults reproduce the production policy; tests
//! and embedders override individual fields.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Policy knobs for the translation engine. All fields have defaults, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of the translation endpoint.
    pub api_url: String,
    /// Source language assumed when the caller does not name one.
    pub default_source_lang: String,
    /// Total network attempts per translation. Only transport and
    /// JSON-syntax failures consume extra attempts.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles after every failed attempt.
    pub backoff_base_ms: u64,
    /// How long all outbound translation stays suspended after the endpoint
    /// answers 429.
    pub rate_limit_cooldown_secs: u64,
    /// Provider calls allowed on the wire at once. 1 serializes everything.
    pub max_concurrent_requests: usize,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.mymemory.translated.net/get".to_string(),
            default_source_lang: "en".to_string(),
            max_attempts: 2,
            backoff_base_ms: 1200,
            rate_limit_cooldown_secs: 30 * 60,
            max_concurrent_requests: 1,
            request_timeout_secs: 10,
        }
    }
}

impl TranslationConfig {
    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_policy() {
        let config = TranslationConfig::default();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.backoff_base_ms, 1200);
        assert_eq!(config.rate_limit_cooldown_secs, 1800);
        assert_eq!(config.max_concurrent_requests, 1);
        assert_eq!(config.default_source_lang, "en");
        assert!(config.api_url.contains("mymemory"));
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_keys() {
        let config: TranslationConfig =
            serde_json::from_str(r#"{"max_attempts": 4, "default_source_lang": "de"}"#).unwrap();
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.default_source_lang, "de");
        assert_eq!(config.backoff_base_ms, 1200);
        assert_eq!(config.max_concurrent_requests, 1);
    }

    #[test]
    fn duration_helpers_convert_units() {
        let config = TranslationConfig::default();
        assert_eq!(config.backoff_base(), Duration::from_millis(1200));
        assert_eq!(config.cooldown(), Duration::from_secs(1800));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn file_load_reports_missing_path_as_io() {
        let err = TranslationConfig::from_json_file(Path::new("/nonexistent/translator.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn file_load_reports_bad_json_as_parse() {
        let path = std::env::temp_dir().join("content-translator-bad-config.json");
        std::fs::write(&path, "not json at all").unwrap();
        let err = TranslationConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let _ = std::fs::remove_file(&path);
    }
}
