//! Client Configuration
//!
//! The record the dispatcher consumes. Loading it from a file (or wherever
//! else it lives) is the caller's concern; the shape is serde-derived so any
//! format works.

use serde::{Deserialize, Serialize};

use strand_core::RetryConfig;

/// Configuration for constructing an [`LlmClient`](crate::LlmClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key passed through to the provider.
    pub api_key: String,
    /// Provider tag: "anthropic", "openai", "openai-responses", or "gemini".
    pub provider: String,
    /// Custom base URL (e.g. OpenAI-compatible endpoints, test servers).
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Model name.
    pub model: String,
    /// Provider-specific knobs (currently `max_tokens`).
    #[serde(default)]
    pub provider_options: Option<serde_json::Value>,
    /// Retry policy for the provider call. Defaults apply when absent.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl ProviderConfig {
    pub fn new(api_key: &str, provider: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            provider: provider.to_string(),
            api_base_url: None,
            model: model.to_string(),
            provider_options: None,
            retry: None,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.api_base_url = Some(url.to_string());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub(crate) fn max_tokens(&self) -> Option<u32> {
        self.provider_options
            .as_ref()
            .and_then(|o| o.get("max_tokens"))
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_optional_fields_absent() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{"api_key": "k", "provider": "anthropic", "model": "claude-sonnet-4-20250514"}"#,
        )
        .unwrap();
        assert!(config.api_base_url.is_none());
        assert!(config.retry.is_none());
        assert!(config.max_tokens().is_none());
    }

    #[test]
    fn max_tokens_reads_provider_options() {
        let config = ProviderConfig {
            provider_options: Some(serde_json::json!({"max_tokens": 4096})),
            ..ProviderConfig::new("k", "anthropic", "m")
        };
        assert_eq!(config.max_tokens(), Some(4096));
    }
}
