//! Provider Dispatcher
//!
//! A thin factory: the config record's provider tag selects the adapter, and
//! the resulting client exposes the single `generate` contract the agent
//! loop depends on, with retry wrapped around every call.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use strand_core::{
    retry_async, LlmProvider, LlmResponse, Message, RetryCallback, RetryConfig, Tool,
    UnsupportedProviderError,
};
use strand_provider_anthropic::AnthropicProvider;
use strand_provider_gemini::GeminiProvider;
use strand_provider_openai::{OpenAiChatProvider, OpenAiResponsesProvider};

use crate::config::ProviderConfig;

/// An LLM client bound to one provider, with retry on every `generate`.
pub struct LlmClient {
    provider: String,
    api_base_url: Option<String>,
    model: String,
    inner: Arc<dyn LlmProvider>,
    retry: RetryConfig,
    /// Observer fired on each retry attempt. Mutable so callers can attach
    /// one after construction.
    pub retry_callback: Option<RetryCallback>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider)
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .field("retry_callback", &self.retry_callback.is_some())
            .finish()
    }
}

impl LlmClient {
    /// Construct the adapter selected by `config.provider`. An unknown tag
    /// fails with [`UnsupportedProviderError`].
    pub fn new(config: ProviderConfig) -> Result<Self, UnsupportedProviderError> {
        let base_url = config.api_base_url.as_deref();
        let inner: Arc<dyn LlmProvider> = match config.provider.as_str() {
            "anthropic" => {
                let mut provider =
                    AnthropicProvider::new(&config.api_key, &config.model, base_url);
                if let Some(max_tokens) = config.max_tokens() {
                    provider = provider.with_max_tokens(max_tokens);
                }
                Arc::new(provider)
            }
            "openai" => Arc::new(OpenAiChatProvider::new(
                &config.api_key,
                &config.model,
                base_url,
            )),
            "openai-responses" => Arc::new(OpenAiResponsesProvider::new(
                &config.api_key,
                &config.model,
                base_url,
            )),
            "gemini" => {
                let mut provider = GeminiProvider::new(&config.api_key, &config.model, base_url);
                if let Some(max_tokens) = config.max_tokens() {
                    provider = provider.with_max_output_tokens(max_tokens);
                }
                Arc::new(provider)
            }
            other => {
                return Err(UnsupportedProviderError {
                    provider: other.to_string(),
                })
            }
        };

        info!(provider = %config.provider, model = %config.model, "constructed LLM client");
        Ok(Self {
            provider: config.provider,
            api_base_url: config.api_base_url,
            model: config.model,
            inner,
            retry: config.retry.unwrap_or_default(),
            retry_callback: None,
        })
    }

    /// The provider tag this client was constructed with.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The custom base URL, if any.
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }

    /// The model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for LlmClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Arc<dyn Tool>],
    ) -> Result<LlmResponse> {
        retry_async(
            &self.retry,
            self.inner.name(),
            self.retry_callback.as_ref(),
            || self.inner.generate(messages, tools),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_tag_is_rejected() {
        let err = LlmClient::new(ProviderConfig::new("k", "bedrock", "m")).unwrap_err();
        assert_eq!(err.provider, "bedrock");
        assert!(err.to_string().contains("bedrock"));
    }

    #[test]
    fn known_tags_construct_their_adapter() {
        for (tag, name) in [
            ("anthropic", "anthropic"),
            ("openai", "openai"),
            ("openai-responses", "openai-responses"),
            ("gemini", "gemini"),
        ] {
            let client = LlmClient::new(ProviderConfig::new("k", tag, "m")).unwrap();
            assert_eq!(client.name(), name);
            assert_eq!(client.provider(), tag);
        }
    }

    #[test]
    fn introspection_exposes_config() {
        let client = LlmClient::new(
            ProviderConfig::new("k", "openai", "gpt-4o")
                .with_base_url("http://localhost:9999"),
        )
        .unwrap();
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.api_base_url(), Some("http://localhost:9999"));
    }
}
