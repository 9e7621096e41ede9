//! LLM Provider Trait
//!
//! The one contract the agent loop depends on. Each wire adapter implements
//! `generate`; the dispatcher in the `strand` crate wraps it with retry.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::tool::Tool;
use crate::types::{LlmResponse, Message};

/// An LLM provider able to turn the canonical message list into a canonical
/// response. Implementations must never mutate the input messages.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider identifier (e.g. "anthropic", "openai", "gemini").
    fn name(&self) -> &str;

    /// Send the conversation and decode the model's reply.
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Arc<dyn Tool>],
    ) -> Result<LlmResponse>;
}
