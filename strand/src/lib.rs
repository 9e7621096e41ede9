//! # Strand
//!
//! A minimalist agent framework: drive an LLM through a tool-using
//! conversation loop against any of four providers (Anthropic Messages,
//! OpenAI Responses, OpenAI Chat Completions, Google Gemini), with LLM-driven
//! context compression and cooperative cancellation.
//!
//! ```no_run
//! use strand::{Agent, AgentOptions, LlmClient, ProviderConfig};
//! use futures::{pin_mut, StreamExt};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let client = LlmClient::new(ProviderConfig::new(
//!     "sk-...",
//!     "anthropic",
//!     "claude-sonnet-4-20250514",
//! ))?;
//! let mut agent = Agent::new(Arc::new(client), "You are helpful.", Vec::new(), AgentOptions::default());
//! agent.add_user_message("What's the weather in Berlin?");
//!
//! let run = agent.run(CancellationToken::new());
//! pin_mut!(run);
//! while let Some(event) = run.next().await {
//!     println!("{:?}", event?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;

pub use client::LlmClient;
pub use config::ProviderConfig;

// Re-export the core surface so most callers need only this crate.
pub use strand_core::{
    count_tokens, estimate_tokens, Agent, AgentEvent, AgentOptions, FunctionCall, LlmProvider,
    LlmResponse, Message, MessageContent, ReasoningItem, RetryCallback, RetryConfig,
    RetryExhaustedError, Role, TokenUsage, Tool, ToolCall, ToolResult,
    UnsupportedProviderError, CANCELLED_ANSWER, RETAINED_ROUNDS, SUMMARY_PREFIX,
};

// Re-export the adapters for direct construction.
pub use strand_provider_anthropic::AnthropicProvider;
pub use strand_provider_gemini::GeminiProvider;
pub use strand_provider_openai::{OpenAiChatProvider, OpenAiResponsesProvider};
