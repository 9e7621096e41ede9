//! # Strand Core
//!
//! Provider-neutral heart of the Strand agent framework: the canonical
//! message model, the observe–think–act loop, LLM-driven context
//! compression, cooperative cancellation, and the tool/provider traits the
//! wire adapters plug into.

pub mod agent_loop;
pub mod cancel;
pub mod error;
pub mod events;
pub mod executor;
pub mod provider;
pub mod retry;
pub mod summarizer;
pub mod tokenizer;
pub mod tool;
pub mod types;

// Re-export key types
pub use agent_loop::{Agent, AgentOptions, CANCELLED_ANSWER};
pub use cancel::{cleanup_incomplete_messages, generate_with_cancel, Cancelled};
pub use error::{RetryExhaustedError, UnsupportedProviderError};
pub use events::AgentEvent;
pub use provider::LlmProvider;
pub use retry::{retry_async, RetryCallback, RetryConfig};
pub use summarizer::{estimate_tokens, RETAINED_ROUNDS, SUMMARY_PREFIX};
pub use tokenizer::count_tokens;
pub use tool::Tool;
pub use types::{
    FunctionCall, LlmResponse, Message, MessageContent, ReasoningItem, Role, TokenUsage,
    ToolCall, ToolResult,
};
