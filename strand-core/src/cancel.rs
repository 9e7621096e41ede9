//! Cooperative Cancellation
//!
//! The loop polls a [`CancellationToken`] at its checkpoints and races only
//! the in-flight provider call against it. A cancelled turn is indivisible:
//! cleanup drops the trailing incomplete assistant turn so the tool-call
//! pairing invariant holds before the user's next message.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::provider::LlmProvider;
use crate::tool::Tool;
use crate::types::{LlmResponse, Message, Role};

/// The failure injected when a provider call loses the race to the token.
#[derive(Debug, Error)]
#[error("generation cancelled")]
pub struct Cancelled;

/// Truncate `messages` before the last assistant-role message, removing that
/// incomplete turn and any tool results that followed it. No assistant
/// message means nothing to clean.
pub fn cleanup_incomplete_messages(messages: &[Message]) -> Vec<Message> {
    let last_assistant = messages
        .iter()
        .rposition(|m| m.role == Role::Assistant);
    match last_assistant {
        Some(index) => {
            debug!(dropped = messages.len() - index, "removing incomplete assistant turn");
            messages[..index].to_vec()
        }
        None => messages.to_vec(),
    }
}

/// Call the provider, racing the request against the token so cancellation
/// does not wait for the network. An already-cancelled token fails fast
/// without launching the request. The caller appends the assistant message
/// only after a successful resolve, so no cleanup is needed here.
pub async fn generate_with_cancel(
    provider: &dyn LlmProvider,
    messages: &[Message],
    tools: &[Arc<dyn Tool>],
    token: &CancellationToken,
) -> Result<LlmResponse> {
    if token.is_cancelled() {
        return Err(Cancelled.into());
    }

    tokio::select! {
        _ = token.cancelled() => Err(Cancelled.into()),
        result = provider.generate(messages, tools) => result,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
