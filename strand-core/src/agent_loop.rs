//! Agentic Tool Loop
//!
//! Core loop: prompt → LLM → if tool calls, execute tools → feed results
//! back → repeat until the model stops calling tools or the step cap hits.
//! The run is exposed as a lazy stream of typed events, so the consumer
//! pulls and the loop cannot outrun it.

use std::sync::Arc;

use anyhow::Result;
use async_stream::stream;
use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::{cleanup_incomplete_messages, generate_with_cancel};
use crate::events::AgentEvent;
use crate::executor;
use crate::provider::LlmProvider;
use crate::summarizer;
use crate::tool::Tool;
use crate::types::Message;

/// Final answer reported for a cancelled run.
pub const CANCELLED_ANSWER: &str = "Task cancelled by user.";

/// Construction options for an [`Agent`].
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Token budget before context compression kicks in.
    pub token_limit: usize,
    /// Maximum observe–think–act steps per run.
    pub max_steps: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            token_limit: 80_000,
            max_steps: 50,
        }
    }
}

/// The agent: owns the canonical message list and drives the loop.
///
/// `messages` is deliberately public: callers inspect it in tests and may
/// seed prior context before the first run. It grows monotonically except
/// for summarization (prefix replaced by a summary) and cancellation
/// cleanup (trailing incomplete assistant turn dropped).
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    pub messages: Vec<Message>,
    tools: Vec<Arc<dyn Tool>>,
    token_limit: usize,
    max_steps: usize,
    api_total_tokens: u64,
    skip_next_token_check: bool,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
        tools: Vec<Arc<dyn Tool>>,
        options: AgentOptions,
    ) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            provider,
            messages: vec![Message::system(&system_prompt)],
            system_prompt,
            tools,
            token_limit: options.token_limit,
            max_steps: options.max_steps,
            api_total_tokens: 0,
            skip_next_token_check: false,
        }
    }

    /// The system prompt the agent was constructed with.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Total tokens reported by the provider on its last response.
    pub fn api_total_tokens(&self) -> u64 {
        self.api_total_tokens
    }

    /// Append a user message to the conversation.
    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Drive the loop until the model answers, the step cap hits, or the
    /// token fires.
    ///
    /// Returns a lazy, finite, non-restartable stream of [`AgentEvent`]s.
    /// The terminal item is always `Completed { answer }`; errors that are
    /// not cancellation end the stream as an `Err` item.
    pub fn run(
        &mut self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<AgentEvent>> + '_ {
        stream! {
            let provider = self.provider.clone();
            let tools = self.tools.clone();

            for step in 0..self.max_steps {
                // Checkpoint 1: top of step, before any work.
                if cancel.is_cancelled() {
                    self.messages = cleanup_incomplete_messages(&self.messages);
                    yield Ok(AgentEvent::Cancelled);
                    yield Ok(AgentEvent::Completed { answer: CANCELLED_ANSWER.into() });
                    return;
                }

                if let Some((before_tokens, after_tokens)) = summarizer::maybe_summarize(
                    provider.as_ref(),
                    &mut self.messages,
                    self.token_limit,
                    self.api_total_tokens,
                    &mut self.skip_next_token_check,
                )
                .await
                {
                    yield Ok(AgentEvent::Summarized { before_tokens, after_tokens });
                }

                debug!(step, messages = self.messages.len(), "calling provider");
                let mut response = match generate_with_cancel(
                    provider.as_ref(),
                    &self.messages,
                    &tools,
                    &cancel,
                )
                .await
                {
                    Ok(response) => response,
                    Err(err) => {
                        if cancel.is_cancelled() {
                            self.messages = cleanup_incomplete_messages(&self.messages);
                            yield Ok(AgentEvent::Cancelled);
                            yield Ok(AgentEvent::Completed { answer: CANCELLED_ANSWER.into() });
                        } else {
                            warn!(err = %err, "provider call failed");
                            yield Err(err);
                        }
                        return;
                    }
                };

                if let Some(usage) = &response.usage {
                    self.api_total_tokens = usage.total_tokens;
                }

                self.messages.push(Message::from_response(&response));

                if let Some(thinking) = response.thinking.as_ref().filter(|t| !t.is_empty()) {
                    yield Ok(AgentEvent::Thinking { content: thinking.clone() });
                }

                let calls = response.tool_calls.take();
                if calls.is_none() {
                    let answer = response.content.take().unwrap_or_default();
                    if !answer.is_empty() {
                        yield Ok(AgentEvent::AssistantMessage { content: answer.clone() });
                    }
                    info!(step, "run complete");
                    yield Ok(AgentEvent::Completed { answer });
                    return;
                }

                // Checkpoint 2: response decoded, before any tool runs.
                if cancel.is_cancelled() {
                    self.messages = cleanup_incomplete_messages(&self.messages);
                    yield Ok(AgentEvent::Cancelled);
                    yield Ok(AgentEvent::Completed { answer: CANCELLED_ANSWER.into() });
                    return;
                }

                for call in calls.unwrap_or_default() {
                    yield Ok(AgentEvent::ToolCall { call: call.clone() });

                    let result = executor::execute(
                        &tools,
                        &call.function.name,
                        call.function.arguments.clone(),
                    )
                    .await;
                    yield Ok(AgentEvent::ToolResult {
                        call: call.clone(),
                        result: result.clone(),
                    });

                    let content = if result.success {
                        result.content
                    } else {
                        format!("Error: {}", result.error.unwrap_or_default())
                    };
                    self.messages.push(Message::tool(
                        content,
                        &call.call_id,
                        &call.function.name,
                    ));

                    // Checkpoint 3: after each individual tool call.
                    if cancel.is_cancelled() {
                        self.messages = cleanup_incomplete_messages(&self.messages);
                        yield Ok(AgentEvent::Cancelled);
                        yield Ok(AgentEvent::Completed { answer: CANCELLED_ANSWER.into() });
                        return;
                    }
                }
            }

            let answer = format!(
                "Task couldn't be completed after {} steps.",
                self.max_steps
            );
            warn!(max_steps = self.max_steps, "step cap reached");
            yield Ok(AgentEvent::Completed { answer });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
