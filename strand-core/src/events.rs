//! Agent Events
//!
//! The typed items yielded by [`Agent::run`](crate::agent_loop::Agent::run).
//! Events appear in strict temporal order of their underlying actions; the
//! terminal `Completed` carries the loop's final answer string.

use crate::types::{ToolCall, ToolResult};

/// One observable step of an agent run.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// The model produced reasoning text this turn.
    Thinking { content: String },
    /// The model requested a tool invocation.
    ToolCall { call: ToolCall },
    /// A tool invocation finished; `call` pairs it with its request.
    ToolResult { call: ToolCall, result: ToolResult },
    /// A final assistant text turn with no tool calls.
    AssistantMessage { content: String },
    /// Old rounds were compressed into a context summary.
    Summarized {
        before_tokens: usize,
        after_tokens: usize,
    },
    /// The run observed the cancellation token.
    Cancelled,
    /// Terminal event: the run's final answer.
    Completed { answer: String },
}
