//! Core Data Types
//!
//! The provider-neutral message model shared across the agent codebase.
//! Every field is plain data so the wire adapters can pattern-match freely;
//! the four provider protocols are interchanged behind this one shape.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// Message role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content: plain text, or an ordered sequence of opaque
/// provider-shaped content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<serde_json::Value>),
}

impl MessageContent {
    /// The text payload, if this is plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(t) => Some(t),
            MessageContent::Blocks(_) => None,
        }
    }
}

/// A message in the conversation.
///
/// `call_id` and `name` are populated on tool-role messages only and link the
/// result back to the assistant tool call that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    /// Concatenated reasoning text, kept for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Identified reasoning blocks, kept so providers that require them can
    /// round-trip reasoning by id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_items: Option<Vec<ReasoningItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// A system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }

    /// A user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }

    /// An assistant message carrying only text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, text)
    }

    /// A tool-role message carrying the result of the call `call_id` made by
    /// the tool `name`.
    pub fn tool(
        content: impl Into<String>,
        call_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::Text(content.into()),
            thinking: None,
            reasoning_items: None,
            tool_calls: None,
            call_id: Some(call_id.into()),
            name: Some(name.into()),
        }
    }

    /// The assistant turn recorded from a decoded provider response.
    pub fn from_response(response: &LlmResponse) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(response.content.clone().unwrap_or_default()),
            thinking: response.thinking.clone(),
            reasoning_items: response.reasoning_items.clone(),
            tool_calls: response.tool_calls.clone(),
            call_id: None,
            name: None,
        }
    }

    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
            thinking: None,
            reasoning_items: None,
            tool_calls: None,
            call_id: None,
            name: None,
        }
    }

    /// The plain-text content, empty for block content.
    pub fn text(&self) -> &str {
        self.content.as_text().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tool call types
// ---------------------------------------------------------------------------

/// A tool invocation requested by the LLM.
///
/// `call_id` is the correlation id pairing the invocation with the tool-role
/// message carrying its result. `id` is the provider item id; only the OpenAI
/// Responses protocol surfaces one distinct from `call_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default = "function_call_type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_call_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            id: None,
            kind: function_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }

    /// Attach a provider item id distinct from the correlation id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The function half of a tool call. `arguments` is always a parsed JSON
/// object, never a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// An identified reasoning block. Preserved so the item `id` survives an
/// encode/decode round-trip on providers that require it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReasoningItem {
    pub id: String,
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Tool results
// ---------------------------------------------------------------------------

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    /// Textual payload when successful.
    pub content: String,
    /// Human-readable reason when not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            error: None,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            content: String::new(),
            error: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider responses
// ---------------------------------------------------------------------------

/// Token usage for a single LLM call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Canonical decoded model output.
///
/// Absent fields are `None`, never fabricated. Empty `tool_calls` is `None`
/// rather than an empty vec, so the loop's "finished?" test is one check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub thinking: Option<String>,
    pub reasoning_items: Option<Vec<ReasoningItem>>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    pub response_id: Option<String>,
}

impl LlmResponse {
    /// Wrap a decoded tool-call list, normalizing empty to `None`.
    pub fn normalize_tool_calls(calls: Vec<ToolCall>) -> Option<Vec<ToolCall>> {
        if calls.is_empty() {
            None
        } else {
            Some(calls)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
