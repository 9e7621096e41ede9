//! Anthropic Messages Adapter
//!
//! Translates the canonical message list to and from the Anthropic Messages
//! API. The system message is lifted out of the array into the top-level
//! `system` field; a single block `id` doubles as both the item id and the
//! tool-call correlation id.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use strand_core::{
    LlmProvider, LlmResponse, Message, MessageContent, Role, TokenUsage, Tool, ToolCall,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request_body(&self, messages: &[Message], tools: &[Arc<dyn Tool>]) -> Value {
        let (system, api_messages) = encode(messages);

        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": api_messages,
        });

        if let Some(system) = system {
            body["system"] = json!(system);
        }
        if !tools.is_empty() {
            let declarations: Vec<Value> =
                tools.iter().map(|t| t.to_anthropic_schema()).collect();
            body["tools"] = json!(declarations);
        }

        body
    }
}

/// Encode the canonical message list into the top-level `system` string and
/// the wire `messages` array. Pure; the input is never mutated.
pub fn encode(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system = None;
    let mut api_messages = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => {
                system = Some(msg.text().to_string());
            }
            Role::User => match &msg.content {
                MessageContent::Text(t) => {
                    api_messages.push(json!({"role": "user", "content": t}));
                }
                MessageContent::Blocks(blocks) => {
                    api_messages.push(json!({"role": "user", "content": blocks}));
                }
            },
            Role::Assistant => {
                api_messages.push(encode_assistant(msg));
            }
            Role::Tool => {
                api_messages.push(json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": msg.call_id.as_deref().unwrap_or_default(),
                        "content": msg.text(),
                    }],
                }));
            }
        }
    }

    (system, api_messages)
}

fn encode_assistant(msg: &Message) -> Value {
    let has_calls = msg.tool_calls.as_ref().is_some_and(|c| !c.is_empty());
    let has_thinking = msg.thinking.as_ref().is_some_and(|t| !t.is_empty());

    // Plain text turns stay plain; anything richer becomes ordered blocks.
    if !has_calls && !has_thinking {
        return json!({"role": "assistant", "content": msg.text()});
    }

    let mut blocks = Vec::new();
    if let Some(thinking) = msg.thinking.as_ref().filter(|t| !t.is_empty()) {
        blocks.push(json!({"type": "thinking", "thinking": thinking}));
    }
    if !msg.text().is_empty() {
        blocks.push(json!({"type": "text", "text": msg.text()}));
    }
    for call in msg.tool_calls.iter().flatten() {
        blocks.push(json!({
            "type": "tool_use",
            "id": call.call_id,
            "name": call.function.name,
            "input": call.function.arguments,
        }));
    }

    json!({"role": "assistant", "content": blocks})
}

/// Decode an Anthropic Messages response into the canonical shape. Pure.
pub fn decode(response: &Value) -> LlmResponse {
    let mut content = String::new();
    let mut thinking = String::new();
    let mut tool_calls = Vec::new();

    for block in response
        .get("content")
        .and_then(Value::as_array)
        .map(|a| a.as_slice())
        .unwrap_or_default()
    {
        match block.get("type").and_then(Value::as_str).unwrap_or_default() {
            "text" => {
                content.push_str(block.get("text").and_then(Value::as_str).unwrap_or_default());
            }
            "thinking" => {
                thinking.push_str(
                    block
                        .get("thinking")
                        .and_then(Value::as_str)
                        .unwrap_or_default(),
                );
            }
            "tool_use" => {
                let id = block
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let name = block
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let input = block.get("input").cloned().unwrap_or(json!({}));
                tool_calls.push(ToolCall::new(id, name, input));
            }
            _ => {}
        }
    }

    let usage = response.get("usage").map(|u| {
        let prompt = u
            .get("input_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_default();
        let completion = u
            .get("output_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_default();
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    });

    LlmResponse {
        content: (!content.is_empty()).then_some(content),
        thinking: (!thinking.is_empty()).then_some(thinking),
        reasoning_items: None,
        tool_calls: LlmResponse::normalize_tool_calls(tool_calls),
        finish_reason: response
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
        usage,
        response_id: response
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Arc<dyn Tool>],
    ) -> Result<LlmResponse> {
        let body = self.build_request_body(messages, tools);
        let url = format!("{}/v1/messages", self.base_url);

        debug!(model = %self.model, url = %url, "calling Anthropic API");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("failed to call Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error (HTTP {status}): {body}");
        }

        let parsed: Value = response
            .json()
            .await
            .context("failed to parse Anthropic response")?;
        Ok(decode(&parsed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
