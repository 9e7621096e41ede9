//! Google Gemini Adapter
//!
//! Gemini speaks in role-tagged `contents` with typed `parts`: canonical
//! assistant maps to wire role `model`, while canonical user and tool both
//! map to wire role `user` (tool results ride in a `functionResponse` part).
//! Thinking is a text part flagged `thought: true`. The API may omit
//! function-call ids, in which case a stable fallback id is synthesized so
//! the correlation invariant still holds.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use strand_core::{
    LlmProvider, LlmResponse, Message, MessageContent, Role, TokenUsage, Tool, ToolCall,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Google Gemini provider.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    max_output_tokens: u32,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn build_request_body(&self, messages: &[Message], tools: &[Arc<dyn Tool>]) -> Value {
        let (system_instruction, contents) = encode(messages);

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.max_output_tokens,
            },
        });
        if let Some(system) = system_instruction {
            body["systemInstruction"] = system;
        }
        if !tools.is_empty() {
            let declarations: Vec<Value> = tools.iter().map(|t| t.to_gemini_schema()).collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }
        body
    }
}

/// Encode the canonical message list into the top-level `systemInstruction`
/// and the wire `contents` array. Pure.
pub fn encode(messages: &[Message]) -> (Option<Value>, Vec<Value>) {
    let mut system_instruction = None;
    let mut contents = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => {
                system_instruction = Some(json!({"parts": [{"text": msg.text()}]}));
            }
            Role::User => match &msg.content {
                MessageContent::Text(t) => {
                    contents.push(json!({"role": "user", "parts": [{"text": t}]}));
                }
                MessageContent::Blocks(blocks) => {
                    contents.push(json!({"role": "user", "parts": blocks}));
                }
            },
            Role::Assistant => {
                contents.push(json!({
                    "role": "model",
                    "parts": encode_assistant_parts(msg),
                }));
            }
            Role::Tool => {
                contents.push(json!({
                    "role": "user",
                    "parts": [{
                        "functionResponse": {
                            "id": msg.call_id.as_deref().unwrap_or_default(),
                            "name": msg.name.as_deref().unwrap_or_default(),
                            "response": { "result": msg.text() },
                        },
                    }],
                }));
            }
        }
    }

    (system_instruction, contents)
}

fn encode_assistant_parts(msg: &Message) -> Vec<Value> {
    let mut parts = Vec::new();

    if let Some(thinking) = msg.thinking.as_ref().filter(|t| !t.is_empty()) {
        parts.push(json!({"text": thinking, "thought": true}));
    }
    if !msg.text().is_empty() {
        parts.push(json!({"text": msg.text()}));
    }
    for call in msg.tool_calls.iter().flatten() {
        parts.push(json!({
            "functionCall": {
                "name": call.function.name,
                "args": call.function.arguments,
                "id": call.call_id,
            },
        }));
    }

    // The wire format rejects empty parts arrays.
    if parts.is_empty() {
        parts.push(json!({"text": ""}));
    }
    parts
}

/// Decode a Gemini response into the canonical shape.
///
/// A `functionCall` part without an id gets a synthesized
/// `gemini_call_{timestamp}_{part_index}` so the result message can still
/// correlate back to it.
pub fn decode(response: &Value) -> LlmResponse {
    let mut content = String::new();
    let mut thinking = String::new();
    let mut tool_calls = Vec::new();

    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|a| a.as_slice())
        .unwrap_or_default();

    for (part_index, part) in parts.iter().enumerate() {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if part.get("thought").and_then(Value::as_bool).unwrap_or(false) {
                thinking.push_str(text);
            } else {
                content.push_str(text);
            }
        }
        if let Some(call) = part.get("functionCall") {
            let call_id = match call.get("id").and_then(Value::as_str).filter(|s| !s.is_empty()) {
                Some(id) => id.to_string(),
                None => fallback_call_id(part_index),
            };
            let name = call
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let args = call.get("args").cloned().unwrap_or(json!({}));
            tool_calls.push(ToolCall::new(call_id, name, args));
        }
    }

    let usage = response.get("usageMetadata").map(|u| TokenUsage {
        prompt_tokens: u
            .get("promptTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        completion_tokens: u
            .get("candidatesTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        total_tokens: u
            .get("totalTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
    });

    LlmResponse {
        content: (!content.is_empty()).then_some(content),
        thinking: (!thinking.is_empty()).then_some(thinking),
        reasoning_items: None,
        tool_calls: LlmResponse::normalize_tool_calls(tool_calls),
        finish_reason: response
            .pointer("/candidates/0/finishReason")
            .and_then(Value::as_str)
            .map(str::to_string),
        usage,
        response_id: response
            .get("responseId")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn fallback_call_id(part_index: usize) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("gemini_call_{timestamp}_{part_index}")
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Arc<dyn Tool>],
    ) -> Result<LlmResponse> {
        let body = self.build_request_body(messages, tools);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        debug!(model = %self.model, "calling Gemini API");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("failed to call Gemini API")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error (HTTP {status}): {body}");
        }

        let parsed: Value = response
            .json()
            .await
            .context("failed to parse Gemini response")?;
        Ok(decode(&parsed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
