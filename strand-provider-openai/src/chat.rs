//! OpenAI Chat Completions Adapter
//!
//! Standard chat format: a flat `messages` array of role-tagged turns.
//! A single tool-call `id` serves as both item and correlation id, and
//! reasoning is not modeled by this wire shape, so it round-trips as `None`.
//! Also speaks to OpenAI-compatible endpoints behind a custom base URL.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use strand_core::{
    LlmProvider, LlmResponse, Message, MessageContent, Role, TokenUsage, Tool, ToolCall,
};

/// OpenAI Chat Completions provider.
pub struct OpenAiChatProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiChatProvider {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(crate::DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    fn build_request_body(&self, messages: &[Message], tools: &[Arc<dyn Tool>]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": encode(messages),
            "stream": false,
        });
        if !tools.is_empty() {
            let declarations: Vec<Value> = tools.iter().map(|t| t.to_openai_schema()).collect();
            body["tools"] = json!(declarations);
        }
        body
    }
}

/// Encode the canonical message list into the wire `messages` array. Pure.
pub fn encode(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| match msg.role {
            Role::System => json!({"role": "system", "content": msg.text()}),
            Role::User => match &msg.content {
                MessageContent::Text(t) => json!({"role": "user", "content": t}),
                MessageContent::Blocks(blocks) => json!({"role": "user", "content": blocks}),
            },
            Role::Assistant => encode_assistant(msg),
            Role::Tool => json!({
                "role": "tool",
                "tool_call_id": msg.call_id.as_deref().unwrap_or_default(),
                "content": msg.text(),
            }),
        })
        .collect()
}

fn encode_assistant(msg: &Message) -> Value {
    let mut turn = json!({"role": "assistant"});
    if msg.text().is_empty() {
        turn["content"] = Value::Null;
    } else {
        turn["content"] = json!(msg.text());
    }
    if let Some(calls) = msg.tool_calls.as_ref().filter(|c| !c.is_empty()) {
        let wire_calls: Vec<Value> = calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.call_id,
                    "type": "function",
                    "function": {
                        "name": call.function.name,
                        "arguments": call.function.arguments.to_string(),
                    },
                })
            })
            .collect();
        turn["tool_calls"] = json!(wire_calls);
    }
    turn
}

/// Decode a Chat Completions response into the canonical shape. Pure; fails
/// only on protocol violations (malformed tool-call argument JSON).
pub fn decode(response: &Value) -> Result<LlmResponse> {
    let message = response
        .pointer("/choices/0/message")
        .context("chat completion has no choices")?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let mut tool_calls = Vec::new();
    for call in message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|a| a.as_slice())
        .unwrap_or_default()
    {
        // Only function calls are modeled; other kinds are skipped.
        if call.get("type").and_then(Value::as_str) != Some("function") {
            continue;
        }
        let id = call
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let name = call
            .pointer("/function/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let raw_arguments = call
            .pointer("/function/arguments")
            .and_then(Value::as_str)
            .unwrap_or("{}");
        let arguments: Value = serde_json::from_str(raw_arguments)
            .with_context(|| format!("malformed tool-call arguments for '{name}'"))?;
        tool_calls.push(ToolCall::new(id, name, arguments));
    }

    let usage = response.get("usage").map(|u| TokenUsage {
        prompt_tokens: u
            .get("prompt_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        completion_tokens: u
            .get("completion_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        total_tokens: u
            .get("total_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
    });

    Ok(LlmResponse {
        content,
        thinking: None,
        reasoning_items: None,
        tool_calls: LlmResponse::normalize_tool_calls(tool_calls),
        finish_reason: response
            .pointer("/choices/0/finish_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
        usage,
        response_id: response
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[async_trait]
impl LlmProvider for OpenAiChatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Arc<dyn Tool>],
    ) -> Result<LlmResponse> {
        let body = self.build_request_body(messages, tools);
        let url = format!("{}/v1/chat/completions", self.base_url);

        debug!(model = %self.model, url = %url, "calling Chat Completions API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("failed to call Chat Completions API")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error (HTTP {status}): {body}");
        }

        let parsed: Value = response
            .json()
            .await
            .context("failed to parse Chat Completions response")?;
        decode(&parsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_one_to_one() {
        let wire = encode(&[
            Message::system("sys"),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::tool("out", "call_1", "f"),
        ]);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[1]["role"], "user");
        assert_eq!(wire[2]["role"], "assistant");
        assert_eq!(wire[3]["role"], "tool");
        assert_eq!(wire[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn assistant_tool_calls_stringify_arguments() {
        let mut msg = Message::assistant("");
        msg.tool_calls = Some(vec![ToolCall::new(
            "call_1",
            "lookup",
            json!({"q": "rust"}),
        )]);
        let wire = encode(std::slice::from_ref(&msg));
        assert!(wire[0]["content"].is_null());
        let call = &wire[0]["tool_calls"][0];
        assert_eq!(call["id"], "call_1");
        assert_eq!(call["function"]["arguments"], r#"{"q":"rust"}"#);
        assert!(call["function"]["arguments"].is_string());
    }

    #[test]
    fn decode_parses_arguments_back_to_object() {
        let wire = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "lookup", "arguments": "{\"q\":\"rust\"}"},
                    }],
                },
                "finish_reason": "tool_calls",
            }],
            "usage": {"prompt_tokens": 11, "completion_tokens": 3, "total_tokens": 14},
        });
        let decoded = decode(&wire).unwrap();
        let calls = decoded.tool_calls.unwrap();
        assert_eq!(calls[0].call_id, "call_1");
        assert_eq!(calls[0].function.arguments["q"], "rust");
        assert_eq!(decoded.finish_reason.as_deref(), Some("tool_calls"));
        assert_eq!(decoded.usage.unwrap().total_tokens, 14);
        assert!(decoded.thinking.is_none());
    }

    #[test]
    fn non_function_calls_are_ignored() {
        let wire = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "done",
                    "tool_calls": [{"id": "x", "type": "custom", "custom": {}}],
                },
                "finish_reason": "stop",
            }],
        });
        let decoded = decode(&wire).unwrap();
        assert!(decoded.tool_calls.is_none());
        assert_eq!(decoded.content.as_deref(), Some("done"));
    }

    #[test]
    fn malformed_arguments_propagate() {
        let wire = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "lookup", "arguments": "{not json"},
                    }],
                },
                "finish_reason": "tool_calls",
            }],
        });
        let err = decode(&wire).unwrap_err();
        assert!(err.to_string().contains("lookup"));
    }

    #[test]
    fn call_id_survives_decode_then_encode() {
        let wire = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_7",
                        "type": "function",
                        "function": {"name": "f", "arguments": "{\"x\":1}"},
                    }],
                },
                "finish_reason": "tool_calls",
            }],
        });
        let decoded = decode(&wire).unwrap();
        let turn = Message::from_response(&decoded);
        let re_encoded = encode(std::slice::from_ref(&turn));
        assert_eq!(re_encoded[0]["tool_calls"][0]["id"], "call_7");
    }
}
