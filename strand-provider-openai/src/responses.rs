//! OpenAI Responses Adapter
//!
//! The Responses wire shape is a flat sequence of typed items (reasoning,
//! message, function_call, function_call_output) rather than role-tagged
//! turns. One canonical assistant message can expand into several wire
//! items, and tool calls carry two ids: the item `id` and the correlation
//! `call_id`. Reasoning items are re-sent by id, which is why the canonical
//! model retains them.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use strand_core::{
    LlmProvider, LlmResponse, Message, MessageContent, ReasoningItem, Role, TokenUsage, Tool,
    ToolCall,
};

/// OpenAI Responses API provider.
pub struct OpenAiResponsesProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiResponsesProvider {
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
        let (instructions, input) = encode(messages);

        let mut body = json!({
            "model": self.model,
            "input": input,
            "stream": false,
        });
        if let Some(instructions) = instructions {
            body["instructions"] = json!(instructions);
        }
        if !tools.is_empty() {
            let declarations: Vec<Value> =
                tools.iter().map(|t| t.to_responses_schema()).collect();
            body["tools"] = json!(declarations);
        }
        body
    }
}

/// Encode the canonical message list into the top-level `instructions`
/// string and the flat `input` item sequence. Pure.
pub fn encode(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut instructions = None;
    let mut input = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => {
                instructions = Some(msg.text().to_string());
            }
            Role::User => match &msg.content {
                MessageContent::Text(t) => input.push(json!({
                    "role": "user",
                    "content": [{"type": "input_text", "text": t}],
                })),
                MessageContent::Blocks(blocks) => input.push(json!({
                    "role": "user",
                    "content": blocks,
                })),
            },
            Role::Assistant => encode_assistant(msg, &mut input),
            Role::Tool => input.push(json!({
                "type": "function_call_output",
                "call_id": msg.call_id.as_deref().unwrap_or_default(),
                "output": msg.text(),
            })),
        }
    }

    (instructions, input)
}

/// Expand one assistant message into its wire items: reasoning first, then
/// function calls, then the message item if the assistant had text.
fn encode_assistant(msg: &Message, input: &mut Vec<Value>) {
    for item in msg.reasoning_items.iter().flatten() {
        let summary: Vec<Value> = if item.summary.is_empty() {
            Vec::new()
        } else {
            vec![json!({"type": "summary_text", "text": item.summary})]
        };
        input.push(json!({
            "type": "reasoning",
            "id": item.id,
            "summary": summary,
        }));
    }

    for call in msg.tool_calls.iter().flatten() {
        let mut wire_call = json!({
            "type": "function_call",
            "call_id": call.call_id,
            "name": call.function.name,
            "arguments": call.function.arguments.to_string(),
        });
        if let Some(id) = &call.id {
            wire_call["id"] = json!(id);
        }
        input.push(wire_call);
    }

    if !msg.text().is_empty() {
        input.push(json!({
            "type": "message",
            "role": "assistant",
            "content": [{"type": "output_text", "text": msg.text()}],
        }));
    }
}

/// Decode a Responses API payload into the canonical shape. Pure; fails
/// only on protocol violations (malformed function-call argument JSON).
pub fn decode(response: &Value) -> Result<LlmResponse> {
    let mut content = String::new();
    let mut thinking_parts = Vec::new();
    let mut reasoning_items = Vec::new();
    let mut tool_calls = Vec::new();

    for item in response
        .get("output")
        .and_then(Value::as_array)
        .map(|a| a.as_slice())
        .unwrap_or_default()
    {
        match item.get("type").and_then(Value::as_str).unwrap_or_default() {
            "message" => {
                for part in item
                    .get("content")
                    .and_then(Value::as_array)
                    .map(|a| a.as_slice())
                    .unwrap_or_default()
                {
                    if part.get("type").and_then(Value::as_str) == Some("output_text") {
                        content
                            .push_str(part.get("text").and_then(Value::as_str).unwrap_or_default());
                    }
                }
            }
            "reasoning" => {
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let texts: Vec<&str> = item
                    .get("summary")
                    .and_then(Value::as_array)
                    .map(|a| a.as_slice())
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|s| s.get("text").and_then(Value::as_str))
                    .collect();
                let summary = texts.join("\n");
                if !summary.is_empty() {
                    thinking_parts.push(summary.clone());
                }
                reasoning_items.push(ReasoningItem { id, summary });
            }
            "function_call" => {
                let name = item
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let call_id = item
                    .get("call_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let raw_arguments = item
                    .get("arguments")
                    .and_then(Value::as_str)
                    .unwrap_or("{}");
                let arguments: Value = serde_json::from_str(raw_arguments)
                    .with_context(|| format!("malformed function-call arguments for '{name}'"))?;
                let mut call = ToolCall::new(call_id, name, arguments);
                if let Some(id) = item.get("id").and_then(Value::as_str) {
                    call = call.with_id(id);
                }
                tool_calls.push(call);
            }
            _ => {}
        }
    }

    let usage = response.get("usage").map(|u| TokenUsage {
        prompt_tokens: u
            .get("input_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        completion_tokens: u
            .get("output_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        total_tokens: u
            .get("total_tokens")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
    });

    let thinking = thinking_parts.join("\n");
    Ok(LlmResponse {
        content: (!content.is_empty()).then_some(content),
        thinking: (!thinking.is_empty()).then_some(thinking),
        reasoning_items: (!reasoning_items.is_empty()).then_some(reasoning_items),
        tool_calls: LlmResponse::normalize_tool_calls(tool_calls),
        finish_reason: response
            .get("status")
            .and_then(Value::as_str)
            .map(map_status),
        usage,
        response_id: response
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Map the response status onto the canonical finish reason.
fn map_status(status: &str) -> String {
    match status {
        "completed" => "stop",
        "incomplete" => "length",
        "failed" => "error",
        "cancelled" => "cancelled",
        other => other,
    }
    .to_string()
}

#[async_trait]
impl LlmProvider for OpenAiResponsesProvider {
    fn name(&self) -> &str {
        "openai-responses"
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Arc<dyn Tool>],
    ) -> Result<LlmResponse> {
        let body = self.build_request_body(messages, tools);
        let url = format!("{}/v1/responses", self.base_url);

        debug!(model = %self.model, url = %url, "calling Responses API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("failed to call Responses API")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error (HTTP {status}): {body}");
        }

        let parsed: Value = response
            .json()
            .await
            .context("failed to parse Responses payload")?;
        decode(&parsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_assistant() -> Message {
        let mut msg = Message::assistant("calling the tool now");
        msg.thinking = Some("plan the lookup".into());
        msg.reasoning_items = Some(vec![ReasoningItem {
            id: "rs_1".into(),
            summary: "plan the lookup".into(),
        }]);
        msg.tool_calls = Some(vec![ToolCall::new(
            "call_9",
            "lookup",
            json!({"q": "rust"}),
        )
        .with_id("fc_9")]);
        msg
    }

    #[test]
    fn system_becomes_instructions() {
        let (instructions, input) = encode(&[Message::system("be terse"), Message::user("hi")]);
        assert_eq!(instructions.as_deref(), Some("be terse"));
        assert_eq!(input.len(), 1);
        assert_eq!(input[0]["role"], "user");
        assert_eq!(input[0]["content"][0]["type"], "input_text");
    }

    #[test]
    fn assistant_expands_to_items_in_order() {
        let (_, input) = encode(std::slice::from_ref(&rich_assistant()));
        assert_eq!(input.len(), 3);
        assert_eq!(input[0]["type"], "reasoning");
        assert_eq!(input[0]["id"], "rs_1");
        assert_eq!(input[1]["type"], "function_call");
        assert_eq!(input[1]["id"], "fc_9");
        assert_eq!(input[1]["call_id"], "call_9");
        assert!(input[1]["arguments"].is_string());
        assert_eq!(input[2]["type"], "message");
        assert_eq!(input[2]["content"][0]["type"], "output_text");
    }

    #[test]
    fn tool_message_becomes_function_call_output() {
        let (_, input) = encode(&[Message::tool("42", "call_9", "lookup")]);
        assert_eq!(input[0]["type"], "function_call_output");
        assert_eq!(input[0]["call_id"], "call_9");
        assert_eq!(input[0]["output"], "42");
    }

    fn wire_response() -> Value {
        json!({
            "id": "resp_1",
            "status": "completed",
            "output": [
                {"type": "reasoning", "id": "rs_1",
                 "summary": [{"type": "summary_text", "text": "think first"}]},
                {"type": "function_call", "id": "fc_9", "call_id": "call_9",
                 "name": "lookup", "arguments": "{\"q\":\"rust\"}"},
                {"type": "message", "role": "assistant",
                 "content": [{"type": "output_text", "text": "on it"}]},
            ],
            "usage": {"input_tokens": 30, "output_tokens": 12, "total_tokens": 42},
        })
    }

    #[test]
    fn decode_collects_all_item_kinds() {
        let decoded = decode(&wire_response()).unwrap();
        assert_eq!(decoded.content.as_deref(), Some("on it"));
        assert_eq!(decoded.thinking.as_deref(), Some("think first"));
        let items = decoded.reasoning_items.as_ref().unwrap();
        assert_eq!(items[0].id, "rs_1");
        let calls = decoded.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].call_id, "call_9");
        assert_eq!(calls[0].id.as_deref(), Some("fc_9"));
        assert_eq!(calls[0].function.arguments["q"], "rust");
        assert_eq!(decoded.finish_reason.as_deref(), Some("stop"));
        assert_eq!(decoded.usage.as_ref().unwrap().total_tokens, 42);
        assert_eq!(decoded.response_id.as_deref(), Some("resp_1"));
    }

    #[test]
    fn both_ids_and_reasoning_ids_survive_round_trip() {
        let decoded = decode(&wire_response()).unwrap();
        let turn = Message::from_response(&decoded);
        let (_, input) = encode(std::slice::from_ref(&turn));

        let reasoning = input.iter().find(|i| i["type"] == "reasoning").unwrap();
        assert_eq!(reasoning["id"], "rs_1");
        let call = input.iter().find(|i| i["type"] == "function_call").unwrap();
        assert_eq!(call["id"], "fc_9");
        assert_eq!(call["call_id"], "call_9");
    }

    #[test]
    fn status_mapping_is_canonical() {
        for (status, expected) in [
            ("completed", "stop"),
            ("incomplete", "length"),
            ("failed", "error"),
            ("cancelled", "cancelled"),
        ] {
            let decoded = decode(&json!({"status": status, "output": []})).unwrap();
            assert_eq!(decoded.finish_reason.as_deref(), Some(expected));
        }
    }

    #[test]
    fn malformed_arguments_propagate() {
        let wire = json!({
            "status": "completed",
            "output": [
                {"type": "function_call", "call_id": "c", "name": "lookup",
                 "arguments": "{oops"},
            ],
        });
        assert!(decode(&wire).is_err());
    }

    #[test]
    fn reasoning_without_summary_still_keeps_id() {
        let wire = json!({
            "status": "completed",
            "output": [{"type": "reasoning", "id": "rs_2", "summary": []}],
        });
        let decoded = decode(&wire).unwrap();
        assert!(decoded.thinking.is_none());
        assert_eq!(decoded.reasoning_items.unwrap()[0].id, "rs_2");
    }
}
