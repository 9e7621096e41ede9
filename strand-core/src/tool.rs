//! Tool Trait
//!
//! A tool advertises a name, description, and JSON Schema, and executes with
//! parsed arguments. The four view methods render the schema into each wire
//! protocol's tool-declaration shape so adapters never rebuild it themselves.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::types::ToolResult;

/// A callable tool exposed to the LLM.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as advertised to the model.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters(&self) -> Value;

    /// Run the tool with parsed arguments.
    async fn execute(&self, args: Value) -> Result<ToolResult>;

    /// Anthropic Messages tool declaration (`input_schema`).
    fn to_anthropic_schema(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "input_schema": self.parameters(),
        })
    }

    /// OpenAI Chat Completions declaration (nested `function` form).
    fn to_openai_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }

    /// OpenAI Responses declaration (flat form, explicit `strict: null`).
    fn to_responses_schema(&self) -> Value {
        json!({
            "type": "function",
            "name": self.name(),
            "description": self.description(),
            "parameters": self.parameters(),
            "strict": null,
        })
    }

    /// Gemini function declaration. The JSON Schema flows through unchanged
    /// via `parametersJsonSchema`.
    fn to_gemini_schema(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "parametersJsonSchema": self.parameters(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
