//! Tool Executor
//!
//! The single trust boundary between arbitrary tool code and the agent loop.
//! A tool failure of any kind becomes a structured [`ToolResult`]; nothing a
//! tool does can kill the agent.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::tool::Tool;
use crate::types::ToolResult;

/// Look up `name` in `tools` and invoke it with `args`.
///
/// Unknown names and thrown failures are both mapped to `success: false`
/// results; a tool's own `success: false` result is returned verbatim.
pub async fn execute(tools: &[Arc<dyn Tool>], name: &str, args: Value) -> ToolResult {
    let Some(tool) = tools.iter().find(|t| t.name() == name) else {
        warn!(tool = name, "tool call for unknown tool");
        return ToolResult::error(format!("Unknown tool: {name}"));
    };

    debug!(tool = name, "executing tool");
    match tool.execute(args).await {
        Ok(result) => result,
        Err(err) => {
            warn!(tool = name, err = %err, "tool execution failed");
            ToolResult::error(format!(
                "Tool execution failed: {name}: {err}\n\nTraceback:\n{}",
                render_chain(&err)
            ))
        }
    }
}

/// The anyhow cause chain, one frame per line, outermost first.
fn render_chain(err: &anyhow::Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use async_trait::async_trait;
    use serde_json::json;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }
        fn description(&self) -> &str {
            "Uppercase the input"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }
        async fn execute(&self, args: Value) -> Result<ToolResult> {
            let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
            Ok(ToolResult::ok(text.to_uppercase()))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value) -> Result<ToolResult> {
            Err(anyhow::anyhow!("disk on fire")).context("opening scratch file")
        }
    }

    struct SoftFailTool;

    #[async_trait]
    impl Tool for SoftFailTool {
        fn name(&self) -> &str {
            "soft"
        }
        fn description(&self) -> &str {
            "Reports its own failure"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value) -> Result<ToolResult> {
            Ok(ToolResult::error("quota exceeded"))
        }
    }

    fn toolbox() -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(UpperTool), Arc::new(FailingTool), Arc::new(SoftFailTool)]
    }

    #[tokio::test]
    async fn runs_matching_tool() {
        let result = execute(&toolbox(), "upper", json!({"text": "abc"})).await;
        assert!(result.success);
        assert_eq!(result.content, "ABC");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_not_thrown() {
        let result = execute(&toolbox(), "missing", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.content, "");
        assert_eq!(result.error.as_deref(), Some("Unknown tool: missing"));
    }

    #[tokio::test]
    async fn thrown_failure_is_wrapped_with_traceback() {
        let result = execute(&toolbox(), "broken", json!({})).await;
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.starts_with("Tool execution failed: broken:"));
        assert!(error.contains("Traceback:"));
        assert!(error.contains("opening scratch file"));
        assert!(error.contains("disk on fire"));
    }

    #[tokio::test]
    async fn tool_reported_failure_passes_verbatim() {
        let result = execute(&toolbox(), "soft", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("quota exceeded"));
    }
}
