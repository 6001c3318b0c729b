//! Tool execution orchestration for LLM function calls
//!
//! Runs a batch of provider tool calls against a registry, one after the
//! other. A call that fails (bad JSON, unknown tool, tool error) becomes an
//! error entry; the rest of the batch still runs.

use crate::ToolRegistry;
use serde_json::Value;
use tracing::{info, warn};

use super::converter::json_to_tool_args;

/// Result from a single tool execution
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    /// Tool call ID (for provider correlation)
    pub tool_call_id: String,
    pub tool_name: String,
    /// Result content or error message
    pub content: String,
    pub success: bool,
}

/// Simple tool call representation for execution
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// JSON arguments as string
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Optional callback for logging and custom behavior
pub trait ExecutionCallback: Send {
    /// Called before executing a tool
    fn on_tool_start(&mut self, tool_name: &str, args: &str);

    /// Called after tool execution (success or failure)
    fn on_tool_complete(&mut self, tool_name: &str, args: &str, result: &str, success: bool);

    /// Called for compact logging (JSON format)
    fn on_compact_log(&mut self, compact_json: &str);
}

/// Default no-op callback
pub struct NoOpCallback;

impl ExecutionCallback for NoOpCallback {
    fn on_tool_start(&mut self, _tool_name: &str, _args: &str) {}
    fn on_tool_complete(&mut self, _tool_name: &str, _args: &str, _result: &str, _success: bool) {}
    fn on_compact_log(&mut self, _compact_json: &str) {}
}

async fn execute_one(
    registry: &ToolRegistry,
    tool_call: ToolCallRequest,
    callback: &mut dyn ExecutionCallback,
) -> ToolExecutionResult {
    let ToolCallRequest {
        id,
        name,
        arguments,
    } = tool_call;

    let compact_json = serde_json::json!({
        "name": name,
        "arguments": serde_json::from_str::<Value>(&arguments).unwrap_or(serde_json::json!({}))
    });
    callback.on_compact_log(&compact_json.to_string());
    callback.on_tool_start(&name, &arguments);

    let outcome = match serde_json::from_str::<Value>(&arguments) {
        Err(e) => Err(format!("Failed to parse tool arguments for {}: {}", name, e)),
        Ok(args) => match json_to_tool_args(&name, args) {
            Err(e) => Err(format!("Failed to convert arguments for {}: {}", name, e)),
            Ok(tool_args) => registry
                .execute_tool(&name, &tool_args)
                .await
                .map(|result| result.message)
                .map_err(|e| format!("Tool execution failed for {}: {}", name, e)),
        },
    };

    let (content, success) = match outcome {
        Ok(message) => {
            info!(tool = %name, call_id = %id, "tool call succeeded");
            (message, true)
        }
        Err(error) => {
            warn!(tool = %name, call_id = %id, %error, "tool call failed");
            (error, false)
        }
    };
    callback.on_tool_complete(&name, &arguments, &content, success);

    ToolExecutionResult {
        tool_call_id: id,
        tool_name: name,
        content,
        success,
    }
}

/// Execute tool calls and return individual results, one per call in order.
/// These can be sent as separate tool messages to LLM providers.
pub async fn execute_tool_calls_structured(
    registry: &ToolRegistry,
    tool_calls: Vec<ToolCallRequest>,
    callback: &mut dyn ExecutionCallback,
) -> Vec<ToolExecutionResult> {
    let mut results = Vec::with_capacity(tool_calls.len());
    for tool_call in tool_calls {
        results.push(execute_one(registry, tool_call, callback).await);
    }
    results
}

/// Execute tool calls and return one combined result string
pub async fn execute_tool_calls(
    registry: &ToolRegistry,
    tool_calls: Vec<ToolCallRequest>,
    callback: &mut dyn ExecutionCallback,
) -> String {
    execute_tool_calls_structured(registry, tool_calls, callback)
        .await
        .into_iter()
        .map(|r| {
            let label = if r.success { "Result" } else { "Error" };
            format!("Tool: {}\n{}: {}", r.tool_name, label, r.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
