//! LLM integration for the Igloo tools
//!
//! Utilities for driving the tools from providers that use function calling
//! with JSON arguments (OpenAI, Anthropic and similar).
//!
//! ## Features
//!
//! - **JSON Conversion**: Convert function call JSON to `ToolArgs`
//! - **Tool Execution**: Execute batches of tool calls with logging callbacks

pub mod converter;
pub mod executor;

// Re-export main types
pub use converter::json_to_tool_args;
pub use executor::{
    execute_tool_calls, execute_tool_calls_structured, ExecutionCallback, NoOpCallback,
    ToolCallRequest, ToolExecutionResult,
};
