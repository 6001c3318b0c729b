//! JSON to ToolArgs conversion for LLM function calls
//!
//! Function-calling providers hand over one JSON object per call. The Igloo
//! tools take named arguments, so most keys pass straight through; the few
//! list-valued ones are flattened the way each tool parses them.

use crate::ToolArgs;
use anyhow::{bail, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Render a scalar argument the way `ToolArgs` stores it
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Strings of a string-or-array argument
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn named_passthrough(obj: &Map<String, Value>, skip: &[&str]) -> HashMap<String, String> {
    obj.iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Convert OpenAI/Anthropic function call JSON arguments to ToolArgs format
pub fn json_to_tool_args(tool_name: &str, args: Value) -> Result<ToolArgs> {
    let obj = match args {
        Value::Object(obj) => obj,
        Value::Null => Map::new(),
        other => bail!("Arguments for {} must be a JSON object, got {}", tool_name, other),
    };

    let mut positional_args = Vec::new();
    let named_args = match tool_name {
        "search" => {
            let mut named = named_passthrough(&obj, &["applications"]);
            if let Some(apps) = obj.get("applications") {
                let apps = string_list(apps);
                if !apps.is_empty() {
                    named.insert("applications".to_string(), apps.join(","));
                }
            }
            named
        }
        "fetch" => {
            // One URL or several, each becomes a positional argument
            if let Some(urls) = obj.get("url").or_else(|| obj.get("urls")) {
                positional_args.extend(string_list(urls));
            }
            named_passthrough(&obj, &["url", "urls"])
        }
        _ => named_passthrough(&obj, &[]),
    };

    debug!(
        tool = tool_name,
        positional = positional_args.len(),
        named = named_args.len(),
        "converted tool call arguments"
    );

    Ok(ToolArgs::with_named_args(positional_args, named_args))
}
