//! Tool call conversions between ADK function parts and Goose tool content

use serde_json::Value;

use crate::{
    adk::{FunctionCall, FunctionResponse},
    goose::{MessageContent, ToolCall, ToolResult},
};

/// Goose tool call → ADK function call, keeping the call id
pub fn goose_tool_call_to_function_call(id: &str, call: &ToolCall) -> FunctionCall {
    FunctionCall {
        id: id.to_string(),
        name: call.name.clone(),
        args: call.arguments.clone(),
    }
}

/// ADK function call → Goose tool call
pub fn function_call_to_goose_tool_call(call: &FunctionCall) -> ToolCall {
    ToolCall {
        name: call.name.clone(),
        arguments: call.args.clone(),
    }
}

/// ADK function response → Goose tool result carrying the JSON-encoded
/// response as a single text item. Never marked as an error.
pub fn function_response_to_tool_result(response: &FunctionResponse) -> ToolResult {
    let text = match &response.response {
        Value::Null => String::new(),
        value => value.to_string(),
    };

    ToolResult {
        content: vec![MessageContent::text(text)],
        is_error: false,
        structured_content: None,
    }
}

/// Text summary of a Goose tool result: the first non-empty text item, else
/// the JSON of the structured payload, else an empty string.
pub fn tool_result_text(result: Option<&ToolResult>) -> String {
    let Some(result) = result else {
        return String::new();
    };

    let first_text = result.content.iter().find_map(|c| match c {
        MessageContent::Text { text } if !text.is_empty() => Some(text.clone()),
        _ => None,
    });

    first_text
        .or_else(|| result.structured_content.as_ref().map(Value::to_string))
        .unwrap_or_default()
}
