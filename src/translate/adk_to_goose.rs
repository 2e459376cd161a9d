//! ADK → Goose translation of caller messages

use crate::{
    adk::{Content, ROLE_MODEL},
    goose::{GooseMessage, MessageContent, MessageMetadata, ReplyRequest, Role},
    translate::tools::{function_call_to_goose_tool_call, function_response_to_tool_result},
};

/// Convert ADK content into a Goose message.
///
/// Each ADK part yields one Goose item per populated field, in field order:
/// text, function call, function response, inline data.
pub fn adk_content_to_goose_message(content: &Content) -> GooseMessage {
    let role = if content.role == ROLE_MODEL {
        Role::Assistant
    } else {
        Role::User
    };

    let mut items = Vec::with_capacity(content.parts.len());
    for part in &content.parts {
        if !part.text.is_empty() {
            items.push(MessageContent::text(part.text.clone()));
        }
        if let Some(call) = &part.function_call {
            items.push(MessageContent::ToolRequest {
                id: call.id.clone(),
                tool_call: Some(function_call_to_goose_tool_call(call)),
                metadata: None,
            });
        }
        if let Some(response) = &part.function_response {
            items.push(MessageContent::ToolResponse {
                id: response.id.clone(),
                tool_result: Some(function_response_to_tool_result(response)),
            });
        }
        if let Some(blob) = &part.inline_data {
            // Both sides carry the bytes base64 encoded.
            items.push(MessageContent::Image {
                data: blob.data.clone(),
                mime_type: blob.mime_type.clone(),
            });
        }
    }

    GooseMessage {
        id: None,
        role,
        created: chrono::Utc::now().timestamp(),
        content: items,
        metadata: Some(MessageMetadata::visible()),
    }
}

/// Build the `/reply` request for one turn of a backend session
pub fn run_sse_request_to_reply(backend_id: &str, content: &Content) -> ReplyRequest {
    ReplyRequest {
        user_message: adk_content_to_goose_message(content),
        session_id: backend_id.to_string(),
        conversation_so_far: None,
    }
}
