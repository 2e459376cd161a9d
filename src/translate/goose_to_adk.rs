//! Goose → ADK translation
//!
//! Stateless mapping of Goose stream events and messages onto ADK events.
//! Anything without an ADK counterpart is dropped, never reported as an error.

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::{
    adk::{AdkEvent, Content, FunctionResponse, Part, UsageMetadata, ROLE_MODEL, ROLE_USER},
    goose::{GooseMessage, MessageContent, Role, StreamEvent, TokenState},
    translate::tools::{goose_tool_call_to_function_call, tool_result_text},
};

/// Author of every event produced from Goose output
pub const AUTHOR_GOOSE: &str = "goose";
/// Author of replayed user messages
pub const AUTHOR_USER: &str = "user";
/// `errorCode` of events produced from Goose errors
pub const GOOSE_ERROR_CODE: &str = "GOOSE_ERROR";

/// Fresh opaque event id
pub fn new_event_id() -> String {
    format!("evt_{}", Uuid::new_v4().simple())
}

/// Fresh opaque invocation id, shared by all events of one turn
pub fn new_invocation_id() -> String {
    format!("inv_{}", Uuid::new_v4().simple())
}

fn base_event(invocation_id: &str, author: &str) -> AdkEvent {
    AdkEvent {
        id: new_event_id(),
        time: chrono::Utc::now().timestamp(),
        invocation_id: invocation_id.to_string(),
        branch: String::new(),
        author: author.to_string(),
        partial: false,
        content: None,
        turn_complete: false,
        interrupted: false,
        error_code: None,
        error_message: None,
        actions: None,
        usage_metadata: None,
    }
}

/// Translate one Goose stream event into at most one ADK event.
///
/// `Ping`, `ModelChange` and unknown events produce nothing.
pub fn translate_stream_event(event: &StreamEvent, invocation_id: &str) -> Option<AdkEvent> {
    match event {
        StreamEvent::Message { message } => Some(AdkEvent {
            content: Some(goose_message_to_content(message)),
            ..base_event(invocation_id, AUTHOR_GOOSE)
        }),
        StreamEvent::Finish { token_state, .. } => Some(AdkEvent {
            turn_complete: true,
            usage_metadata: token_state.as_ref().map(token_state_to_usage),
            ..base_event(invocation_id, AUTHOR_GOOSE)
        }),
        StreamEvent::Error { error } => Some(AdkEvent {
            error_code: Some(GOOSE_ERROR_CODE.to_string()),
            error_message: Some(error.clone()),
            ..base_event(invocation_id, AUTHOR_GOOSE)
        }),
        StreamEvent::ModelChange { model, mode } => {
            debug!(model = %model, mode = %mode, "Goose switched model");
            None
        }
        StreamEvent::Ping | StreamEvent::Unknown => None,
    }
}

/// Convert a Goose message to ADK content. Parts without an ADK counterpart
/// are skipped; the order of the rest is kept.
pub fn goose_message_to_content(message: &GooseMessage) -> Content {
    let role = match message.role {
        Role::Assistant => ROLE_MODEL,
        Role::User => ROLE_USER,
    };

    Content {
        parts: message.content.iter().filter_map(content_to_part).collect(),
        role: role.to_string(),
    }
}

fn content_to_part(content: &MessageContent) -> Option<Part> {
    match content {
        MessageContent::Text { text } => Some(Part::text(text.clone())),
        MessageContent::ToolRequest { id, tool_call, .. } => match tool_call {
            Some(call) => Some(Part {
                function_call: Some(goose_tool_call_to_function_call(id, call)),
                ..Default::default()
            }),
            None => {
                debug!(id = %id, "Skipping tool request without a tool call");
                None
            }
        },
        MessageContent::ToolResponse { id, tool_result } => Some(Part {
            function_response: Some(FunctionResponse {
                id: id.clone(),
                name: String::new(),
                response: json!({ "result": tool_result_text(tool_result.as_ref()) }),
            }),
            ..Default::default()
        }),
        MessageContent::Thinking { .. } | MessageContent::Reasoning { .. } => {
            content.thought_text().map(Part::thought)
        }
        MessageContent::Image { .. }
        | MessageContent::ToolConfirmationRequest { .. }
        | MessageContent::RedactedThinking { .. }
        | MessageContent::Unknown => None,
    }
}

/// Per-turn counters only; accumulated counters are not carried over.
pub fn token_state_to_usage(state: &TokenState) -> UsageMetadata {
    UsageMetadata {
        prompt_token_count: state.input_tokens,
        candidates_token_count: state.output_tokens,
        total_token_count: state.total_tokens,
    }
}

/// Replay a stored Goose message as an ADK event (session history).
pub fn goose_message_to_event(message: &GooseMessage, invocation_id: &str) -> AdkEvent {
    let author = match message.role {
        Role::User => AUTHOR_USER,
        Role::Assistant => AUTHOR_GOOSE,
    };

    AdkEvent {
        id: message.id.clone().unwrap_or_else(new_event_id),
        time: message.created,
        content: Some(goose_message_to_content(message)),
        ..base_event(invocation_id, author)
    }
}
