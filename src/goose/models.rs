//! Goose agent API data models
//!
//! Request/response types for the Goose REST API and the event union carried
//! by its `/reply` SSE stream. Decoding is lenient: unknown event and
//! content tags decode to an `Unknown` variant, missing or `null` fields fall
//! back to defaults, and a content item that does not fit its tag degrades to
//! `Unknown` on its own instead of failing the whole message.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

// =============================================================================
// Lenient decoding helpers
// =============================================================================

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode content items one by one. Anything that is not an array yields no
/// items.
fn lenient_contents<'de, D>(deserializer: D) -> Result<Vec<MessageContent>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(decode_contents(items)),
        _ => Ok(Vec::new()),
    }
}

fn decode_contents(items: Vec<Value>) -> Vec<MessageContent> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).unwrap_or_else(|e| {
                debug!(error = %e, "Keeping malformed content item as unknown");
                MessageContent::Unknown
            })
        })
        .collect()
}

/// Goose wraps tool payloads in a `{"status": ..., "value" | "error": ...}`
/// envelope; older builds send the payload bare.
fn strip_status_envelope(value: Value) -> Result<Value, String> {
    match value {
        Value::Object(mut map) if map.contains_key("status") => {
            if let Some(inner) = map.remove("value") {
                Ok(inner)
            } else {
                let error = map
                    .remove("error")
                    .map(|e| match e {
                        Value::String(text) => text,
                        other => other.to_string(),
                    })
                    .unwrap_or_default();
                Err(error)
            }
        }
        other => Ok(other),
    }
}

fn lenient_payload<T: DeserializeOwned>(value: Value) -> Option<T> {
    serde_json::from_value(value)
        .map_err(|e| debug!(error = %e, "Dropping malformed tool payload"))
        .ok()
}

fn lenient_tool_call<'de, D>(deserializer: D) -> Result<Option<ToolCall>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match strip_status_envelope(Value::deserialize(deserializer)?) {
        Ok(Value::Null) => None,
        Ok(value) => lenient_payload(value),
        Err(error) => {
            debug!(error = %error, "Tool request carries a failed tool call");
            None
        }
    })
}

fn lenient_tool_result<'de, D>(deserializer: D) -> Result<Option<ToolResult>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match strip_status_envelope(Value::deserialize(deserializer)?) {
        Ok(Value::Null) => None,
        // Enveloped results carry the content list directly.
        Ok(Value::Array(items)) => Some(ToolResult {
            content: decode_contents(items),
            ..Default::default()
        }),
        Ok(value) => lenient_payload(value),
        Err(error) => Some(ToolResult {
            content: vec![MessageContent::text(error)],
            is_error: true,
            structured_content: None,
        }),
    })
}

// =============================================================================
// Messages
// =============================================================================

/// Author of a Goose message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in a Goose conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GooseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    /// Unix timestamp (seconds)
    #[serde(default, deserialize_with = "null_as_default")]
    pub created: i64,
    #[serde(default, deserialize_with = "lenient_contents")]
    pub content: Vec<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// Visibility flags of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageMetadata {
    #[serde(default, alias = "userVisible", deserialize_with = "null_as_default")]
    pub user_visible: bool,
    #[serde(default, alias = "agentVisible", deserialize_with = "null_as_default")]
    pub agent_visible: bool,
}

impl MessageMetadata {
    /// Visible to both the user and the agent
    pub fn visible() -> Self {
        Self {
            user_visible: true,
            agent_visible: true,
        }
    }
}

/// One typed unit of a Goose message payload, discriminated by `type`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
    },
    Image {
        /// Base64 encoded image bytes
        #[serde(default, deserialize_with = "null_as_default")]
        data: String,
        #[serde(default, rename = "mimeType", deserialize_with = "null_as_default")]
        mime_type: String,
    },
    ToolRequest {
        #[serde(default, deserialize_with = "null_as_default")]
        id: String,
        #[serde(
            default,
            rename = "toolCall",
            skip_serializing_if = "Option::is_none",
            deserialize_with = "lenient_tool_call"
        )]
        tool_call: Option<ToolCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },
    ToolResponse {
        #[serde(default, deserialize_with = "null_as_default")]
        id: String,
        #[serde(
            default,
            rename = "toolResult",
            skip_serializing_if = "Option::is_none",
            deserialize_with = "lenient_tool_result"
        )]
        tool_result: Option<ToolResult>,
    },
    ToolConfirmationRequest {
        #[serde(default, deserialize_with = "null_as_default")]
        id: String,
        #[serde(default, rename = "toolName", deserialize_with = "null_as_default")]
        tool_name: String,
        #[serde(default)]
        arguments: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
    },
    Thinking {
        #[serde(default, deserialize_with = "null_as_default")]
        thinking: String,
        /// Opaque signature the model uses to verify its own reasoning
        #[serde(default, deserialize_with = "null_as_default")]
        signature: String,
        #[serde(
            default,
            skip_serializing_if = "String::is_empty",
            deserialize_with = "null_as_default"
        )]
        text: String,
    },
    RedactedThinking {
        #[serde(default, deserialize_with = "null_as_default")]
        data: String,
    },
    Reasoning {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
        #[serde(
            default,
            skip_serializing_if = "String::is_empty",
            deserialize_with = "null_as_default"
        )]
        thinking: String,
    },
    /// Any tag this bridge does not know about
    #[serde(other)]
    Unknown,
}

impl MessageContent {
    /// Plain text content
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text { text: text.into() }
    }

    /// Text of a thinking or reasoning part: the `thinking` field, or `text`
    /// when that is empty. `None` for every other variant.
    pub fn thought_text(&self) -> Option<&str> {
        match self {
            MessageContent::Thinking { thinking, text, .. }
            | MessageContent::Reasoning { thinking, text } => {
                if thinking.is_empty() {
                    Some(text.as_str())
                } else {
                    Some(thinking.as_str())
                }
            }
            _ => None,
        }
    }
}

/// Tool invocation carried by a tool request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Output of a tool execution
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "lenient_contents"
    )]
    pub content: Vec<MessageContent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

// =============================================================================
// Stream events
// =============================================================================

/// Event emitted on the `/reply` SSE stream, discriminated by `type`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StreamEvent {
    Message {
        message: GooseMessage,
    },
    Finish {
        #[serde(default, deserialize_with = "null_as_default")]
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_state: Option<TokenState>,
    },
    Error {
        #[serde(default, deserialize_with = "null_as_default")]
        error: String,
    },
    Ping,
    ModelChange {
        #[serde(default, deserialize_with = "null_as_default")]
        model: String,
        #[serde(default, deserialize_with = "null_as_default")]
        mode: String,
    },
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Short name used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Message { .. } => "message",
            StreamEvent::Finish { .. } => "finish",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Ping => "ping",
            StreamEvent::ModelChange { .. } => "model_change",
            StreamEvent::Unknown => "unknown",
        }
    }

    /// Whether this event marks the end of a turn on the Goose side
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Finish { .. } | StreamEvent::Error { .. })
    }
}

/// Token accounting reported with a finished turn
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenState {
    #[serde(default)]
    pub input_tokens: i32,
    #[serde(default)]
    pub output_tokens: i32,
    #[serde(default)]
    pub total_tokens: i32,
    #[serde(default)]
    pub accumulated_input_tokens: i32,
    #[serde(default)]
    pub accumulated_output_tokens: i32,
    #[serde(default)]
    pub accumulated_total_tokens: i32,
}

// =============================================================================
// Agent lifecycle
// =============================================================================

/// Payload for `POST /agent/start`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartAgentRequest {
    pub working_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
}

/// Session object returned by `/agent/start` and `/agent/resume`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSession {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub working_dir: String,
}

/// Payload for `POST /agent/stop`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopAgentRequest {
    pub session_id: String,
}

/// Payload for `POST /agent/resume`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumeAgentRequest {
    pub session_id: String,
    pub load_model_and_extensions: bool,
}

/// Payload for `POST /reply`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplyRequest {
    pub user_message: GooseMessage,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_so_far: Option<Vec<GooseMessage>>,
}

// =============================================================================
// Session history
// =============================================================================

/// Response of `GET /sessions`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionListResponse {
    #[serde(default)]
    pub sessions: Vec<SessionInfo>,
}

/// One entry of a session listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SessionMetadata>,
}

/// Descriptive details of a session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionMetadata {
    #[serde(default)]
    pub working_dir: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub message_count: i64,
}

/// Response of `GET /sessions/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionHistoryResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SessionMetadata>,
    #[serde(default)]
    pub messages: Vec<GooseMessage>,
}
