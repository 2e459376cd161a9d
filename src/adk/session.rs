//! ADK session endpoint bodies

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adk::{event::AdkEvent, types::Content};

/// Body of `POST .../sessions/{session}/run_sse`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunSseRequest {
    #[serde(default, alias = "newMessage")]
    pub new_message: Option<Content>,
}

/// Optional body of `POST .../sessions/{session}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Existing Goose session to adopt instead of starting a new one
    #[serde(default)]
    pub goose_session_id: Option<String>,
}

/// A session as returned by the session endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub state: HashMap<String, Value>,
    pub events: Vec<AdkEvent>,
}

/// Entry of a session listing.
///
/// The registry does not record which app or user a session was created
/// under, so listings carry the id only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub state: HashMap<String, Value>,
    pub events: Vec<AdkEvent>,
}

impl SessionSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: HashMap::new(),
            events: Vec::new(),
        }
    }
}

impl SessionResponse {
    /// A session with empty state and no events
    pub fn empty(id: impl Into<String>, app_name: &str, user_id: &str) -> Self {
        Self {
            id: id.into(),
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            state: HashMap::new(),
            events: Vec::new(),
        }
    }
}
