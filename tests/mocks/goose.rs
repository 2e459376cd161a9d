//! Mock Goose agent API for testing
//!
//! Provides wiremock-based mocks for the Goose endpoints the bridge calls:
//! - POST /agent/start, /agent/stop, /agent/resume
//! - POST /reply (SSE stream)
//! - GET /sessions, /sessions/{id}
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::mocks::goose::{GooseTestData, MockGooseServer};
//!
//! #[tokio::test]
//! async fn test_with_goose_mock() {
//!     let goose = MockGooseServer::start().await;
//!     goose.mock_start_agent("goose-session-1").await;
//!     goose
//!         .mock_reply_events(&[GooseTestData::text_message("hi"), GooseTestData::finish(1, 1, 2)])
//!         .await;
//!     // Use goose.uri() as GOOSE_BASE_URL
//! }
//! ```

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Mock Goose server wrapper
pub struct MockGooseServer {
    server: MockServer,
}

impl MockGooseServer {
    /// Start a new mock Goose server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// All requests received so far
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests received for one method + path
    pub async fn requests_to(&self, http_method: &str, url_path: &str) -> Vec<Request> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == url_path)
            .collect()
    }

    // =========================================================================
    // Agent lifecycle
    // =========================================================================

    /// Mock a successful `/agent/start` returning `session_id`
    pub async fn mock_start_agent(&self, session_id: &str) {
        Mock::given(method("POST"))
            .and(path("/agent/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": session_id,
                "name": "test session",
                "working_dir": "/tmp"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock `/agent/start` that only succeeds with the given secret header
    pub async fn mock_start_agent_with_secret(&self, session_id: &str, secret: &str) {
        Mock::given(method("POST"))
            .and(path("/agent/start"))
            .and(header("X-Secret-Key", secret))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": session_id,
                "name": "test session",
                "working_dir": "/tmp"
            })))
            .with_priority(1)
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path("/agent/start"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .with_priority(2)
            .mount(&self.server)
            .await;
    }

    /// Mock `/agent/start` failing with `status` and a raw body
    pub async fn mock_start_agent_failure(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/agent/start"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mock `/agent/start` answering 200 with a body that is not a session
    pub async fn mock_start_agent_garbage(&self) {
        Mock::given(method("POST"))
            .and(path("/agent/start"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&self.server)
            .await;
    }

    /// Mock a successful `/agent/stop`
    pub async fn mock_stop_agent(&self) {
        Mock::given(method("POST"))
            .and(path("/agent/stop"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&self.server)
            .await;
    }

    /// Mock a failing `/agent/stop`
    pub async fn mock_stop_agent_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/agent/stop"))
            .respond_with(ResponseTemplate::new(status).set_body_string("stop failed"))
            .mount(&self.server)
            .await;
    }

    /// Mock `/agent/resume` echoing the requested session id
    pub async fn mock_resume_agent(&self, session_id: &str) {
        Mock::given(method("POST"))
            .and(path("/agent/resume"))
            .and(body_partial_json(json!({
                "session_id": session_id,
                "load_model_and_extensions": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": session_id,
                "name": "resumed session",
                "working_dir": "/tmp"
            })))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // POST /reply
    // =========================================================================

    /// Mock `/reply` streaming the given events as SSE frames
    pub async fn mock_reply_events(&self, events: &[Value]) {
        self.mock_reply_raw(&GooseTestData::sse_body(events)).await;
    }

    /// Mock `/reply` streaming a raw SSE body
    pub async fn mock_reply_raw(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path("/reply"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("Content-Type", "text/event-stream")
                    .insert_header("Cache-Control", "no-cache"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock `/reply` answering with a non-stream status
    pub async fn mock_reply_status(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/reply"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Mock `GET /sessions`
    pub async fn mock_list_sessions(&self, sessions: Value) {
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sessions": sessions })))
            .mount(&self.server)
            .await;
    }

    /// Mock `GET /sessions` failing
    pub async fn mock_list_sessions_failure(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(status).set_body_string("unavailable"))
            .mount(&self.server)
            .await;
    }

    /// Mock `GET /sessions/{id}` returning `messages`
    pub async fn mock_session_history(&self, session_id: &str, messages: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/sessions/{}", session_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sessionId": session_id,
                "metadata": {"working_dir": "/tmp", "description": "test", "message_count": 0},
                "messages": messages
            })))
            .mount(&self.server)
            .await;
    }
}

/// Builders for Goose payloads
pub struct GooseTestData;

impl GooseTestData {
    /// `Message` event with a single assistant text part
    pub fn text_message(text: &str) -> Value {
        json!({
            "type": "Message",
            "message": {
                "role": "assistant",
                "created": 1234567890,
                "content": [{"type": "text", "text": text}]
            }
        })
    }

    /// `Message` event with text followed by a tool request
    pub fn tool_request_message(text: &str, call_id: &str, tool: &str, arguments: Value) -> Value {
        json!({
            "type": "Message",
            "message": {
                "role": "assistant",
                "created": 1234567890,
                "content": [
                    {"type": "text", "text": text},
                    {"type": "toolRequest", "id": call_id, "toolCall": {"name": tool, "arguments": arguments}}
                ]
            }
        })
    }

    /// `Finish` event with token counters
    pub fn finish(input: i32, output: i32, total: i32) -> Value {
        json!({
            "type": "Finish",
            "reason": "stop",
            "token_state": {
                "input_tokens": input,
                "output_tokens": output,
                "total_tokens": total,
                "accumulated_input_tokens": input,
                "accumulated_output_tokens": output,
                "accumulated_total_tokens": total
            }
        })
    }

    /// `Error` event
    pub fn error(message: &str) -> Value {
        json!({"type": "Error", "error": message})
    }

    /// `Ping` event
    pub fn ping() -> Value {
        json!({"type": "Ping"})
    }

    /// Stored history message
    pub fn history_message(role: &str, text: &str, created: i64) -> Value {
        json!({
            "role": role,
            "created": created,
            "content": [{"type": "text", "text": text}],
            "metadata": {"userVisible": true, "agentVisible": true}
        })
    }

    /// Frame events as an SSE body
    pub fn sse_body(events: &[Value]) -> String {
        events
            .iter()
            .map(|event| format!("data: {}\n\n", event))
            .collect()
    }
}
