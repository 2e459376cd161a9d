//! ADK REST API wire types
//!
//! The inbound side of the bridge: message content, streamed events and
//! session endpoint bodies.

pub mod event;
pub mod session;
pub mod types;

pub use event::{AdkEvent, EventActions, UsageMetadata};
pub use session::{CreateSessionRequest, RunSseRequest, SessionResponse, SessionSummary};
pub use types::{Blob, Content, FunctionCall, FunctionResponse, Part, ROLE_MODEL, ROLE_USER};
