//! Translation between the ADK and Goose message models
//!
//! All functions here are pure: no I/O, no shared state. Generated event ids
//! and timestamps are the only inputs that differ between calls.

pub mod adk_to_goose;
pub mod goose_to_adk;
pub mod tools;

pub use adk_to_goose::{adk_content_to_goose_message, run_sse_request_to_reply};
pub use goose_to_adk::{
    goose_message_to_content, goose_message_to_event, new_invocation_id, token_state_to_usage,
    translate_stream_event,
};
