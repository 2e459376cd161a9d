//! Session management
//!
//! Tracks which Goose agent session serves each ADK session.

pub mod backend;
pub mod registry;

pub use backend::SessionBackend;
pub use registry::{SessionMapping, SessionRegistry};
