//! Agent session lifecycle seam
//!
//! The registry only needs to start, stop and resume backend sessions; this
//! trait keeps it independent of the HTTP client so tests can substitute a
//! counting fake.

use async_trait::async_trait;

use crate::{error::AppResult, goose::GooseClient};

/// Lifecycle operations on backend agent sessions
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Start a new session rooted at `working_dir`, returning its backend id
    async fn start_session(&self, working_dir: &str) -> AppResult<String>;

    /// Stop a running session
    async fn stop_session(&self, backend_id: &str) -> AppResult<()>;

    /// Resume an existing session, returning the backend id to use for it
    async fn resume_session(&self, backend_id: &str) -> AppResult<String>;
}

#[async_trait]
impl SessionBackend for GooseClient {
    async fn start_session(&self, working_dir: &str) -> AppResult<String> {
        self.start_agent(working_dir).await
    }

    async fn stop_session(&self, backend_id: &str) -> AppResult<()> {
        self.stop_agent(backend_id).await
    }

    async fn resume_session(&self, backend_id: &str) -> AppResult<String> {
        self.resume_agent(backend_id).await
    }
}
