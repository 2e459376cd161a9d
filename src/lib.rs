//! adk2goose - ADK REST/SSE API on top of a Goose agent runtime
//!
//! This library provides the core functionality for the adk2goose bridge
//! server. It maps ADK sessions onto Goose agent sessions and translates each
//! streamed Goose reply into ADK events.

pub mod adk;
pub mod bridge;
pub mod config;
pub mod error;
pub mod goose;
pub mod routes;
pub mod session;
pub mod streaming;
pub mod translate;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::bridge::{StreamBridge, Turn, TurnEndPolicy};
pub use crate::config::Config;
pub use crate::goose::GooseClient;
pub use crate::session::{SessionBackend, SessionRegistry};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    pub goose: Arc<GooseClient>,
    pub sessions: Arc<SessionRegistry>,
    pub bridge: StreamBridge,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // No client-wide timeout: a reply stream lasts as long as its turn.
        // Redirects are surfaced as errors rather than followed.
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .connect_timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let goose = Arc::new(GooseClient::new(http_client, &config)?);

        let sessions = Arc::new(SessionRegistry::new(
            goose.clone(),
            config.working_dir.clone(),
        ));

        let bridge = StreamBridge::new(sessions.clone(), goose.clone(), config.turn_end_policy);

        Ok(Self {
            config,
            start_time: Instant::now(),
            goose,
            sessions,
            bridge,
        })
    }
}
