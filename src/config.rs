//! Configuration management for adk2goose
//!
//! Configuration is loaded from environment variables (optionally seeded from
//! a `.env` file by `main`).

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::bridge::TurnEndPolicy;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the ADK-facing server binds to (`host:port`)
    pub listen_addr: String,

    /// Goose agent API base URL, without trailing slash
    pub goose_base_url: String,
    /// Shared secret sent as `X-Secret-Key` on every Goose request
    pub goose_secret_key: Option<String>,
    /// Working directory handed to Goose when starting an agent session
    pub working_dir: String,

    /// Upper bound for one inbound request and for unary Goose calls (in seconds)
    pub request_timeout_seconds: u64,

    /// When a streaming turn is considered finished
    pub turn_end_policy: TurnEndPolicy,

    /// Emit logs as JSON instead of human-readable text
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset, matching how the variables are
    /// usually templated into container environments.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let goose_base_url = get("GOOSE_BASE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            listen_addr: normalize_listen_addr(
                &get("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            ),

            goose_base_url,
            goose_secret_key: get("GOOSE_SECRET_KEY"),
            working_dir: get("WORKING_DIR").unwrap_or_else(|| ".".to_string()),

            request_timeout_seconds: get("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|| "300".to_string())
                .parse()
                .context("Invalid REQUEST_TIMEOUT_SECONDS")?,

            turn_end_policy: get("TURN_END_POLICY")
                .map(|v| v.parse())
                .transpose()
                .context("Invalid TURN_END_POLICY")?
                .unwrap_or_default(),

            log_json: get("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Accept Go-style `:8080` listen addresses by binding all interfaces.
fn normalize_listen_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}
