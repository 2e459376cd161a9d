//! Goose agent runtime integration
//!
//! Provides the client for the Goose REST API and its wire models.

pub mod client;
pub mod models;

pub use client::{GooseClient, ReplyStream};
pub use models::*;
