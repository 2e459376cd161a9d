//! Integration tests for the adk2goose bridge
//!
//! This module contains integration tests that verify the complete
//! request/response flow through the bridge against a mocked Goose runtime.

pub mod sessions;
