//! Prometheus metrics endpoint
//!
//! Exposes bridge metrics in Prometheus format for monitoring.

use anyhow::Context;
use axum::{http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize metrics (call once at startup, later calls are no-ops)
pub fn init_metrics() -> anyhow::Result<()> {
    PROMETHEUS_HANDLE.get_or_try_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")
    })?;

    register_metrics();
    Ok(())
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "adk2goose_turns_total",
        "Streaming turns by outcome (ended, cancelled, failed)"
    );
    metrics::describe_counter!(
        "adk2goose_frames_forwarded_total",
        "ADK events written to clients"
    );
    metrics::describe_counter!(
        "adk2goose_frames_dropped_total",
        "Goose stream frames not forwarded"
    );
    metrics::describe_counter!(
        "adk2goose_sessions_created_total",
        "Goose agent sessions started by the bridge"
    );
    metrics::describe_counter!(
        "adk2goose_backend_requests_total",
        "Requests issued to the Goose API"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Record the outcome of a streaming turn
pub fn record_turn(outcome: &str) {
    metrics::counter!("adk2goose_turns_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record one ADK event written to a client
pub fn record_frame_forwarded() {
    metrics::counter!("adk2goose_frames_forwarded_total").increment(1);
}

/// Record a Goose frame that was not forwarded
pub fn record_frame_dropped(reason: &str) {
    metrics::counter!("adk2goose_frames_dropped_total", "reason" => reason.to_string())
        .increment(1);
}

/// Record a Goose agent session started
pub fn record_session_created() {
    metrics::counter!("adk2goose_sessions_created_total").increment(1);
}

/// Record a Goose API call
pub fn record_backend_request(call: &str, status: &str) {
    metrics::counter!(
        "adk2goose_backend_requests_total",
        "call" => call.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
