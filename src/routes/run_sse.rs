//! ADK `run_sse` endpoint
//!
//! Runs one turn against the session's Goose agent and streams the resulting
//! ADK events back as Server-Sent Events.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    adk::RunSseRequest,
    error::{AppError, AppResult},
    AppState,
};

/// Handle `POST /apps/:app/users/:user/sessions/:session/run_sse`.
///
/// The body is validated before any Goose call. Once the stream is open the
/// response is always 200; later Goose errors arrive as error events. The
/// turn is cancelled when the response body is dropped, which is what hyper
/// does when the client disconnects.
#[instrument(skip(state, body), fields(session_id = %session))]
pub async fn run_sse(
    State(state): State<Arc<AppState>>,
    Path((_app, _user, session)): Path<(String, String, String)>,
    body: Bytes,
) -> AppResult<Response> {
    let request: RunSseRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("decode request: {}", e)))?;

    let content = request
        .new_message
        .ok_or_else(|| AppError::BadRequest("new_message is required".to_string()))?;

    debug!(parts = content.parts.len(), "Starting turn");

    let turn = state
        .bridge
        .start_turn(&session, &content, CancellationToken::new())
        .await?;

    let body = Body::from_stream(turn.into_sse_stream());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))?;

    Ok(response)
}
