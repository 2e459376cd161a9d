//! ADK session endpoints
//!
//! - `POST   /apps/:app/users/:user/sessions` - create a session
//! - `GET    /apps/:app/users/:user/sessions` - list mapped sessions
//! - `POST   /apps/:app/users/:user/sessions/:session` - create with a caller id
//! - `GET    /apps/:app/users/:user/sessions/:session` - session with history
//! - `DELETE /apps/:app/users/:user/sessions/:session` - stop and unmap

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    adk::{CreateSessionRequest, SessionResponse, SessionSummary},
    error::{AppError, AppResult},
    translate::{goose_message_to_event, new_invocation_id},
    AppState,
};

/// Create a session with a generated id and start its Goose agent
#[instrument(skip(state))]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Path((app, user)): Path<(String, String)>,
) -> AppResult<Json<SessionResponse>> {
    let session_id = format!("{}_{}_{}", app, user, Uuid::new_v4().simple());

    state.sessions.get_or_create(&session_id).await?;

    info!(session_id = %session_id, "Session created");
    Ok(Json(SessionResponse::empty(session_id, &app, &user)))
}

/// Create a session under a caller-chosen id.
///
/// With `{"gooseSessionId": ...}` an existing Goose session is resumed and
/// adopted instead of starting a new one.
#[instrument(skip(state, body))]
pub async fn create_session_with_id(
    State(state): State<Arc<AppState>>,
    Path((app, user, session)): Path<(String, String, String)>,
    body: Bytes,
) -> AppResult<Json<SessionResponse>> {
    let request: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("decode request: {}", e)))?
    };

    match request.goose_session_id {
        Some(goose_id) => {
            state.sessions.attach(&session, &goose_id).await?;
        }
        None => {
            state.sessions.get_or_create(&session).await?;
        }
    }

    Ok(Json(SessionResponse::empty(session, &app, &user)))
}

/// List every mapped session, ordered by id
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSummary>> {
    let sessions = state
        .sessions
        .list_mappings()
        .await
        .into_iter()
        .map(|mapping| SessionSummary::new(mapping.external_id))
        .collect();

    Json(sessions)
}

/// Fetch one session with its Goose history replayed as ADK events
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path((app, user, session)): Path<(String, String, String)>,
) -> AppResult<Json<SessionResponse>> {
    let backend_id = state
        .sessions
        .lookup(&session)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {}", session)))?;

    let history = state.goose.get_session(&backend_id).await?;

    let invocation_id = new_invocation_id();
    let mut response = SessionResponse::empty(session, &app, &user);
    response.events = history
        .messages
        .iter()
        .map(|message| goose_message_to_event(message, &invocation_id))
        .collect();

    Ok(Json(response))
}

/// Stop the Goose agent and forget the session
#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path((_app, _user, session)): Path<(String, String, String)>,
) -> AppResult<StatusCode> {
    state.sessions.stop(&session).await?;

    info!(session_id = %session, "Session deleted");
    Ok(StatusCode::OK)
}
