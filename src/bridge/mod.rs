//! Streaming turn orchestration
//!
//! A turn resolves the caller's session, opens a Goose reply stream and
//! pumps every Goose event through the translator into SSE frames until the
//! stream ends or the caller goes away.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    adk::{AdkEvent, Content},
    error::AppResult,
    goose::{GooseClient, ReplyStream, StreamEvent},
    routes::metrics::{record_frame_dropped, record_frame_forwarded, record_turn},
    session::SessionRegistry,
    streaming::format_sse_data,
    translate::{new_invocation_id, run_sse_request_to_reply, translate_stream_event},
};

/// When a turn stops reading from Goose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnEndPolicy {
    /// Keep forwarding until Goose closes the stream
    #[default]
    AwaitClose,
    /// End right after a `Finish` or `Error` event has been forwarded
    StopOnTerminal,
}

#[derive(Debug, Error)]
#[error("unknown turn end policy {0:?} (expected await_close or stop_on_terminal)")]
pub struct ParsePolicyError(String);

impl FromStr for TurnEndPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "await_close" => Ok(TurnEndPolicy::AwaitClose),
            "stop_on_terminal" => Ok(TurnEndPolicy::StopOnTerminal),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

impl fmt::Display for TurnEndPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnEndPolicy::AwaitClose => f.write_str("await_close"),
            TurnEndPolicy::StopOnTerminal => f.write_str("stop_on_terminal"),
        }
    }
}

/// Why a turn stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    /// Goose stream closed, or a terminal event ended it under `StopOnTerminal`
    Ended,
    /// The caller went away
    Cancelled,
}

/// Lifecycle of a turn: `Idle → Streaming → Terminal`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BridgeState {
    /// Backend call not issued yet
    #[default]
    Idle,
    Streaming,
    Terminal(TerminalReason),
}

/// Entry point for streaming turns
#[derive(Clone)]
pub struct StreamBridge {
    sessions: Arc<SessionRegistry>,
    goose: Arc<GooseClient>,
    policy: TurnEndPolicy,
}

impl StreamBridge {
    pub fn new(sessions: Arc<SessionRegistry>, goose: Arc<GooseClient>, policy: TurnEndPolicy) -> Self {
        Self {
            sessions,
            goose,
            policy,
        }
    }

    /// Resolve the session and open the Goose reply stream for one message.
    ///
    /// Failures here happen before any frame is written and are returned to
    /// the caller as a plain error response.
    #[instrument(skip(self, content, cancel))]
    pub async fn start_turn(
        &self,
        session_id: &str,
        content: &Content,
        cancel: CancellationToken,
    ) -> AppResult<Turn> {
        let backend_id = match self.sessions.get_or_create(session_id).await {
            Ok(id) => id,
            Err(e) => {
                record_turn("failed");
                return Err(e);
            }
        };

        let request = run_sse_request_to_reply(&backend_id, content);
        let events = match self.goose.reply(&request, cancel.clone()).await {
            Ok(events) => events,
            Err(e) => {
                record_turn("failed");
                return Err(e);
            }
        };

        let turn = Turn::new(events, cancel, self.policy);
        info!(
            backend_id = %backend_id,
            invocation_id = %turn.invocation_id,
            policy = %self.policy,
            "Turn started"
        );
        Ok(turn)
    }
}

enum Step {
    Cancelled,
    Received(Option<StreamEvent>),
}

/// One in-flight turn.
///
/// Dropping a turn that is still streaming counts as a cancellation and stops
/// the Goose producer.
pub struct Turn {
    events: ReplyStream,
    cancel: CancellationToken,
    policy: TurnEndPolicy,
    invocation_id: String,
    state: BridgeState,
}

impl Turn {
    pub fn new(events: ReplyStream, cancel: CancellationToken, policy: TurnEndPolicy) -> Self {
        Self {
            events,
            cancel,
            policy,
            invocation_id: new_invocation_id(),
            state: BridgeState::Streaming,
        }
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Next ADK event to forward, or `None` once the turn is terminal.
    ///
    /// Cancellation is checked before every receive and wins over a queued
    /// event.
    pub async fn next_event(&mut self) -> Option<AdkEvent> {
        loop {
            if self.state != BridgeState::Streaming {
                return None;
            }

            let step = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Step::Cancelled,
                event = self.events.recv() => Step::Received(event),
            };

            let event = match step {
                Step::Cancelled => {
                    self.finish(TerminalReason::Cancelled);
                    return None;
                }
                Step::Received(None) => {
                    self.finish(TerminalReason::Ended);
                    return None;
                }
                Step::Received(Some(event)) => event,
            };

            match translate_stream_event(&event, &self.invocation_id) {
                Some(adk) => {
                    if event.is_terminal() && self.policy == TurnEndPolicy::StopOnTerminal {
                        self.finish(TerminalReason::Ended);
                        self.events.cancel();
                    }
                    return Some(adk);
                }
                None => {
                    if event != StreamEvent::Ping {
                        record_frame_dropped("untranslated");
                    }
                    debug!(kind = event.kind(), "Skipping Goose event without ADK counterpart");
                }
            }
        }
    }

    /// Turn the remaining events into SSE frames.
    ///
    /// Events that fail to encode are logged and skipped.
    pub fn into_sse_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
        async_stream::stream! {
            let mut turn = self;
            while let Some(event) = turn.next_event().await {
                match format_sse_data(&event) {
                    Ok(frame) => {
                        record_frame_forwarded();
                        yield Ok(frame);
                    }
                    Err(e) => {
                        record_frame_dropped("encode");
                        warn!(event_id = %event.id, error = %e, "Failed to encode ADK event");
                    }
                }
            }
        }
    }

    fn finish(&mut self, reason: TerminalReason) {
        self.state = BridgeState::Terminal(reason);
        let outcome = match reason {
            TerminalReason::Ended => "ended",
            TerminalReason::Cancelled => "cancelled",
        };
        record_turn(outcome);
        debug!(invocation_id = %self.invocation_id, outcome, "Turn finished");
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        if self.state == BridgeState::Streaming {
            self.finish(TerminalReason::Cancelled);
        }
        self.cancel.cancel();
    }
}
