//! Goose API client
//!
//! HTTP client for the Goose agent runtime: unary agent/session calls and the
//! streaming `/reply` endpoint.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, instrument, warn, Instrument};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    goose::models::{
        AgentSession, ReplyRequest, ResumeAgentRequest, SessionHistoryResponse, SessionInfo,
        SessionListResponse, StartAgentRequest, StopAgentRequest, StreamEvent,
    },
    routes::metrics::{record_backend_request, record_frame_dropped},
    streaming::{parse_line, SseLine, SseLineBuffer},
};

/// Header carrying the Goose shared secret
pub const SECRET_KEY_HEADER: &str = "X-Secret-Key";

/// Goose API client
pub struct GooseClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    /// Applied to unary calls only; a reply stream lives as long as the turn
    timeout: Duration,
}

impl GooseClient {
    /// Create a new Goose client
    pub fn new(client: reqwest::Client, config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(secret) = &config.goose_secret_key {
            let value = HeaderValue::from_str(secret)
                .context("GOOSE_SECRET_KEY is not a valid header value")?;
            headers.insert(SECRET_KEY_HEADER, value);
        }

        Ok(Self {
            client,
            base_url: config.goose_base_url.clone(),
            headers,
            timeout: config.request_timeout(),
        })
    }

    /// Start a new agent session, returning the Goose session id
    #[instrument(skip(self))]
    pub async fn start_agent(&self, working_dir: &str) -> AppResult<String> {
        let request = StartAgentRequest {
            working_dir: working_dir.to_string(),
            recipe_id: None,
        };

        let session: AgentSession = self.post_json("start_agent", "/agent/start", &request).await?;

        debug!(goose_session_id = %session.id, "Started Goose agent");
        Ok(session.id)
    }

    /// Stop an agent session
    #[instrument(skip(self))]
    pub async fn stop_agent(&self, session_id: &str) -> AppResult<()> {
        let request = StopAgentRequest {
            session_id: session_id.to_string(),
        };

        // Goose answers with an empty object; nothing to decode.
        let url = self.url("/agent/stop");
        self.execute("stop_agent", self.client.post(&url).json(&request))
            .await?;

        debug!("Stopped Goose agent");
        Ok(())
    }

    /// Resume an existing agent session, returning the id Goose reports
    #[instrument(skip(self))]
    pub async fn resume_agent(&self, session_id: &str) -> AppResult<String> {
        let request = ResumeAgentRequest {
            session_id: session_id.to_string(),
            load_model_and_extensions: true,
        };

        let session: AgentSession = self
            .post_json("resume_agent", "/agent/resume", &request)
            .await?;

        debug!(goose_session_id = %session.id, "Resumed Goose agent");
        Ok(session.id)
    }

    /// Fetch the message history of a session
    #[instrument(skip(self))]
    pub async fn get_session(&self, session_id: &str) -> AppResult<SessionHistoryResponse> {
        self.get_json("get_session", &format!("/sessions/{}", session_id))
            .await
    }

    /// List the sessions Goose knows about
    #[instrument(skip(self))]
    pub async fn list_sessions(&self) -> AppResult<Vec<SessionInfo>> {
        let list: SessionListResponse = self.get_json("list_sessions", "/sessions").await?;
        Ok(list.sessions)
    }

    /// Open a `/reply` stream for one turn.
    ///
    /// Only a `200 OK` answer is accepted. Decoded events are handed over a
    /// capacity-one channel, so the producer never reads further ahead than
    /// one event. Cancelling `cancel` (or dropping the returned stream) stops
    /// the producer and closes the connection to Goose.
    #[instrument(skip(self, request, cancel), fields(goose_session_id = %request.session_id))]
    pub async fn reply(
        &self,
        request: &ReplyRequest,
        cancel: CancellationToken,
    ) -> AppResult<ReplyStream> {
        let url = self.url("/reply");
        debug!(url = %url, "Opening Goose reply stream");

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                record_backend_request("reply", "error");
                error!(error = %e, "Failed to send reply request to Goose");
                e
            })?;

        let status = response.status();
        record_backend_request("reply", status.as_str());

        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Goose reply request failed");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let (tx, rx) = mpsc::channel(1);
        let span = info_span!("goose_reply_pump", goose_session_id = %request.session_id);
        tokio::spawn(pump_events(response.bytes_stream(), tx, cancel.clone()).instrument(span));

        Ok(ReplyStream::new(rx, cancel))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, call: &'static str, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let text = self.execute(call, self.client.post(&url).json(body)).await?;
        decode_body(call, &text)
    }

    async fn get_json<T: DeserializeOwned>(&self, call: &'static str, path: &str) -> AppResult<T> {
        let url = self.url(path);
        let text = self.execute(call, self.client.get(&url)).await?;
        decode_body(call, &text)
    }

    /// Send a unary request and return the body of a 2xx answer
    async fn execute(&self, call: &'static str, request: RequestBuilder) -> AppResult<String> {
        let response = request
            .headers(self.headers.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                record_backend_request(call, "error");
                error!(call, error = %e, "Failed to send request to Goose");
                e
            })?;

        let status = response.status();
        record_backend_request(call, status.as_str());
        debug!(call, status = %status, "Goose response status");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(call, status = %status, body = %text, "Goose request failed");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(response.text().await?)
    }
}

fn decode_body<T: DeserializeOwned>(call: &'static str, body: &str) -> AppResult<T> {
    serde_json::from_str(body).map_err(|e| {
        error!(call, error = %e, body = %body, "Failed to parse Goose response");
        AppError::Decode(e)
    })
}

/// Receiving half of a Goose reply stream.
///
/// Dropping it cancels the producer task.
#[derive(Debug)]
pub struct ReplyStream {
    rx: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
}

impl ReplyStream {
    pub fn new(rx: mpsc::Receiver<StreamEvent>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Next decoded event, or `None` once the stream has ended
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Stop the producer without waiting for the end of the stream
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReplyStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Read SSE bytes, decode events and hand them to `tx` one at a time.
///
/// Returns when the body ends, a read fails, the receiver goes away or
/// `cancel` fires. The body stream is dropped on return, which closes the
/// upstream connection.
async fn pump_events<S, E>(stream: S, tx: mpsc::Sender<StreamEvent>, cancel: CancellationToken)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    tokio::pin!(stream);
    let mut buffer = SseLineBuffer::new();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Reply stream cancelled");
                return;
            }
            chunk = stream.next() => chunk,
        };

        let lines = match chunk {
            Some(Ok(bytes)) => buffer.feed(&bytes),
            Some(Err(e)) => {
                warn!(
                    error = %e,
                    truncated = buffer.has_incomplete(),
                    "Goose reply stream read failed"
                );
                return;
            }
            None => break,
        };

        for line in lines {
            if !forward_line(&line, &tx, &cancel).await {
                return;
            }
        }
    }

    if let Some(line) = buffer.finish() {
        forward_line(&line, &tx, &cancel).await;
    }
    debug!("Reply stream ended");
}

/// Forward one line if it carries an event. Returns `false` when the
/// consumer is gone and the producer should stop.
async fn forward_line(
    line: &str,
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
) -> bool {
    let Some(event) = decode_event(line) else {
        return true;
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}

/// Decode one SSE line into an event. Non-data lines and payloads that are
/// not valid events yield `None`.
fn decode_event(line: &str) -> Option<StreamEvent> {
    match parse_line(line) {
        SseLine::Data(payload) => match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                record_frame_dropped("decode");
                debug!(error = %e, payload = %payload, "Dropping undecodable Goose frame");
                None
            }
        },
        SseLine::Comment => None,
        SseLine::Other => {
            debug!(line = %line, "Ignoring non-data SSE line");
            None
        }
    }
}
