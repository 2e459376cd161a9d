//! SSE (Server-Sent Events) streaming utilities
//!
//! Line buffering and parsing for the Goose `/reply` stream, plus framing of
//! outgoing ADK events.

use bytes::Bytes;
use serde::Serialize;

/// Buffer for accumulating incomplete SSE lines across chunk boundaries.
///
/// SSE data arrives as byte chunks that may not align with line boundaries
/// (or even UTF-8 character boundaries). Bytes are held until a complete line
/// ending with `\n` is available, then decoded.
///
/// # Example
/// ```
/// use adk2goose::streaming::SseLineBuffer;
///
/// let mut buffer = SseLineBuffer::new();
///
/// let lines1 = buffer.feed(b"data: {\"type\":\"Pi");
/// assert!(lines1.is_empty());
///
/// let lines2 = buffer.feed(b"ng\"}\n");
/// assert_eq!(lines2, vec!["data: {\"type\":\"Ping\"}"]);
/// ```
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    incomplete: Vec<u8>,
}

impl SseLineBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the buffer and return any complete, non-blank lines.
    ///
    /// The line terminator (`\n` or `\r\n`) is stripped. Incomplete trailing
    /// data is retained for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.incomplete.extend_from_slice(bytes);

        let mut complete_lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.incomplete[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(line) = decode_line(&self.incomplete[start..end]) {
                complete_lines.push(line);
            }
            start = end + 1;
        }

        self.incomplete.drain(..start);
        complete_lines
    }

    /// Flush the trailing line of a stream that ended without a newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.incomplete);
        decode_line(&rest)
    }

    /// Check if there's any incomplete data remaining in the buffer.
    pub fn has_incomplete(&self) -> bool {
        !self.incomplete.is_empty()
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(String::from_utf8_lossy(raw).into_owned())
}

/// Classification of a single SSE line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Payload of a `data:` field
    Data(&'a str),
    /// `:` keep-alive or comment
    Comment,
    /// Any other field (`event:`, `id:`, `retry:`) or unparseable text
    Other,
}

/// Classify one line of an SSE stream.
///
/// A single space after the `data:` colon is part of the framing and is
/// removed.
pub fn parse_line(line: &str) -> SseLine<'_> {
    if line.starts_with(':') {
        return SseLine::Comment;
    }
    match line.strip_prefix("data:") {
        Some(payload) => SseLine::Data(payload.strip_prefix(' ').unwrap_or(payload)),
        None => SseLine::Other,
    }
}

/// Frame a value as one SSE `data:` event.
pub fn format_sse_data<T: Serialize>(value: &T) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(Bytes::from(format!("data: {}\n\n", json)))
}
