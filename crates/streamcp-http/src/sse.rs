//! Server-Sent Events handling for Streamable HTTP.
//!
//! Two consumers exist:
//!
//! - POST responses, where the server may answer with a single SSE frame instead of a
//!   bare JSON document. [`extract_json`] turns either shape into one JSON value.
//! - The GET notification stream, decoded incrementally by [`SseParser`].
//!
//! ## SSE Format
//!
//! ```text
//! id: event-123
//! event: message
//! data: {"jsonrpc": "2.0", ...}
//!
//! ```

use serde_json::Value;
use streamcp_protocol::ServerNotification;

use crate::error::{TransportError, TransportResult};

/// A Server-Sent Event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Event ID for resumption support
    pub id: Option<String>,
    /// Event type (`message` when absent)
    pub event: Option<String>,
    /// Event data, multiple `data:` lines joined with `\n`
    pub data: String,
    /// Reconnection delay requested by the server, in milliseconds
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Event type, defaulting to `message`.
    pub fn event_type(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }

    /// Parse the data field as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MalformedResponse`] if the data is not valid JSON.
    pub fn json(&self) -> TransportResult<Value> {
        serde_json::from_str(&self.data)
            .map_err(|e| TransportError::MalformedResponse(format!("invalid JSON in SSE event: {e}")))
    }

    /// Decode the data field as a server notification.
    ///
    /// Returns `None` for non-JSON data and for messages that are not notifications.
    pub fn notification(&self) -> Option<ServerNotification> {
        ServerNotification::from_value(&self.json().ok()?)
    }
}

/// Returns true if the body is framed as SSE rather than bare JSON.
///
/// A body counts as SSE when it has both an `event:` line and a `data:` line.
pub fn is_event_stream_body(body: &str) -> bool {
    let mut event = false;
    let mut data = false;
    for line in body.lines() {
        event |= line.starts_with("event:");
        data |= line.starts_with("data:");
        if event && data {
            return true;
        }
    }
    false
}

/// Extract the JSON document from a POST response body.
///
/// SSE-framed bodies (see [`is_event_stream_body`]) yield the payload of the first
/// `data:` line; anything else is parsed whole.
///
/// # Errors
///
/// Returns [`TransportError::MalformedResponse`] if the body is empty or the payload
/// is not valid JSON.
pub fn extract_json(body: &str) -> TransportResult<Value> {
    if is_event_stream_body(body) {
        return extract_sse_json(body);
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(TransportError::MalformedResponse(
            "empty response body".to_string(),
        ));
    }
    serde_json::from_str(trimmed)
        .map_err(|e| TransportError::MalformedResponse(format!("invalid JSON body: {e}")))
}

/// Parse the first `data:` line of a body already known to be `text/event-stream`.
///
/// Used when the `Content-Type` header settles the framing, so an `event:` line is
/// not required.
///
/// # Errors
///
/// Returns [`TransportError::MalformedResponse`] if there is no `data:` line or its
/// payload is not valid JSON.
pub fn extract_sse_json(body: &str) -> TransportResult<Value> {
    let data = body
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .ok_or_else(|| {
            TransportError::MalformedResponse("SSE response has no data: line".to_string())
        })?;
    serde_json::from_str(data.trim())
        .map_err(|e| TransportError::MalformedResponse(format!("invalid JSON in SSE data: {e}")))
}

/// Incremental SSE decoder.
///
/// Bytes are buffered until a full line is available, so chunk boundaries may fall
/// anywhere, including inside a multi-byte UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    id: Option<String>,
    event: Option<String>,
    data: Vec<String>,
    retry: Option<u64>,
}

impl SseParser {
    /// Create a new SSE parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing event when the stream ends without a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        // Comment / keepalive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "id" => self.id = Some(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "retry" => self.retry = value.trim().parse().ok(),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            self.event = None;
            self.retry = None;
            return None;
        }
        Some(SseEvent {
            id: self.id.take(),
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
            retry: self.retry.take(),
        })
    }
}
