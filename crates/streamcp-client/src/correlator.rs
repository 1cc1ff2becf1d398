//! Request id allocation and response validation.
//!
//! Responses are matched strictly by `id`, never by arrival order. A batch response
//! (JSON array) is searched for the element answering the request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use streamcp_protocol::{JSONRPC_VERSION, JsonRpcResponse, RequestId};
use tracing::debug;

use crate::error::{McpClientError, Result};

/// One outstanding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Request id
    pub id: RequestId,
    /// JSON-RPC method
    pub method: String,
    /// When the request was handed to the transport
    pub sent_at: Instant,
}

/// Allocates ids and tracks in-flight requests for one session.
#[derive(Debug)]
pub struct RequestCorrelator {
    next_id: AtomicU64,
    pending: Mutex<HashMap<RequestId, PendingRequest>>,
}

impl Default for RequestCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCorrelator {
    /// Fresh correlator; the first id is 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Next request id. Strictly increasing, never reused.
    pub fn next_id(&self) -> RequestId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Whether `id` has been handed out by [`next_id`](Self::next_id).
    pub fn is_issued(&self, id: RequestId) -> bool {
        id >= 1 && id < self.next_id.load(Ordering::Relaxed)
    }

    /// Allocate an id for `method` and record it as pending.
    ///
    /// The entry is removed when the returned guard is dropped, whether the request
    /// completed, failed or timed out.
    pub fn register(&self, method: &str) -> PendingGuard<'_> {
        let id = self.next_id();
        self.pending.lock().insert(
            id,
            PendingRequest {
                id,
                method: method.to_string(),
                sent_at: Instant::now(),
            },
        );
        PendingGuard {
            correlator: self,
            id,
        }
    }

    /// Number of requests awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Snapshot of requests awaiting a response, oldest first.
    pub fn pending(&self) -> Vec<PendingRequest> {
        let mut pending: Vec<_> = self.pending.lock().values().cloned().collect();
        pending.sort_by_key(|p| p.id);
        pending
    }

    /// Validate a response document against the request it should answer and unwrap
    /// its `result`.
    ///
    /// Checks run in order: envelope shape, `jsonrpc` version, `id`, `error`, `result`.
    ///
    /// # Errors
    ///
    /// - [`McpClientError::MalformedResponse`] if the document is not a response object
    /// - [`McpClientError::ProtocolVersion`] if `jsonrpc != "2.0"`
    /// - [`McpClientError::IdMismatch`] if the id differs from `expected_id`
    /// - [`McpClientError::Server`] if the response carries an error object
    /// - [`McpClientError::EmptyResult`] if neither `result` nor `error` is present
    pub fn validate(&self, document: Value, expected_id: RequestId, method: &str) -> Result<Value> {
        let document = match document {
            Value::Array(items) => select_from_batch(items, expected_id)?,
            other => other,
        };

        let response: JsonRpcResponse = serde_json::from_value(document).map_err(|e| {
            McpClientError::MalformedResponse(format!("not a JSON-RPC response: {e}"))
        })?;

        if response.jsonrpc != JSONRPC_VERSION {
            return Err(McpClientError::ProtocolVersion {
                expected: JSONRPC_VERSION.to_string(),
                actual: response.jsonrpc,
            });
        }

        if response.numeric_id() != Some(expected_id) {
            return Err(McpClientError::IdMismatch {
                expected: expected_id,
                actual: response
                    .id
                    .as_ref()
                    .map_or_else(|| "null".to_string(), Value::to_string),
            });
        }

        if let Some(error) = response.error {
            debug!(id = expected_id, method, code = error.code, "Server returned error");
            return Err(McpClientError::Server {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        response.result.ok_or_else(|| McpClientError::EmptyResult {
            method: method.to_string(),
        })
    }
}

/// Pick the element answering `expected_id` out of a batch response.
///
/// Notifications mixed into the batch are skipped. If no element carries the id, the
/// first response-like element is returned so that validation reports the mismatch.
fn select_from_batch(items: Vec<Value>, expected_id: RequestId) -> Result<Value> {
    let mut first = None;
    for item in items.into_iter().filter(|item| item.get("id").is_some()) {
        let matches = serde_json::from_value::<JsonRpcResponse>(item.clone())
            .ok()
            .and_then(|r| r.numeric_id())
            == Some(expected_id);
        if matches {
            return Ok(item);
        }
        first.get_or_insert(item);
    }
    first.ok_or_else(|| {
        McpClientError::MalformedResponse("batch response contains no responses".to_string())
    })
}

/// Removes its request from the pending table on drop.
#[derive(Debug)]
pub struct PendingGuard<'a> {
    correlator: &'a RequestCorrelator,
    id: RequestId,
}

impl PendingGuard<'_> {
    /// Id allocated for the request.
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.correlator.pending.lock().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn ids_start_at_one_and_increase() {
        let correlator = RequestCorrelator::new();
        let ids: Vec<_> = (0..5).map(|_| correlator.next_id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(correlator.is_issued(5));
        assert!(!correlator.is_issued(6));
        assert!(!correlator.is_issued(0));
    }

    #[test]
    fn guard_tracks_pending_requests() {
        let correlator = RequestCorrelator::new();
        let first = correlator.register("tools/list");
        {
            let second = correlator.register("tools/call");
            assert_eq!(second.id(), 2);
            let pending = correlator.pending();
            assert_eq!(pending.len(), 2);
            assert_eq!(pending[0].method, "tools/list");
            assert_eq!(pending[1].id, 2);
        }
        assert_eq!(correlator.pending_count(), 1);
        assert_eq!(first.id(), 1);
        drop(first);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn unwraps_result() {
        let correlator = RequestCorrelator::new();
        let result = correlator
            .validate(json!({"jsonrpc": "2.0", "id": 5, "result": {"tools": []}}), 5, "tools/list")
            .unwrap();
        assert_eq!(result, json!({"tools": []}));
    }

    #[test]
    fn detects_id_mismatch() {
        let correlator = RequestCorrelator::new();
        let err = correlator
            .validate(json!({"jsonrpc": "2.0", "id": 7, "result": {}}), 5, "ping")
            .unwrap_err();
        match err {
            McpClientError::IdMismatch { expected, actual } => {
                assert_eq!(expected, 5);
                assert_eq!(actual, "7");
            }
            other => panic!("expected IdMismatch, got {other:?}"),
        }
    }

    #[test]
    fn version_is_checked_before_id() {
        let correlator = RequestCorrelator::new();
        let err = correlator
            .validate(json!({"jsonrpc": "1.0", "id": 7, "result": {}}), 5, "ping")
            .unwrap_err();
        assert!(matches!(err, McpClientError::ProtocolVersion { .. }));

        let err = correlator
            .validate(json!({"id": 5, "result": {}}), 5, "ping")
            .unwrap_err();
        assert!(matches!(err, McpClientError::ProtocolVersion { actual, .. } if actual.is_empty()));
    }

    #[test]
    fn server_error_is_surfaced() {
        let correlator = RequestCorrelator::new();
        let err = correlator
            .validate(
                json!({"jsonrpc": "2.0", "id": 2, "error": {"code": -32601, "message": "Method not found"}}),
                2,
                "bogus/method",
            )
            .unwrap_err();
        match err {
            McpClientError::Server { code, message, .. } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected Server, got {other:?}"),
        }
    }

    #[test]
    fn missing_result_is_empty_result() {
        let correlator = RequestCorrelator::new();
        let err = correlator
            .validate(json!({"jsonrpc": "2.0", "id": 3}), 3, "ping")
            .unwrap_err();
        assert!(matches!(err, McpClientError::EmptyResult { method } if method == "ping"));
    }

    #[test]
    fn batch_is_matched_by_id_not_position() {
        let correlator = RequestCorrelator::new();
        let batch = json!([
            {"jsonrpc": "2.0", "method": "notifications/message", "params": {"level": "info", "data": "x"}},
            {"jsonrpc": "2.0", "id": 9, "result": {"other": true}},
            {"jsonrpc": "2.0", "id": 4, "result": {"mine": true}}
        ]);
        let result = correlator.validate(batch, 4, "ping").unwrap();
        assert_eq!(result, json!({"mine": true}));
    }

    #[test]
    fn batch_without_match_reports_mismatch() {
        let correlator = RequestCorrelator::new();
        let batch = json!([{"jsonrpc": "2.0", "id": 9, "result": {}}]);
        assert!(matches!(
            correlator.validate(batch, 4, "ping"),
            Err(McpClientError::IdMismatch { expected: 4, .. })
        ));
        assert!(matches!(
            correlator.validate(json!([]), 4, "ping"),
            Err(McpClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_object_is_malformed() {
        let correlator = RequestCorrelator::new();
        assert!(matches!(
            correlator.validate(json!("hello"), 1, "ping"),
            Err(McpClientError::MalformedResponse(_))
        ));
    }
}
