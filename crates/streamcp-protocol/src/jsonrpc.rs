//! # JSON-RPC 2.0 envelopes
//!
//! Outgoing messages ([`JsonRpcRequest`], [`JsonRpcNotification`]) always carry the
//! `"2.0"` version marker. Incoming responses are decoded leniently into
//! [`JsonRpcResponse`] so that a wrong version or a foreign id can be reported as a
//! protocol error by the caller instead of surfacing as an opaque decode failure.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// JSON-RPC version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier. Allocated per session, starting at 1.
pub type RequestId = u64;

/// JSON-RPC version marker, always serialized as `"2.0"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "Invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// JSON-RPC request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Request identifier
    pub id: RequestId,
    /// Request method name
    pub method: String,
    /// Request parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new request.
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC notification message (no `id`, no response expected)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Notification method name
    pub method: String,
    /// Notification parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response message as received from the wire.
///
/// Fields are kept loose on purpose: `jsonrpc` may be missing or wrong and `id` may be
/// any JSON value. Validation against the request that was sent happens in the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Version string as sent by the server (empty if absent)
    #[serde(default)]
    pub jsonrpc: String,
    /// Response identifier (`null` for parse errors)
    #[serde(default)]
    pub id: Option<Value>,
    /// Success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a success response. Mostly useful for tests and mock servers.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(Value::from(id)),
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn failure(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(Value::from(id)),
            result: None,
            error: Some(error),
        }
    }

    /// Numeric id, if the server echoed one.
    ///
    /// Servers that stringify ids (`"7"`) are accepted as long as the string is an
    /// integer.
    pub fn numeric_id(&self) -> Option<RequestId> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Human-readable message
    pub message: String,
    /// Additional data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create an error object without data.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Well-known JSON-RPC / MCP error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Resource not found (MCP).
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_absent_params() {
        let req = JsonRpcRequest::new(1, "ping", None);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
    }

    #[test]
    fn notification_has_no_id() {
        let note = JsonRpcNotification::new("notifications/initialized", None);
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["method"], "notifications/initialized");
    }

    #[test]
    fn version_marker_rejects_other_versions() {
        let err = serde_json::from_value::<JsonRpcVersion>(json!("1.0")).unwrap_err();
        assert!(err.to_string().contains("expected '2.0'"));
    }

    #[test]
    fn response_decodes_without_version() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({"id": 3, "result": {}})).unwrap();
        assert_eq!(resp.jsonrpc, "");
        assert_eq!(resp.numeric_id(), Some(3));
    }

    #[test]
    fn numeric_id_accepts_stringified_integers() {
        let resp: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "12", "result": {}})).unwrap();
        assert_eq!(resp.numeric_id(), Some(12));

        let resp: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "abc", "result": {}})).unwrap();
        assert_eq!(resp.numeric_id(), None);
    }

    #[test]
    fn success_response_carries_numeric_id() {
        let resp = JsonRpcResponse::success(5, json!({"ok": true}));
        assert_eq!(resp.numeric_id(), Some(5));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"jsonrpc": "2.0", "id": 5, "result": {"ok": true}}));
    }

    #[test]
    fn error_response_round_trips_code() {
        let resp = JsonRpcResponse::failure(
            9,
            JsonRpcError::new(error_codes::METHOD_NOT_FOUND, "Method not found"),
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["error"]["code"], -32601);
        assert!(json.get("result").is_none());
    }
}
