//! Shared fixture for client integration tests.
//!
//! Each test starts its own `MockServer` and passes its URI to the client explicitly.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use streamcp_client::{ClientConfig, McpClient};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

pub const SESSION_ID: &str = "abc123";

/// Matches a JSON-RPC message (or the first element of a batch) by method.
#[derive(Debug, Clone)]
pub struct JsonRpcMethod(pub &'static str);

impl Match for JsonRpcMethod {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        let message = match &body {
            Value::Array(items) => items.first(),
            other => Some(other),
        };
        message
            .and_then(|m| m.get("method"))
            .and_then(Value::as_str)
            == Some(self.0)
    }
}

pub fn rpc_method(method: &'static str) -> JsonRpcMethod {
    JsonRpcMethod(method)
}

#[derive(Debug, Clone)]
enum Outcome {
    Result(Value),
    Error { code: i32, message: String },
    Raw(Value),
}

/// Answers with the id of the incoming request, as plain JSON or an SSE frame.
#[derive(Debug, Clone)]
pub struct RpcResponder {
    outcome: Outcome,
    sse: bool,
    session_id: Option<String>,
    id_override: Option<Value>,
    delay: Option<Duration>,
}

pub fn rpc_result(result: Value) -> RpcResponder {
    RpcResponder::new(Outcome::Result(result))
}

pub fn rpc_error(code: i32, message: &str) -> RpcResponder {
    RpcResponder::new(Outcome::Error {
        code,
        message: message.to_string(),
    })
}

/// Respond with `body` verbatim (apart from SSE framing).
pub fn rpc_raw(body: Value) -> RpcResponder {
    RpcResponder::new(Outcome::Raw(body))
}

impl RpcResponder {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            sse: false,
            session_id: None,
            id_override: None,
            delay: None,
        }
    }

    pub fn sse(mut self) -> Self {
        self.sse = true;
        self
    }

    pub fn session(mut self, id: &str) -> Self {
        self.session_id = Some(id.to_string());
        self
    }

    pub fn with_id(mut self, id: Value) -> Self {
        self.id_override = Some(id);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Respond for RpcResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let id = self
            .id_override
            .clone()
            .or_else(|| body.get("id").cloned())
            .unwrap_or(Value::Null);

        let payload = match &self.outcome {
            Outcome::Result(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
            Outcome::Error { code, message } => {
                json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
            }
            Outcome::Raw(raw) => raw.clone(),
        };

        let mut template = if self.sse {
            ResponseTemplate::new(200).set_body_raw(
                format!("event: message\ndata: {payload}\n\n"),
                "text/event-stream",
            )
        } else {
            ResponseTemplate::new(200).set_body_json(payload)
        };
        if let Some(session_id) = &self.session_id {
            template = template.insert_header("mcp-session-id", session_id.as_str());
        }
        if let Some(delay) = self.delay {
            template = template.set_delay(delay);
        }
        template
    }
}

pub fn initialize_result(capabilities: Value) -> Value {
    json!({
        "protocolVersion": "2025-06-18",
        "capabilities": capabilities,
        "serverInfo": {"name": "example-servers/everything", "version": "1.0.0"},
        "instructions": "Test server"
    })
}

/// Mount a successful handshake assigning [`SESSION_ID`].
pub async fn mount_handshake(server: &MockServer) {
    mount_handshake_with(
        server,
        json!({"tools": {}, "resources": {"subscribe": true}, "prompts": {}, "logging": {}}),
    )
    .await;
}

pub async fn mount_handshake_with(server: &MockServer, capabilities: Value) {
    Mock::given(wiremock::matchers::method("POST"))
        .and(rpc_method("initialize"))
        .respond_with(rpc_result(initialize_result(capabilities)).session(SESSION_ID))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(wiremock::matchers::method("POST"))
        .and(rpc_method("notifications/initialized"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(server)
        .await;
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(server.uri());
    config.request_timeout = Duration::from_secs(1);
    config
}

pub fn client_for(server: &MockServer) -> McpClient {
    McpClient::new(config_for(server)).unwrap()
}

/// Client with a completed handshake.
pub async fn initialized_client(server: &MockServer) -> McpClient {
    mount_handshake(server).await;
    let client = client_for(server);
    client.initialize().await.unwrap();
    client
}

/// Bodies of received requests whose method is `method`.
pub async fn received_bodies(server: &MockServer, method: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
        .filter(|body| {
            let message = match body {
                Value::Array(items) => items.first(),
                other => Some(other),
            };
            message.and_then(|m| m.get("method")).and_then(Value::as_str) == Some(method)
        })
        .collect()
}
