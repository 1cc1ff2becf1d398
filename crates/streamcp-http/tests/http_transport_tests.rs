//! Integration tests for the Streamable HTTP transport against an in-process mock server.

use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use streamcp_http::{HttpTransport, HttpTransportConfig, SessionHeaders, TransportError};
use streamcp_protocol::JsonRpcResponse;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpTransport {
    let endpoint = Url::parse(&format!("{}/mcp", server.uri())).unwrap();
    let mut config = HttpTransportConfig::new(endpoint);
    config.request_timeout = Duration::from_millis(500);
    HttpTransport::new(config).unwrap()
}

fn session() -> SessionHeaders {
    SessionHeaders::new("abc123", "2025-06-18")
}

#[tokio::test]
async fn post_sets_required_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(header("Content-Type", "application/json"))
        .and(header("Mcp-Session-Id", "abc123"))
        .and(header("MCP-Protocol-Version", "2025-06-18"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": {}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server);
    let response = transport
        .send(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}), Some(&session()))
        .await
        .unwrap();
    assert_eq!(response.json().unwrap()["id"], 1);

    let requests = server.received_requests().await.unwrap();
    let accept = requests[0].headers.get("accept").unwrap().to_str().unwrap();
    assert_eq!(accept, "application/json, text/event-stream");
}

#[tokio::test]
async fn post_without_session_omits_session_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": {}}))
                .insert_header("mcp-session-id", "abc123"),
        )
        .mount(&server)
        .await;

    let response = transport(&server)
        .send(&json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}), None)
        .await
        .unwrap();
    assert_eq!(response.session_id(), Some("abc123"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("mcp-session-id").is_none());
    assert!(requests[0].headers.get("mcp-protocol-version").is_none());
}

#[tokio::test]
async fn sse_framed_post_response_is_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":3,\"result\":{\"tools\":[]}}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let response = transport(&server)
        .send(&json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}), Some(&session()))
        .await
        .unwrap();
    assert!(response.is_event_stream());
    assert_eq!(
        response.json().unwrap(),
        json!({"jsonrpc": "2.0", "id": 3, "result": {"tools": []}})
    );
}

#[tokio::test]
async fn declared_event_stream_without_event_line_is_extracted() {
    let server = MockServer::start().await;
    let reply = JsonRpcResponse::success(4, json!({"prompts": []}));
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!("data: {}\n\n", serde_json::to_string(&reply).unwrap()),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let response = transport(&server)
        .send(&json!({"jsonrpc": "2.0", "id": 4, "method": "prompts/list"}), Some(&session()))
        .await
        .unwrap();
    assert!(response.is_event_stream());
    let decoded: JsonRpcResponse = serde_json::from_value(response.json().unwrap()).unwrap();
    assert_eq!(decoded, reply);
}

#[tokio::test]
async fn non_success_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Session not found"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .send(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}), Some(&session()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 404,
            body: "Session not found".into()
        }
    );
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": {}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = transport(&server)
        .send(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}), Some(&session()))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn connection_refused_is_connection_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = Url::parse(&format!("http://{addr}/mcp")).unwrap();
    let mut config = HttpTransportConfig::new(endpoint);
    config.request_timeout = Duration::from_secs(2);
    let transport = HttpTransport::new(config).unwrap();

    let err = transport
        .send(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn notification_accepts_202_and_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = transport(&server);
    let batch = json!([{"jsonrpc": "2.0", "method": "notifications/initialized"}]);
    transport.notify(&batch, Some(&session())).await.unwrap();
    transport.notify(&batch, Some(&session())).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.is_array());
}

#[tokio::test]
async fn notification_stream_yields_events_then_ends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .and(header("Accept", "text/event-stream"))
        .and(header("Mcp-Session-Id", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(
                ": keepalive\n\n",
                "event: message\n",
                "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\",",
                "\"params\":{\"progressToken\":\"t1\",\"progress\":1,\"total\":2}}\n\n",
                "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\",",
                "\"params\":{\"level\":\"info\",\"data\":\"done\"}}\n\n",
            ),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut events = transport(&server).open_stream(&session()).await.unwrap();
    let first = events.next().await.unwrap().unwrap();
    assert_eq!(first.event_type(), "message");
    assert!(first.notification().is_some());
    let second = events.next().await.unwrap().unwrap();
    assert_eq!(second.json().unwrap()["params"]["data"], "done");
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn cancelled_stream_terminates_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"n\":1}\n\ndata: {\"n\":2}\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let mut events = transport(&server).open_stream(&session()).await.unwrap();
    let handle = events.handle();
    assert_eq!(events.next().await.unwrap().unwrap().data, "{\"n\":1}");

    handle.cancel();
    assert!(events.next().await.is_none());
    assert!(events.is_closed());
}

#[tokio::test]
async fn stream_not_offered_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    let err = transport(&server).open_stream(&session()).await.unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 405, .. }));
}

#[tokio::test]
async fn stream_with_json_content_type_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = transport(&server).open_stream(&session()).await.unwrap_err();
    assert!(matches!(err, TransportError::MalformedResponse(_)));
}

#[tokio::test]
async fn terminate_session_sends_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/mcp"))
        .and(header("Mcp-Session-Id", "abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    transport(&server).terminate_session(&session()).await.unwrap();
}

#[tokio::test]
async fn terminate_session_rejection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    let err = transport(&server)
        .terminate_session(&session())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 405, .. }));
}
