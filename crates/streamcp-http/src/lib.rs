//! # streamcp HTTP
//!
//! Streamable HTTP transport for MCP clients.
//!
//! ## Features
//!
//! - `POST` with `Accept: application/json, text/event-stream`
//! - Bare JSON and single-frame SSE response bodies ([`extract_json`])
//! - `Mcp-Session-Id` and `MCP-Protocol-Version` header handling ([`SessionHeaders`])
//! - Cancellable `GET` notification stream ([`EventStream`])
//! - Session termination via `DELETE`
//!
//! No retries happen at this layer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use streamcp_http::{HttpTransport, HttpTransportConfig, SessionHeaders};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Url::parse("http://localhost:3001/mcp")?;
//! let transport = HttpTransport::new(HttpTransportConfig::new(endpoint))?;
//!
//! let session = SessionHeaders::new("abc123", "2025-06-18");
//! let request = serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "ping"});
//! let response = transport.send(&request, Some(&session)).await?;
//! let document = response.json()?;
//! assert_eq!(document["id"], 2);
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod sse;
pub mod stream;
pub mod transport;

pub use config::{
    ACCEPT_JSON_AND_SSE, ACCEPT_SSE, HttpTransportConfig, MCP_PROTOCOL_VERSION_HEADER,
    MCP_SESSION_ID_HEADER, SessionHeaders,
};
pub use error::{TransportError, TransportResult};
pub use sse::{SseEvent, SseParser, extract_json, extract_sse_json, is_event_stream_body};
pub use stream::{EventStream, StreamHandle};
pub use transport::{HttpResponse, HttpTransport};
