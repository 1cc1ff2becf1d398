//! # streamcp Client
//!
//! MCP client core for the Streamable HTTP transport.
//!
//! ## Architecture
//!
//! ```text
//! McpClient (tools / resources / prompts / ping)
//!     │
//!     ├── SessionManager    initialize handshake, Mcp-Session-Id, state machine
//!     ├── RequestCorrelator id allocation, response validation
//!     └── HttpTransport     POST / GET / DELETE, JSON and SSE bodies
//! ```
//!
//! Every capability call checks that the session is initialized, allocates the next
//! request id, POSTs the JSON-RPC request with the session headers, extracts the JSON
//! document from a bare or SSE-framed body, validates version and id, and decodes the
//! typed result. Errors are returned as [`McpClientError`]; nothing is retried.
//!
//! ## Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use streamcp_client::{ClientConfig, ErrorCategory, McpClient};
//!
//! # async fn example() -> streamcp_client::Result<()> {
//! let client = McpClient::new(ClientConfig::new("http://localhost:3001"))?;
//! client.initialize().await?;
//!
//! let sum = client.add(2.0, 3.0).await?;
//! assert_eq!(sum, 5.0);
//!
//! match client.call_tool("missing", json!({})).await {
//!     Err(e) if e.category() == ErrorCategory::Server => println!("rejected: {e}"),
//!     other => println!("{other:?}"),
//! }
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

mod client;
pub mod config;
pub mod correlator;
pub mod error;
pub mod numeric;
mod operations;
pub mod session;
mod validation;

pub use client::{CloseOutcome, McpClient};
pub use config::{ClientConfig, ConfigError, ServerProfile};
pub use correlator::{PendingRequest, RequestCorrelator};
pub use error::{ErrorCategory, McpClientError, Result};
pub use operations::ResourceRef;
pub use session::{Session, SessionManager, SessionState};

pub use streamcp_http::{EventStream, SseEvent, StreamHandle};
pub use streamcp_protocol as protocol;
