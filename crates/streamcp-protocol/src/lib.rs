//! # streamcp Protocol
//!
//! Wire-level types for talking to an MCP server over the Streamable HTTP transport.
//!
//! This crate performs no I/O. It provides:
//!
//! - [`jsonrpc`]: JSON-RPC 2.0 request, notification and response envelopes
//! - [`content`]: the polymorphic content union carried by tool results and prompt messages
//! - [`types`]: initialize handshake payloads, capability flags, tool/resource/prompt
//!   descriptors and the notifications a client sends or receives
//! - [`methods`]: MCP method names
//!
//! ## Example
//!
//! ```rust
//! use streamcp_protocol::jsonrpc::{JsonRpcNotification, JsonRpcRequest};
//! use streamcp_protocol::methods;
//!
//! let request = JsonRpcRequest::new(1, methods::TOOLS_LIST, None);
//! let json = serde_json::to_value(&request).unwrap();
//! assert_eq!(json["jsonrpc"], "2.0");
//! assert_eq!(json["id"], 1);
//!
//! // The initialized acknowledgment travels as a one-element batch.
//! let batch = vec![JsonRpcNotification::new(methods::NOTIFICATION_INITIALIZED, None)];
//! assert!(serde_json::to_value(&batch).unwrap().is_array());
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod content;
pub mod jsonrpc;
pub mod types;

pub use content::{
    AudioContent, Content, EmbeddedResource, ImageContent, ResourceContents, ResourceLink, Role,
    TextContent,
};
pub use jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JsonRpcVersion, RequestId, error_codes,
};
pub use types::*;

/// Protocol revision 2025-03-26 (first revision with Streamable HTTP).
pub const PROTOCOL_VERSION_2025_03_26: &str = "2025-03-26";

/// Protocol revision 2025-06-18.
pub const PROTOCOL_VERSION_2025_06_18: &str = "2025-06-18";

/// Revision requested by default during initialize.
pub const PROTOCOL_VERSION_LATEST: &str = PROTOCOL_VERSION_2025_06_18;

/// Every revision this client is able to speak.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] =
    &[PROTOCOL_VERSION_2025_06_18, PROTOCOL_VERSION_2025_03_26];

/// Returns true if `version` is one of [`SUPPORTED_PROTOCOL_VERSIONS`].
pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_PROTOCOL_VERSIONS.contains(&version)
}

/// MCP method names used by the client.
pub mod methods {
    /// Handshake request.
    pub const INITIALIZE: &str = "initialize";
    /// Handshake acknowledgment notification.
    pub const NOTIFICATION_INITIALIZED: &str = "notifications/initialized";
    /// Liveness check.
    pub const PING: &str = "ping";
    /// List tools.
    pub const TOOLS_LIST: &str = "tools/list";
    /// Invoke a tool.
    pub const TOOLS_CALL: &str = "tools/call";
    /// List resources.
    pub const RESOURCES_LIST: &str = "resources/list";
    /// List resource templates.
    pub const RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";
    /// Read a resource.
    pub const RESOURCES_READ: &str = "resources/read";
    /// List prompts.
    pub const PROMPTS_LIST: &str = "prompts/list";
    /// Render a prompt.
    pub const PROMPTS_GET: &str = "prompts/get";
    /// Adjust server-side log verbosity.
    pub const LOGGING_SET_LEVEL: &str = "logging/setLevel";
    /// Cancel an in-flight request.
    pub const NOTIFICATION_CANCELLED: &str = "notifications/cancelled";
    /// Progress report for a request carrying a progress token.
    pub const NOTIFICATION_PROGRESS: &str = "notifications/progress";
    /// Server log message.
    pub const NOTIFICATION_MESSAGE: &str = "notifications/message";
}
