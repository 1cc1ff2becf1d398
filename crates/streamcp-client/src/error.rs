//! Client error taxonomy.
//!
//! Every failure is returned to the immediate caller; nothing is retried or swallowed
//! inside the client. Use [`McpClientError::category`] to tell apart transport,
//! protocol, server and tool-level failures without matching on message text.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use streamcp_http::TransportError;
use streamcp_protocol::RequestId;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, McpClientError>;

/// Errors raised by [`McpClient`](crate::McpClient).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum McpClientError {
    /// Network or HTTP failure: connection refused, non-2xx status
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),

    /// Body is neither bare JSON nor a parseable SSE frame, or the result does not
    /// have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Handshake failed: missing session header, unsupported protocol version, or the
    /// initialized notification could not be delivered
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// A capability operation was attempted outside the `Initialized` state
    #[error("Cannot call '{operation}': session is {state}, call initialize first")]
    NotInitialized {
        /// Operation that was refused
        operation: String,
        /// Session state at the time of the call
        state: crate::session::SessionState,
    },

    /// Response `jsonrpc` field is not `"2.0"`
    #[error("Unexpected JSON-RPC version: expected '{expected}', got '{actual}'")]
    ProtocolVersion {
        /// Version the client speaks
        expected: String,
        /// Version found in the response
        actual: String,
    },

    /// Response `id` does not match the request
    #[error("Response id {actual} does not match request id {expected}")]
    IdMismatch {
        /// Id of the request that was sent
        expected: RequestId,
        /// Id found in the response, rendered as JSON
        actual: String,
    },

    /// JSON-RPC error object returned by the server
    #[error("Server error [{code}]: {message}")]
    Server {
        /// JSON-RPC error code
        code: i32,
        /// Error message
        message: String,
        /// Additional error data
        data: Option<Value>,
    },

    /// Response carries neither `result` nor `error`
    #[error("Response to '{method}' has no result")]
    EmptyResult {
        /// Method of the request
        method: String,
    },

    /// Tool ran but reported `isError: true`
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution {
        /// Tool name
        tool: String,
        /// Message from the first text content item
        message: String,
    },

    /// Caller-supplied argument rejected before any request was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Numeric value could not be recovered from a tool's text result
    #[error("Could not parse a numeric result from: {text:?}")]
    UnparsableResult {
        /// Text that was inspected
        text: String,
    },

    /// No response within the request timeout
    #[error("Request '{method}'{} timed out after {timeout:?}", request_suffix(.request_id))]
    Timeout {
        /// Method of the request
        method: String,
        /// Id of the request, usable with `cancel_request`
        request_id: Option<RequestId>,
        /// Timeout that was exceeded
        timeout: Duration,
    },

    /// Invalid client configuration
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

fn request_suffix(id: &Option<RequestId>) -> String {
    match id {
        Some(id) => format!(" (id {id})"),
        None => String::new(),
    }
}

impl McpClientError {
    /// Stage at which the failure happened.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => ErrorCategory::Transport,
            Self::MalformedResponse(_)
            | Self::Initialization(_)
            | Self::ProtocolVersion { .. }
            | Self::IdMismatch { .. }
            | Self::EmptyResult { .. } => ErrorCategory::Protocol,
            Self::Server { .. } => ErrorCategory::Server,
            Self::ToolExecution { .. } | Self::UnparsableResult { .. } => {
                ErrorCategory::Application
            }
            Self::NotInitialized { .. } | Self::InvalidArgument(_) | Self::Configuration(_) => {
                ErrorCategory::Usage
            }
        }
    }

    /// Whether the session stays usable after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Server { .. }
                | Self::ToolExecution { .. }
                | Self::Timeout { .. }
                | Self::InvalidArgument(_)
                | Self::UnparsableResult { .. }
        )
    }

    /// Convert a transport failure of request `id`.
    pub(crate) fn from_transport(err: TransportError, method: &str, id: Option<RequestId>) -> Self {
        match err {
            TransportError::Timeout { timeout, .. } => Self::Timeout {
                method: method.to_string(),
                request_id: id,
                timeout,
            },
            other => other.into(),
        }
    }
}

impl From<TransportError> for McpClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { operation, timeout } => Self::Timeout {
                method: operation,
                request_id: None,
                timeout,
            },
            TransportError::MalformedResponse(msg) => Self::MalformedResponse(msg),
            TransportError::Configuration(msg) => Self::Configuration(ConfigError::Invalid(msg)),
            other => Self::Transport(other),
        }
    }
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network, HTTP status, timeout
    Transport,
    /// Envelope or handshake inconsistent with the protocol
    Protocol,
    /// JSON-RPC error returned by the server
    Server,
    /// Tool-level failure or unusable tool output
    Application,
    /// Caller misuse caught locally
    Usage,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "Transport"),
            Self::Protocol => write!(f, "Protocol"),
            Self::Server => write!(f, "Server"),
            Self::Application => write!(f, "Application"),
            Self::Usage => write!(f, "Usage"),
        }
    }
}
