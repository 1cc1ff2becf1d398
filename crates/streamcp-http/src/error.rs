//! Transport error types.

use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors raised while moving bytes to and from the MCP endpoint.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TransportError {
    /// Connection refused, reset, DNS failure or a broken body stream.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from MCP endpoint{}", body_suffix(.body))]
    Status {
        /// HTTP status code
        status: u16,
        /// Leading part of the response body, for diagnostics
        body: String,
    },

    /// No response within the configured request timeout.
    #[error(
        "Request timed out after {timeout:?} for operation: {operation}. \
         If this is expected, increase `request_timeout` in the client configuration"
    )]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// The timeout that was exceeded
        timeout: Duration,
    },

    /// The body is neither a JSON document nor a parseable SSE frame.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The transport was configured with invalid parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The outgoing payload could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Longest body excerpt carried in [`TransportError::Status`].
pub(crate) const STATUS_BODY_EXCERPT: usize = 512;

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

impl TransportError {
    pub(crate) fn status(status: u16, body: &str) -> Self {
        let mut excerpt: String = body.chars().take(STATUS_BODY_EXCERPT).collect();
        if excerpt.len() < body.len() {
            excerpt.push_str("...");
        }
        Self::Status {
            status,
            body: excerpt,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, operation: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: operation.to_string(),
                timeout,
            }
        } else if err.is_builder() {
            Self::Configuration(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}
