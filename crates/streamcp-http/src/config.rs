//! Transport configuration and per-session header state.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{TransportError, TransportResult};

/// Session header name.
pub const MCP_SESSION_ID_HEADER: &str = "Mcp-Session-Id";

/// Protocol version header name.
pub const MCP_PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";

/// `Accept` value for POST requests.
pub const ACCEPT_JSON_AND_SSE: &str = "application/json, text/event-stream";

/// `Accept` value for the notification stream.
pub const ACCEPT_SSE: &str = "text/event-stream";

/// Streamable HTTP transport configuration.
#[derive(Clone)]
pub struct HttpTransportConfig {
    /// Full MCP endpoint URL (e.g. `http://localhost:3001/mcp`)
    pub endpoint: Url,

    /// Upper bound for one request/response exchange
    pub request_timeout: Duration,

    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,

    /// Bearer token sent as `Authorization`
    pub auth_token: Option<String>,

    /// Extra headers sent on every request
    pub headers: HashMap<String, String>,

    /// User agent string (`None` disables the header)
    ///
    /// Default: `streamcp/{version}`
    pub user_agent: Option<String>,
}

impl HttpTransportConfig {
    /// Configuration with default timeouts for `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            auth_token: None,
            headers: HashMap::new(),
            user_agent: Some(format!("streamcp/{}", env!("CARGO_PKG_VERSION"))),
        }
    }

    /// Headers sent on every request regardless of session state.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if the token or a custom header is not a
    /// valid HTTP header.
    pub(crate) fn default_headers(&self) -> TransportResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &self.auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                TransportError::Configuration("auth token is not a valid header value".into())
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                TransportError::Configuration(format!("invalid header name: {key}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                TransportError::Configuration(format!("invalid value for header {key}"))
            })?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

impl fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Headers that identify an established session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionHeaders {
    /// Server-assigned `Mcp-Session-Id`
    pub session_id: String,
    /// Negotiated protocol revision
    pub protocol_version: String,
}

impl SessionHeaders {
    /// Create session headers.
    pub fn new(session_id: impl Into<String>, protocol_version: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            protocol_version: protocol_version.into(),
        }
    }

    pub(crate) fn apply(&self, headers: &mut HeaderMap) -> TransportResult<()> {
        let session = HeaderValue::from_str(&self.session_id).map_err(|_| {
            TransportError::Configuration(format!(
                "session id is not a valid header value: {:?}",
                self.session_id
            ))
        })?;
        headers.insert(MCP_SESSION_ID_HEADER, session);

        if let Ok(version) = HeaderValue::from_str(&self.protocol_version) {
            headers.insert(MCP_PROTOCOL_VERSION_HEADER, version);
        }
        Ok(())
    }
}
