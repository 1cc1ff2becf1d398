//! Session handshake and lifecycle.
//!
//! ```text
//! Uninitialized ──initialize()──> Initializing ──ok──> Initialized ──close()──> Closed
//!                                      │
//!                                      └──error──> Failed
//! ```
//!
//! There is no way back to `Uninitialized`. A failed or closed client must be
//! discarded and a new one constructed.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use streamcp_http::{HttpTransport, SessionHeaders};
use streamcp_protocol::{
    InitializeParams, InitializeResult, Implementation, JsonRpcNotification, JsonRpcRequest,
    ServerCapabilities, ServerFeature, is_supported_version, methods,
};
use tracing::{debug, info, warn};

use crate::correlator::RequestCorrelator;
use crate::error::{McpClientError, Result};

/// Handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// `initialize` has not been called
    Uninitialized,
    /// Handshake in progress
    Initializing,
    /// Handshake completed; capability operations allowed
    Initialized,
    /// Handshake failed
    Failed,
    /// Session was closed by the client
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Initialized => write!(f, "initialized"),
            Self::Failed => write!(f, "failed"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// An established MCP session.
///
/// Every field is captured from the initialize exchange and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    headers: SessionHeaders,
    server_info: Implementation,
    capabilities: ServerCapabilities,
    features: BTreeSet<ServerFeature>,
    instructions: Option<String>,
}

impl Session {
    /// Server-assigned `Mcp-Session-Id`.
    pub fn session_id(&self) -> &str {
        &self.headers.session_id
    }

    /// Negotiated protocol revision.
    pub fn protocol_version(&self) -> &str {
        &self.headers.protocol_version
    }

    /// Server identity.
    pub fn server_info(&self) -> &Implementation {
        &self.server_info
    }

    /// Raw server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Feature flags derived from the capabilities.
    pub fn features(&self) -> &BTreeSet<ServerFeature> {
        &self.features
    }

    /// Whether the server advertised `feature`.
    pub fn supports(&self, feature: ServerFeature) -> bool {
        self.features.contains(&feature)
    }

    /// Usage hints from the server.
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Headers attached to every request of this session.
    pub fn headers(&self) -> &SessionHeaders {
        &self.headers
    }
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    session: Option<Arc<Session>>,
}

/// Owns the handshake state machine.
#[derive(Debug)]
pub struct SessionManager {
    inner: RwLock<Inner>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Manager in the `Uninitialized` state.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: SessionState::Uninitialized,
                session: None,
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    /// The established session, if any.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.inner.read().session.clone()
    }

    /// Guard for capability operations.
    ///
    /// # Errors
    ///
    /// Returns [`McpClientError::NotInitialized`] unless the state is `Initialized`.
    pub fn ensure_initialized(&self, operation: &str) -> Result<Arc<Session>> {
        let inner = self.inner.read();
        match (&inner.state, &inner.session) {
            (SessionState::Initialized, Some(session)) => Ok(Arc::clone(session)),
            (state, _) => Err(McpClientError::NotInitialized {
                operation: operation.to_string(),
                state: *state,
            }),
        }
    }

    /// Run the initialize handshake.
    ///
    /// 1. `initialize` request without session headers
    /// 2. validate the response and require a non-blank `Mcp-Session-Id` header
    /// 3. require a supported negotiated protocol revision
    /// 4. send `notifications/initialized` as a one-element batch
    ///
    /// Any failure moves the manager to `Failed`.
    ///
    /// # Errors
    ///
    /// - [`McpClientError::Initialization`] if the manager is not `Uninitialized`, the
    ///   session header is missing or blank, the revision is unsupported, or the
    ///   initialized notification is rejected
    /// - transport, protocol and server errors from the initialize exchange itself
    pub async fn initialize(
        &self,
        transport: &HttpTransport,
        correlator: &RequestCorrelator,
        params: InitializeParams,
    ) -> Result<Arc<Session>> {
        {
            let mut inner = self.inner.write();
            if inner.state != SessionState::Uninitialized {
                return Err(McpClientError::Initialization(format!(
                    "session is already {}; construct a new client to start over",
                    inner.state
                )));
            }
            inner.state = SessionState::Initializing;
        }

        match handshake(transport, correlator, params).await {
            Ok(session) => {
                let session = Arc::new(session);
                let mut inner = self.inner.write();
                inner.state = SessionState::Initialized;
                inner.session = Some(Arc::clone(&session));
                info!(
                    session_id = %session.session_id(),
                    protocol_version = %session.protocol_version(),
                    server = %session.server_info(),
                    "MCP session established"
                );
                Ok(session)
            }
            Err(e) => {
                self.inner.write().state = SessionState::Failed;
                warn!(error = %e, "MCP initialization failed");
                Err(e)
            }
        }
    }

    /// Move to `Closed`, returning the session that was active.
    pub fn close(&self) -> Option<Arc<Session>> {
        let mut inner = self.inner.write();
        inner.state = SessionState::Closed;
        inner.session.take()
    }
}

async fn handshake(
    transport: &HttpTransport,
    correlator: &RequestCorrelator,
    params: InitializeParams,
) -> Result<Session> {
    let pending = correlator.register(methods::INITIALIZE);
    let id = pending.id();
    let requested = params.protocol_version.clone();

    let params = serde_json::to_value(&params)
        .map_err(|e| McpClientError::Initialization(format!("cannot encode params: {e}")))?;
    let request = JsonRpcRequest::new(id, methods::INITIALIZE, Some(params));
    debug!(id, protocol_version = %requested, "Sending initialize");

    let response = transport
        .send(&request, None)
        .await
        .map_err(|e| McpClientError::from_transport(e, methods::INITIALIZE, Some(id)))?;
    let result = correlator.validate(response.json()?, id, methods::INITIALIZE)?;

    let session_id = response.session_id().ok_or_else(|| {
        McpClientError::Initialization(
            "server did not return an Mcp-Session-Id header".to_string(),
        )
    })?;

    let init: InitializeResult = serde_json::from_value(result)
        .map_err(|e| McpClientError::MalformedResponse(format!("invalid initialize result: {e}")))?;

    if !is_supported_version(&init.protocol_version) {
        return Err(McpClientError::Initialization(format!(
            "server negotiated unsupported protocol version {}",
            init.protocol_version
        )));
    }
    if init.protocol_version != requested {
        debug!(
            requested = %requested,
            negotiated = %init.protocol_version,
            "Server negotiated a different protocol version"
        );
    }

    let headers = SessionHeaders::new(session_id, init.protocol_version);
    drop(pending);

    let initialized = vec![JsonRpcNotification::new(
        methods::NOTIFICATION_INITIALIZED,
        None,
    )];
    transport
        .notify(&initialized, Some(&headers))
        .await
        .map_err(|e| {
            McpClientError::Initialization(format!(
                "failed to send {}: {e}",
                methods::NOTIFICATION_INITIALIZED
            ))
        })?;

    Ok(Session {
        features: init.capabilities.features(),
        headers,
        server_info: init.server_info,
        capabilities: init.capabilities,
        instructions: init.instructions,
    })
}
