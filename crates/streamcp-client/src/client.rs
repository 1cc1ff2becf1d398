//! Core client: request path, lifecycle and descriptor cache.
//!
//! Capability operations live in [`crate::operations`]; each one goes through
//! [`McpClient::request`]:
//!
//! ```text
//! ensure_initialized ─> register id ─> POST ─> extract JSON ─> validate ─> decode
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use streamcp_http::{EventStream, HttpTransport};
use streamcp_protocol::{
    CancelledParams, InitializeParams, JsonRpcNotification, JsonRpcRequest, Prompt, RequestId,
    Resource, ResourceTemplate, Tool, methods,
};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::correlator::{PendingRequest, RequestCorrelator};
use crate::error::{McpClientError, Result};
use crate::session::{Session, SessionManager, SessionState};

/// How a [`McpClient::close`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The server accepted the `DELETE`
    Acknowledged,
    /// The `DELETE` failed or was refused; the session is closed locally anyway
    NotAcknowledged,
    /// There was no established session to terminate
    NoSession,
}

/// Descriptor lists from the last explicit list calls.
#[derive(Debug, Default)]
pub(crate) struct DescriptorCache {
    pub(crate) tools: Option<Vec<Tool>>,
    pub(crate) resources: Option<Vec<Resource>>,
    pub(crate) resource_templates: Option<Vec<ResourceTemplate>>,
    pub(crate) prompts: Option<Vec<Prompt>>,
}

/// MCP client over Streamable HTTP.
///
/// One client owns one session. Request/response calls are meant to be issued one at a
/// time; the notification stream from
/// [`open_notification_stream`](Self::open_notification_stream) uses its own connection
/// and may run concurrently.
///
/// # Examples
///
/// ```rust,no_run
/// use serde_json::json;
/// use streamcp_client::{ClientConfig, McpClient};
///
/// # async fn example() -> streamcp_client::Result<()> {
/// let client = McpClient::new(ClientConfig::new("http://localhost:3001"))?;
/// let session = client.initialize().await?;
/// println!("session {}", session.session_id());
///
/// let echoed = client.call_tool("echo", json!({"message": "hi"})).await?;
/// println!("{}", echoed.text());
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct McpClient {
    config: ClientConfig,
    transport: HttpTransport,
    correlator: RequestCorrelator,
    session: SessionManager,
    pub(crate) cache: RwLock<DescriptorCache>,
}

impl McpClient {
    /// Create a client. No network traffic happens until [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// Returns [`McpClientError::Configuration`] if the configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.transport_config()?)?;
        debug!(endpoint = %transport.endpoint(), "MCP client created");

        Ok(Self {
            config,
            transport,
            correlator: RequestCorrelator::new(),
            session: SessionManager::new(),
            cache: RwLock::new(DescriptorCache::default()),
        })
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handshake state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// The established session, if any.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.session()
    }

    /// Requests awaiting a response.
    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        self.correlator.pending()
    }

    /// Perform the initialize handshake.
    ///
    /// Sends `initialize` with the configured protocol version, capabilities and client
    /// identity, captures the `Mcp-Session-Id` header and acknowledges with
    /// `notifications/initialized`. May be called once per client.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::initialize`]. The client is unusable after a failure.
    pub async fn initialize(&self) -> Result<Arc<Session>> {
        let params = InitializeParams {
            protocol_version: self.config.protocol_version.clone(),
            capabilities: self.config.capabilities.clone(),
            client_info: self.config.client_info.clone(),
        };
        self.session
            .initialize(&self.transport, &self.correlator, params)
            .await
    }

    /// End the session.
    ///
    /// Sends `DELETE` best-effort, then moves to `Closed` regardless of the outcome.
    /// Later capability calls fail with [`McpClientError::NotInitialized`].
    ///
    /// # Errors
    ///
    /// Currently infallible; a refused `DELETE` is reported as
    /// [`CloseOutcome::NotAcknowledged`].
    pub async fn close(&self) -> Result<CloseOutcome> {
        let Some(session) = self.session.close() else {
            return Ok(CloseOutcome::NoSession);
        };
        *self.cache.write() = DescriptorCache::default();

        match self.transport.terminate_session(session.headers()).await {
            Ok(()) => {
                info!(session_id = %session.session_id(), "MCP session closed");
                Ok(CloseOutcome::Acknowledged)
            }
            Err(e) => {
                warn!(
                    session_id = %session.session_id(),
                    error = %e,
                    "Session termination not acknowledged"
                );
                Ok(CloseOutcome::NotAcknowledged)
            }
        }
    }

    /// Open the server-to-client notification stream (`GET`).
    ///
    /// The stream runs independently of request/response calls and ends when cancelled
    /// through [`EventStream::cancel`] or its [`StreamHandle`](streamcp_http::StreamHandle).
    ///
    /// # Errors
    ///
    /// - [`McpClientError::NotInitialized`] before the handshake
    /// - [`McpClientError::Transport`] if the server refuses the stream
    pub async fn open_notification_stream(&self) -> Result<EventStream> {
        let session = self.session.ensure_initialized("open_notification_stream")?;
        Ok(self.transport.open_stream(session.headers()).await?)
    }

    /// Ask the server to cancel request `request_id` via `notifications/cancelled`.
    ///
    /// The client never cancels on its own; use the id carried by
    /// [`McpClientError::Timeout`].
    ///
    /// # Errors
    ///
    /// - [`McpClientError::NotInitialized`] before the handshake
    /// - [`McpClientError::InvalidArgument`] for an id this session never issued
    /// - [`McpClientError::Transport`] if the notification is rejected
    pub async fn cancel_request(&self, request_id: RequestId, reason: impl Into<String>) -> Result<()> {
        self.active_session(methods::NOTIFICATION_CANCELLED)?;
        if !self.correlator.is_issued(request_id) {
            return Err(McpClientError::InvalidArgument(format!(
                "request id {request_id} was not issued by this session"
            )));
        }
        let params = CancelledParams {
            request_id,
            reason: Some(reason.into()),
        };
        self.notify(methods::NOTIFICATION_CANCELLED, Some(params))
            .await
    }

    /// Send a request and decode its result.
    pub(crate) async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let result = self.request_value(method, params).await?;
        serde_json::from_value(result).map_err(|e| {
            McpClientError::MalformedResponse(format!("invalid {method} result: {e}"))
        })
    }

    /// Send a request and return its raw `result`.
    pub(crate) async fn request_value<P>(&self, method: &str, params: Option<P>) -> Result<Value>
    where
        P: Serialize,
    {
        let session = self.session.ensure_initialized(method)?;
        let params = params.map(|p| encode_params(method, &p)).transpose()?;

        let pending = self.correlator.register(method);
        let id = pending.id();
        let request = JsonRpcRequest::new(id, method, params);
        debug!(method, id, "Sending request");

        let response = self
            .transport
            .send(&request, Some(session.headers()))
            .await
            .map_err(|e| McpClientError::from_transport(e, method, Some(id)))?;

        self.correlator.validate(response.json()?, id, method)
    }

    /// Send a notification within the session.
    pub(crate) async fn notify<P>(&self, method: &str, params: Option<P>) -> Result<()>
    where
        P: Serialize,
    {
        let session = self.session.ensure_initialized(method)?;
        let params = params.map(|p| encode_params(method, &p)).transpose()?;
        let notification = JsonRpcNotification::new(method, params);
        debug!(method, "Sending notification");

        Ok(self
            .transport
            .notify(&notification, Some(session.headers()))
            .await?)
    }

    /// Session guard for operations that need capability flags before sending.
    pub(crate) fn active_session(&self, operation: &str) -> Result<Arc<Session>> {
        self.session.ensure_initialized(operation)
    }
}

fn encode_params<P: Serialize>(method: &str, params: &P) -> Result<Value> {
    serde_json::to_value(params)
        .map_err(|e| McpClientError::InvalidArgument(format!("cannot encode {method} params: {e}")))
}
