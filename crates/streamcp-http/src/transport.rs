//! Streamable HTTP transport.
//!
//! One MCP endpoint serves every exchange:
//!
//! - `POST` carries a JSON-RPC request or notification. The server answers with a bare
//!   JSON document, a single SSE frame, or `202 Accepted` for notifications.
//! - `GET` opens the server-to-client notification stream.
//! - `DELETE` terminates the session.
//!
//! The transport never retries. Every failure is returned to the caller as a
//! [`TransportError`].

use std::future::Future;
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{
    ACCEPT_JSON_AND_SSE, ACCEPT_SSE, HttpTransportConfig, MCP_SESSION_ID_HEADER, SessionHeaders,
};
use crate::error::{TransportError, TransportResult};
use crate::sse::{extract_json, extract_sse_json, is_event_stream_body};
use crate::stream::EventStream;

/// A fully-read HTTP response.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `Mcp-Session-Id` header value, trimmed. Blank values count as absent.
    ///
    /// Header lookup is case-insensitive, so `mcp-session-id` and `MCP-SESSION-ID` are
    /// found as well.
    pub fn session_id(&self) -> Option<&str> {
        self.headers
            .get(MCP_SESSION_ID_HEADER)?
            .to_str()
            .ok()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE)?.to_str().ok()
    }

    /// Whether the server answered with an SSE frame.
    pub fn is_event_stream(&self) -> bool {
        self.declares_event_stream() || is_event_stream_body(&self.body)
    }

    fn declares_event_stream(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.starts_with(ACCEPT_SSE))
    }

    /// Extract the JSON document from the body.
    ///
    /// A `text/event-stream` content type selects SSE extraction outright; otherwise
    /// the framing is detected from the body.
    ///
    /// # Errors
    ///
    /// See [`extract_json`] and [`extract_sse_json`].
    pub fn json(&self) -> TransportResult<Value> {
        if self.declares_event_stream() {
            extract_sse_json(&self.body)
        } else {
            extract_json(&self.body)
        }
    }
}

/// Streamable HTTP transport bound to one MCP endpoint.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    config: HttpTransportConfig,
    http_client: HttpClient,
}

impl HttpTransport {
    /// Create a transport.
    ///
    /// The underlying client only bounds connection setup. Request deadlines are applied
    /// per exchange so that the notification stream can stay open indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if the endpoint is not http(s), a header
    /// is invalid, or the HTTP client cannot be built.
    pub fn new(config: HttpTransportConfig) -> TransportResult<Self> {
        if !matches!(config.endpoint.scheme(), "http" | "https") {
            return Err(TransportError::Configuration(format!(
                "unsupported endpoint scheme: {}",
                config.endpoint.scheme()
            )));
        }

        let mut builder = HttpClient::builder()
            .connect_timeout(config.connect_timeout)
            .default_headers(config.default_headers()?);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let http_client = builder.build().map_err(|e| {
            TransportError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    /// Transport configuration.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// POST a JSON-RPC payload and read the whole response.
    ///
    /// `session` is `None` only for the initialize request.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Serialization`] if `payload` cannot be encoded
    /// - [`TransportError::Timeout`] if no complete response arrives within
    ///   `request_timeout`
    /// - [`TransportError::Status`] on a non-2xx status
    /// - [`TransportError::Connection`] on network failure
    pub async fn send<T>(
        &self,
        payload: &T,
        session: Option<&SessionHeaders>,
    ) -> TransportResult<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_JSON_AND_SSE));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(session) = session {
            session.apply(&mut headers)?;
        }

        let request = self
            .http_client
            .post(self.config.endpoint.clone())
            .headers(headers)
            .body(body);

        let started = Instant::now();
        let response = self.exchange("POST", request).await?;
        debug!(
            status = response.status,
            content_type = response.content_type().unwrap_or(""),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "POST completed"
        );

        if !response.is_success() {
            return Err(TransportError::status(response.status, &response.body));
        }
        Ok(response)
    }

    /// POST a notification. Any 2xx counts as acknowledged.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn notify<T>(&self, payload: &T, session: Option<&SessionHeaders>) -> TransportResult<()>
    where
        T: Serialize + ?Sized,
    {
        let response = self.send(payload, session).await?;
        if response.status != 202 {
            debug!(status = response.status, "Notification acknowledged with non-202 status");
        }
        Ok(())
    }

    /// Open the server-to-client notification stream.
    ///
    /// Only waiting for the response headers is bounded by `request_timeout`; the
    /// returned stream itself never times out.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Status`] on a non-2xx status (405 when the server offers no
    ///   stream)
    /// - [`TransportError::MalformedResponse`] if the response is not `text/event-stream`
    /// - [`TransportError::Timeout`] / [`TransportError::Connection`] as for `send`
    pub async fn open_stream(&self, session: &SessionHeaders) -> TransportResult<EventStream> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_SSE));
        session.apply(&mut headers)?;

        let timeout = self.config.request_timeout;
        let response = with_deadline(
            "GET",
            timeout,
            self.http_client
                .get(self.config.endpoint.clone())
                .headers(headers)
                .send(),
        )
        .await?
        .map_err(|e| TransportError::from_reqwest(e, "GET", timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::status(status.as_u16(), &body));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with(ACCEPT_SSE) {
            return Err(TransportError::MalformedResponse(format!(
                "expected text/event-stream, got {content_type:?}"
            )));
        }

        info!(session_id = %session.session_id, "Notification stream opened");
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Connection(e.to_string())));
        Ok(EventStream::new(body))
    }

    /// Ask the server to end the session with `DELETE`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Status`] if the server refuses (405 when it does not allow
    /// client-initiated termination), or any network error.
    pub async fn terminate_session(&self, session: &SessionHeaders) -> TransportResult<()> {
        let mut headers = HeaderMap::new();
        session.apply(&mut headers)?;

        let request = self
            .http_client
            .request(Method::DELETE, self.config.endpoint.clone())
            .headers(headers);
        let response = self.exchange("DELETE", request).await?;

        if !response.is_success() {
            warn!(
                status = response.status,
                session_id = %session.session_id,
                "Server rejected session termination"
            );
            return Err(TransportError::status(response.status, &response.body));
        }
        Ok(())
    }

    /// Send `request` and read the full body within `request_timeout`.
    async fn exchange(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> TransportResult<HttpResponse> {
        let timeout = self.config.request_timeout;
        with_deadline(operation, timeout, async move {
            let response = request
                .send()
                .await
                .map_err(|e| TransportError::from_reqwest(e, operation, timeout))?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::from_reqwest(e, operation, timeout))?;
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
        .await?
    }
}

/// Bound `fut` by `timeout`, dropping it (and aborting the HTTP call) on expiry.
async fn with_deadline<F: Future>(
    operation: &str,
    timeout: Duration,
    fut: F,
) -> TransportResult<F::Output> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| TransportError::Timeout {
            operation: operation.to_string(),
            timeout,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(headers: &[(&'static str, &'static str)], body: &str) -> HttpResponse {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.insert(*k, HeaderValue::from_static(v));
        }
        HttpResponse {
            status: 200,
            headers: map,
            body: body.to_string(),
        }
    }

    #[test]
    fn session_id_lookup_ignores_case_and_blank_values() {
        assert_eq!(
            response(&[("mcp-session-id", " abc123 ")], "").session_id(),
            Some("abc123")
        );
        assert_eq!(response(&[("mcp-session-id", "   ")], "").session_id(), None);
        assert_eq!(response(&[], "").session_id(), None);
    }

    #[test]
    fn event_stream_detected_by_header_or_body() {
        assert!(response(&[("content-type", "text/event-stream")], "").is_event_stream());
        assert!(response(&[], "event: message\ndata: {}\n\n").is_event_stream());
        assert!(!response(&[("content-type", "application/json")], "{}").is_event_stream());
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let config = HttpTransportConfig::new(Url::parse("ftp://localhost/mcp").unwrap());
        assert!(matches!(
            HttpTransport::new(config),
            Err(TransportError::Configuration(_))
        ));
    }
}
