//! Cancellable server-to-client notification stream.
//!
//! [`EventStream`] wraps the body of a `GET` request opened with
//! `Accept: text/event-stream`. It is lazy, potentially infinite and cannot be
//! restarted. Cancelling it drops the response body, which closes the connection, and
//! ends the sequence with `None` rather than an error.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, info};

use crate::error::TransportResult;
use crate::sse::{SseEvent, SseParser};

/// Cancels an [`EventStream`] from anywhere, including another task.
#[derive(Clone, Debug)]
pub struct StreamHandle {
    token: CancellationToken,
}

impl StreamHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Sequence of server-sent events from the notification stream.
pub struct EventStream {
    body: Option<BoxStream<'static, TransportResult<Bytes>>>,
    parser: SseParser,
    pending: VecDeque<SseEvent>,
    token: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    finished: bool,
}

impl EventStream {
    pub(crate) fn new<S>(body: S) -> Self
    where
        S: Stream<Item = TransportResult<Bytes>> + Send + 'static,
    {
        let token = CancellationToken::new();
        Self {
            body: Some(body.boxed()),
            parser: SseParser::new(),
            pending: VecDeque::new(),
            cancelled: Box::pin(token.clone().cancelled_owned()),
            token,
            finished: false,
        }
    }

    /// Handle that cancels this stream.
    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            token: self.token.clone(),
        }
    }

    /// Cancel the stream and release the connection immediately.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.shutdown();
    }

    /// Whether the connection has been released.
    pub fn is_closed(&self) -> bool {
        self.body.is_none()
    }

    fn shutdown(&mut self) {
        if self.body.take().is_some() {
            info!("Notification stream cancelled");
        }
        self.pending.clear();
        self.finished = true;
    }
}

impl Stream for EventStream {
    type Item = TransportResult<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.token.is_cancelled() || this.cancelled.as_mut().poll(cx).is_ready() {
                this.shutdown();
                return Poll::Ready(None);
            }

            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            let Some(body) = this.body.as_mut() else {
                this.finished = true;
                return Poll::Ready(None);
            };

            match body.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => {
                    let events = this.parser.feed(&chunk);
                    debug!(bytes = chunk.len(), events = events.len(), "SSE chunk");
                    this.pending.extend(events);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.body = None;
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    debug!("Notification stream ended by server");
                    this.body = None;
                    this.finished = true;
                    if let Some(event) = this.parser.finish() {
                        this.pending.push_back(event);
                    }
                }
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("open", &self.body.is_some())
            .field("pending", &self.pending.len())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
