//! Capability operations
//!
//! Each submodule adds an `impl McpClient` block for one area of the protocol.

mod connection;
mod prompts;
mod resources;
mod tools;

pub use resources::ResourceRef;

use serde::de::DeserializeOwned;
use streamcp_protocol::{Paginated, PaginatedParams};
use tracing::debug;

use crate::client::McpClient;
use crate::error::{McpClientError, Result};

impl McpClient {
    /// Fetch every page of a `*/list` method.
    ///
    /// Stops at the configured page limit so a server that keeps returning cursors
    /// cannot loop forever.
    pub(crate) async fn list_all<P>(&self, method: &str) -> Result<Vec<P::Item>>
    where
        P: Paginated + DeserializeOwned,
    {
        let limit = self.config().page_limit;
        let mut items = Vec::new();
        let mut cursor = None;

        for page in 1..=limit {
            let result: P = self
                .request(method, Some(PaginatedParams { cursor: cursor.take() }))
                .await?;
            let next = result.next_cursor().map(str::to_owned);
            items.extend(result.into_items());

            match next {
                Some(next) => {
                    debug!(method, page, "Following nextCursor");
                    cursor = Some(next);
                }
                None => return Ok(items),
            }
        }

        Err(McpClientError::MalformedResponse(format!(
            "{method} still returned a cursor after {limit} pages"
        )))
    }
}
