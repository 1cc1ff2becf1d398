//! Tool operations: listing, calling, and numeric result extraction.

use serde_json::{Map, Value, json};
use streamcp_protocol::{
    CallToolParams, CallToolResult, ListToolsResult, ProgressToken, RequestMeta, Tool, methods,
};
use tracing::debug;

use crate::client::McpClient;
use crate::error::{McpClientError, Result};
use crate::numeric::numeric_result;
use crate::validation::require_name;

const GENERIC_TOOL_FAILURE: &str = "tool reported an error without a text message";

impl McpClient {
    /// List all tools, following pagination.
    ///
    /// The result replaces the cached list returned by [`cached_tools`](Self::cached_tools).
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use streamcp_client::{ClientConfig, McpClient};
    /// # async fn example() -> streamcp_client::Result<()> {
    /// let client = McpClient::new(ClientConfig::new("http://localhost:3001"))?;
    /// client.initialize().await?;
    ///
    /// for tool in client.list_tools().await? {
    ///     println!("{} - {}", tool.name, tool.description.as_deref().unwrap_or(""));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let tools = self.list_all::<ListToolsResult>(methods::TOOLS_LIST).await?;
        self.cache.write().tools = Some(tools.clone());
        Ok(tools)
    }

    /// Tools from the last [`list_tools`](Self::list_tools) call. Never refreshed
    /// implicitly.
    pub fn cached_tools(&self) -> Option<Vec<Tool>> {
        self.cache.read().tools.clone()
    }

    /// Call a tool.
    ///
    /// `arguments` must be a JSON object (or `null` for no arguments).
    ///
    /// # Errors
    ///
    /// - [`McpClientError::InvalidArgument`] for an empty name or non-object arguments
    /// - [`McpClientError::ToolExecution`] if the result has `isError: true`, carrying
    ///   the first text item
    /// - [`McpClientError::MalformedResponse`] if a successful result has no content
    /// - any transport, protocol or server error from the request
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        self.invoke_tool(name, arguments, None).await
    }

    /// Call a tool with `_meta.progressToken` set.
    ///
    /// Progress notifications for the token arrive on the notification stream; decode
    /// them with [`SseEvent::notification`](streamcp_http::SseEvent::notification).
    pub async fn call_tool_with_progress(
        &self,
        name: &str,
        arguments: Value,
        progress_token: impl Into<ProgressToken>,
    ) -> Result<CallToolResult> {
        let meta = RequestMeta {
            progress_token: Some(progress_token.into()),
        };
        self.invoke_tool(name, arguments, Some(meta)).await
    }

    /// Call a tool whose answer is a single number.
    ///
    /// Structured content is preferred; prose answers go through the ordered fallbacks
    /// in [`parse_numeric_text`](crate::numeric::parse_numeric_text).
    ///
    /// # Errors
    ///
    /// [`McpClientError::UnparsableResult`] if no number can be recovered, plus
    /// everything [`call_tool`](Self::call_tool) returns.
    pub async fn call_numeric_tool(&self, name: &str, arguments: Value) -> Result<f64> {
        let result = self.call_tool(name, arguments).await?;
        numeric_result(&result)
    }

    /// `add(a, b)` on the reference server.
    pub async fn add(&self, a: f64, b: f64) -> Result<f64> {
        self.call_numeric_tool("add", json!({"a": a, "b": b})).await
    }

    async fn invoke_tool(
        &self,
        name: &str,
        arguments: Value,
        meta: Option<RequestMeta>,
    ) -> Result<CallToolResult> {
        self.active_session(methods::TOOLS_CALL)?;
        require_name("tool", name)?;
        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(McpClientError::InvalidArgument(format!(
                    "tool arguments must be a JSON object, got {other}"
                )));
            }
        };

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
            meta,
        };
        let result: CallToolResult = self.request(methods::TOOLS_CALL, Some(params)).await?;

        if result.is_error() {
            let message = result.first_text().unwrap_or(GENERIC_TOOL_FAILURE);
            debug!(tool = name, message, "Tool reported isError");
            return Err(McpClientError::ToolExecution {
                tool: name.to_string(),
                message: message.to_string(),
            });
        }
        if result.content.is_empty() {
            return Err(McpClientError::MalformedResponse(format!(
                "tool '{name}' returned no content"
            )));
        }
        Ok(result)
    }
}
