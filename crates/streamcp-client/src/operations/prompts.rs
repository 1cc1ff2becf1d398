//! Prompt operations.

use streamcp_protocol::{GetPromptParams, GetPromptResult, ListPromptsResult, Prompt, methods};

use crate::client::McpClient;
use crate::error::{McpClientError, Result};
use crate::validation::require_name;

impl McpClient {
    /// List all prompts, following pagination. Replaces the cached list.
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let prompts = self
            .list_all::<ListPromptsResult>(methods::PROMPTS_LIST)
            .await?;
        self.cache.write().prompts = Some(prompts.clone());
        Ok(prompts)
    }

    /// Prompts from the last [`list_prompts`](Self::list_prompts) call.
    pub fn cached_prompts(&self) -> Option<Vec<Prompt>> {
        self.cache.read().prompts.clone()
    }

    /// Render a prompt. Argument values are strings on the wire.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use streamcp_client::{ClientConfig, McpClient};
    /// # async fn example() -> streamcp_client::Result<()> {
    /// # let client = McpClient::new(ClientConfig::new("http://localhost:3001"))?;
    /// # client.initialize().await?;
    /// let prompt = client
    ///     .get_prompt("complex_prompt", [("temperature", "0.7"), ("style", "terse")])
    ///     .await?;
    /// for message in &prompt.messages {
    ///     println!("{:?}: {:?}", message.role, message.content.as_text());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// - [`McpClientError::InvalidArgument`] for an empty name
    /// - [`McpClientError::MalformedResponse`] if the prompt renders no messages
    pub async fn get_prompt<I, K, V>(&self, name: &str, arguments: I) -> Result<GetPromptResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.active_session(methods::PROMPTS_GET)?;
        require_name("prompt", name)?;

        let params = GetPromptParams {
            name: name.to_string(),
            arguments: arguments
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        };
        let result: GetPromptResult = self.request(methods::PROMPTS_GET, Some(params)).await?;
        if result.messages.is_empty() {
            return Err(McpClientError::MalformedResponse(format!(
                "prompt '{name}' rendered no messages"
            )));
        }
        Ok(result)
    }
}
