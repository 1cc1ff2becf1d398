//! Connection utilities: liveness and server log level.

use streamcp_protocol::{EmptyResult, LoggingLevel, ServerFeature, SetLevelParams, methods};

use crate::client::McpClient;
use crate::error::{McpClientError, Result};

impl McpClient {
    /// Check that the server is responsive.
    pub async fn ping(&self) -> Result<()> {
        let _: EmptyResult = self.request(methods::PING, None::<()>).await?;
        Ok(())
    }

    /// Set the minimum level of `notifications/message` the server emits.
    ///
    /// # Errors
    ///
    /// [`McpClientError::InvalidArgument`] without sending anything if the server did
    /// not advertise the `logging` capability.
    pub async fn set_log_level(&self, level: LoggingLevel) -> Result<()> {
        let session = self.active_session(methods::LOGGING_SET_LEVEL)?;
        if !session.supports(ServerFeature::Logging) {
            return Err(McpClientError::InvalidArgument(
                "server did not advertise the logging capability".to_string(),
            ));
        }

        let _: EmptyResult = self
            .request(methods::LOGGING_SET_LEVEL, Some(SetLevelParams { level }))
            .await?;
        Ok(())
    }
}
