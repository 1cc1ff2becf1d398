//! Resource operations.

use std::collections::HashMap;

use streamcp_protocol::{
    GetPromptResult, ListResourceTemplatesResult, ListResourcesResult, ReadResourceParams,
    ReadResourceResult, Resource, ResourceTemplate, methods,
};

use crate::client::McpClient;
use crate::error::{McpClientError, Result};
use crate::validation::resource_id;

/// What to read: a bare URI or a descriptor from [`McpClient::list_resources`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceRef {
    /// Resource URI
    Uri(String),
    /// Listed resource
    Descriptor(Resource),
}

impl ResourceRef {
    /// URI to read.
    pub fn uri(&self) -> &str {
        match self {
            Self::Uri(uri) => uri,
            Self::Descriptor(resource) => &resource.uri,
        }
    }
}

impl From<&str> for ResourceRef {
    fn from(uri: &str) -> Self {
        Self::Uri(uri.to_string())
    }
}

impl From<String> for ResourceRef {
    fn from(uri: String) -> Self {
        Self::Uri(uri)
    }
}

impl From<Resource> for ResourceRef {
    fn from(resource: Resource) -> Self {
        Self::Descriptor(resource)
    }
}

impl From<&Resource> for ResourceRef {
    fn from(resource: &Resource) -> Self {
        Self::Descriptor(resource.clone())
    }
}

impl McpClient {
    /// List all resources, following pagination. Replaces the cached list.
    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        let resources = self
            .list_all::<ListResourcesResult>(methods::RESOURCES_LIST)
            .await?;
        self.cache.write().resources = Some(resources.clone());
        Ok(resources)
    }

    /// Resources from the last [`list_resources`](Self::list_resources) call.
    pub fn cached_resources(&self) -> Option<Vec<Resource>> {
        self.cache.read().resources.clone()
    }

    /// List all resource templates, following pagination. Replaces the cached list.
    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>> {
        let templates = self
            .list_all::<ListResourceTemplatesResult>(methods::RESOURCES_TEMPLATES_LIST)
            .await?;
        self.cache.write().resource_templates = Some(templates.clone());
        Ok(templates)
    }

    /// Templates from the last [`list_resource_templates`](Self::list_resource_templates)
    /// call.
    pub fn cached_resource_templates(&self) -> Option<Vec<ResourceTemplate>> {
        self.cache.read().resource_templates.clone()
    }

    /// Read a resource by URI or descriptor.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use streamcp_client::{ClientConfig, McpClient};
    /// # async fn example() -> streamcp_client::Result<()> {
    /// # let client = McpClient::new(ClientConfig::new("http://localhost:3001"))?;
    /// # client.initialize().await?;
    /// let by_uri = client.read_resource("test://static/resource/1").await?;
    ///
    /// let listed = client.list_resources().await?;
    /// if let Some(first) = listed.first() {
    ///     let contents = client.read_resource(first).await?;
    ///     println!("{} item(s)", contents.contents.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// - [`McpClientError::InvalidArgument`] for an empty URI
    /// - [`McpClientError::MalformedResponse`] if the server returns no contents
    pub async fn read_resource(&self, target: impl Into<ResourceRef>) -> Result<ReadResourceResult> {
        self.active_session(methods::RESOURCES_READ)?;
        let target = target.into();
        if target.uri().trim().is_empty() {
            return Err(McpClientError::InvalidArgument(
                "resource URI must not be empty".to_string(),
            ));
        }

        let params = ReadResourceParams {
            uri: target.uri().to_string(),
        };
        let result: ReadResourceResult = self.request(methods::RESOURCES_READ, Some(params)).await?;
        if result.contents.is_empty() {
            return Err(McpClientError::MalformedResponse(format!(
                "resource {} returned no contents",
                target.uri()
            )));
        }
        Ok(result)
    }

    /// Read static resource `id` using the profile's URI template.
    ///
    /// # Errors
    ///
    /// [`McpClientError::InvalidArgument`] if `id` is outside the profile's range; no
    /// request is sent in that case.
    pub async fn read_static_resource(&self, id: i64) -> Result<ReadResourceResult> {
        self.active_session(methods::RESOURCES_READ)?;
        let profile = &self.config().profile;
        let id = resource_id(profile, id)?;
        self.read_resource(profile.static_resource_uri(id)).await
    }

    /// Render the profile's resource prompt for resource `id`.
    ///
    /// # Errors
    ///
    /// [`McpClientError::InvalidArgument`] if `id` is outside the profile's range; no
    /// request is sent in that case.
    pub async fn get_resource_prompt(&self, id: i64) -> Result<GetPromptResult> {
        self.active_session(methods::PROMPTS_GET)?;
        let profile = &self.config().profile;
        let id = resource_id(profile, id)?;

        let arguments = HashMap::from([(profile.resource_prompt_argument.clone(), id.to_string())]);
        self.get_prompt(&profile.resource_prompt, arguments).await
    }
}
