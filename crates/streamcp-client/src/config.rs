//! Client configuration.
//!
//! [`ClientConfig`] is a plain struct handed to [`McpClient::new`](crate::McpClient::new),
//! which validates it once. It can also be loaded from a TOML, YAML or JSON file, with
//! `STREAMCP_`-prefixed environment variables overriding file values:
//!
//! ```toml
//! base_url = "http://localhost:3001"
//! endpoint_path = "/mcp"
//! request_timeout_ms = 10000
//!
//! [profile]
//! max_resource_id = 100
//! ```
//!
//! `STREAMCP_REQUEST_TIMEOUT_MS=5000` overrides the timeout and
//! `STREAMCP_PROFILE__MAX_RESOURCE_ID=50` the nested profile value.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use streamcp_http::HttpTransportConfig;
use streamcp_protocol::{ClientCapabilities, Implementation, PROTOCOL_VERSION_LATEST};
use url::Url;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "STREAMCP";

/// Upper bound on pages fetched by one list operation.
pub const DEFAULT_PAGE_LIMIT: usize = 64;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] config::ConfigError),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Conventions of the server under test that the protocol does not define.
///
/// The defaults describe the MCP reference "everything" server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerProfile {
    /// Smallest valid resource id
    pub min_resource_id: u32,
    /// Largest valid resource id
    pub max_resource_id: u32,
    /// Prompt that embeds a resource
    pub resource_prompt: String,
    /// Name of that prompt's resource id argument
    pub resource_prompt_argument: String,
    /// URI of a static resource, with `{id}` as placeholder
    pub static_resource_uri_template: String,
}

impl Default for ServerProfile {
    fn default() -> Self {
        Self {
            min_resource_id: 1,
            max_resource_id: 100,
            resource_prompt: "resource_prompt".to_string(),
            resource_prompt_argument: "resourceId".to_string(),
            static_resource_uri_template: "test://static/resource/{id}".to_string(),
        }
    }
}

impl ServerProfile {
    /// Valid resource ids.
    pub fn resource_ids(&self) -> RangeInclusive<u32> {
        self.min_resource_id..=self.max_resource_id
    }

    /// URI of static resource `id`.
    pub fn static_resource_uri(&self, id: u32) -> String {
        self.static_resource_uri_template
            .replace("{id}", &id.to_string())
    }
}

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g. `http://localhost:3001`)
    pub base_url: String,
    /// Path of the MCP endpoint under `base_url`
    pub endpoint_path: String,
    /// Bound on each request/response exchange
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Protocol revision requested during initialize
    pub protocol_version: String,
    /// Identity sent as `clientInfo`
    pub client_info: Implementation,
    /// Capabilities advertised during initialize
    pub capabilities: ClientCapabilities,
    /// Bearer token
    pub auth_token: Option<String>,
    /// Extra headers sent on every request
    pub headers: HashMap<String, String>,
    /// User agent (`None` disables the header)
    pub user_agent: Option<String>,
    /// Maximum pages followed by list operations
    pub page_limit: usize,
    /// Server-specific conventions
    pub profile: ServerProfile,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint_path: "/mcp".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            protocol_version: PROTOCOL_VERSION_LATEST.to_string(),
            client_info: Implementation::new("streamcp", env!("CARGO_PKG_VERSION")),
            capabilities: ClientCapabilities::default(),
            auth_token: None,
            headers: HashMap::new(),
            user_agent: Some(format!("streamcp/{}", env!("CARGO_PKG_VERSION"))),
            page_limit: DEFAULT_PAGE_LIMIT,
            profile: ServerProfile::default(),
        }
    }

    /// Full endpoint URL: `base_url` joined with `endpoint_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the result is not an http(s) URL.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            self.endpoint_path.trim().trim_start_matches('/')
        );
        let url = Url::parse(&joined)
            .map_err(|e| ConfigError::Invalid(format!("base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url is required".into()));
        }
        if self.endpoint_path.trim().trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid("endpoint_path must not be empty".into()));
        }
        self.endpoint_url()?;
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout must be positive".into()));
        }
        if self.client_info.name.trim().is_empty() {
            return Err(ConfigError::Invalid("client name must not be blank".into()));
        }
        if self.page_limit == 0 {
            return Err(ConfigError::Invalid("page_limit must be positive".into()));
        }
        if self.profile.resource_ids().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "resource id range {}..={} is empty",
                self.profile.min_resource_id, self.profile.max_resource_id
            )));
        }
        Ok(())
    }

    /// Derive the transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the endpoint URL is invalid.
    pub fn transport_config(&self) -> Result<HttpTransportConfig, ConfigError> {
        let mut transport = HttpTransportConfig::new(self.endpoint_url()?);
        transport.request_timeout = self.request_timeout;
        transport.connect_timeout = self.connect_timeout;
        transport.auth_token.clone_from(&self.auth_token);
        transport.headers.clone_from(&self.headers);
        transport.user_agent.clone_from(&self.user_agent);
        Ok(transport)
    }

    /// Load configuration from a file (TOML, YAML, or JSON).
    ///
    /// The format is picked from the file extension. Environment variables with the
    /// `STREAMCP_` prefix override file settings; nested keys use `__`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, has an unsupported extension, or
    /// contains invalid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        use config::{Config, File, FileFormat};

        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };

        let settings = Config::builder()
            .add_source(File::new(
                path.to_str().ok_or(ConfigError::UnsupportedFormat)?,
                format,
            ))
            .add_source(environment())
            .build()?;

        settings.try_deserialize::<ConfigFile>()?.into_config()
    }

    /// Load configuration from `STREAMCP_*` environment variables only.
    ///
    /// # Errors
    ///
    /// Returns an error if `STREAMCP_BASE_URL` is missing or a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder().add_source(environment()).build()?;
        settings.try_deserialize::<ConfigFile>()?.into_config()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("endpoint_path", &self.endpoint_path)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("protocol_version", &self.protocol_version)
            .field("client_info", &self.client_info)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("page_limit", &self.page_limit)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// On-disk shape of [`ClientConfig`]. Durations are whole milliseconds.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    base_url: Option<String>,
    endpoint_path: Option<String>,
    request_timeout_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    protocol_version: Option<String>,
    client_name: Option<String>,
    client_version: Option<String>,
    auth_token: Option<String>,
    headers: HashMap<String, String>,
    user_agent: Option<String>,
    page_limit: Option<usize>,
    profile: ServerProfile,
}

impl ConfigFile {
    fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ConfigError::Invalid("base_url is required".into()))?;

        let mut config = ClientConfig::new(base_url);
        if let Some(path) = self.endpoint_path {
            config.endpoint_path = path;
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(version) = self.protocol_version {
            config.protocol_version = version;
        }
        if let Some(name) = self.client_name {
            config.client_info.name = name;
        }
        if let Some(version) = self.client_version {
            config.client_info.version = version;
        }
        if let Some(limit) = self.page_limit {
            config.page_limit = limit;
        }
        if self.user_agent.is_some() {
            config.user_agent = self.user_agent;
        }
        config.auth_token = self.auth_token;
        config.headers = self.headers;
        config.profile = self.profile;

        config.validate()?;
        Ok(config)
    }
}
