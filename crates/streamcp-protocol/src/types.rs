//! MCP payload types used by the client core.
//!
//! Field names follow the wire format (camelCase); unknown fields are ignored so that
//! newer servers remain readable.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::{Content, ResourceContents, Role};
use crate::jsonrpc::RequestId;

// =============================================================================
// Handshake
// =============================================================================

/// Name and version of a client or server implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Implementation name
    pub name: String,
    /// Implementation version
    pub version: String,
    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Implementation {
    /// Create an implementation identity.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: None,
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Capabilities the client advertises during initialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Roots support
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,
    /// Sampling support
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Map<String, Value>>,
    /// Elicitation support
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elicitation: Option<Map<String, Value>>,
    /// Experimental capabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Map<String, Value>>,
}

/// Roots capability flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootsCapability {
    /// Whether the client emits `notifications/roots/list_changed`
    #[serde(rename = "listChanged", default)]
    pub list_changed: bool,
}

/// Capabilities the server advertises in its initialize result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool support
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChangedCapability>,
    /// Resource support
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    /// Prompt support
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListChangedCapability>,
    /// Server-to-client logging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<Map<String, Value>>,
    /// Argument completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completions: Option<Map<String, Value>>,
    /// Experimental capabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Map<String, Value>>,
}

impl ServerCapabilities {
    /// Flatten the advertised capabilities into feature flags.
    pub fn features(&self) -> BTreeSet<ServerFeature> {
        let mut out = BTreeSet::new();
        if self.tools.is_some() {
            out.insert(ServerFeature::Tools);
        }
        if let Some(resources) = &self.resources {
            out.insert(ServerFeature::Resources);
            if resources.subscribe {
                out.insert(ServerFeature::Subscriptions);
            }
        }
        if self.prompts.is_some() {
            out.insert(ServerFeature::Prompts);
        }
        if self.logging.is_some() {
            out.insert(ServerFeature::Logging);
        }
        if self.completions.is_some() {
            out.insert(ServerFeature::Completions);
        }
        out
    }
}

/// `{ "listChanged": bool }` capability shape shared by tools and prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChangedCapability {
    /// Whether the server emits list-changed notifications
    #[serde(rename = "listChanged", default)]
    pub list_changed: bool,
}

/// Resource capability flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesCapability {
    /// Whether per-resource subscriptions are supported
    #[serde(default)]
    pub subscribe: bool,
    /// Whether the server emits list-changed notifications
    #[serde(rename = "listChanged", default)]
    pub list_changed: bool,
}

/// Server feature flag derived from [`ServerCapabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServerFeature {
    /// `tools/*`
    Tools,
    /// `resources/*`
    Resources,
    /// `prompts/*`
    Prompts,
    /// `logging/setLevel` and `notifications/message`
    Logging,
    /// `completion/complete`
    Completions,
    /// `resources/subscribe`
    Subscriptions,
}

/// Parameters of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeParams {
    /// Requested protocol revision
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Client capabilities
    pub capabilities: ClientCapabilities,
    /// Client identity
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

/// Result of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Negotiated protocol revision
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    /// Server identity
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
    /// Usage hints for the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Parameters shared by every `*/list` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedParams {
    /// Opaque cursor from the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// A list result page that may continue.
pub trait Paginated {
    /// Item type of the page.
    type Item;

    /// Cursor for the next page, if any.
    fn next_cursor(&self) -> Option<&str>;

    /// Consume the page into its items.
    fn into_items(self) -> Vec<Self::Item>;
}

macro_rules! paginated_result {
    ($(#[$doc:meta])* $name:ident, $field:ident, $json:literal, $item:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[doc = concat!("Items on this page (`", $json, "`)")]
            #[serde(rename = $json, default)]
            pub $field: Vec<$item>,
            /// Cursor for the next page
            #[serde(rename = "nextCursor", default, skip_serializing_if = "Option::is_none")]
            pub next_cursor: Option<String>,
        }

        impl Paginated for $name {
            type Item = $item;

            fn next_cursor(&self) -> Option<&str> {
                self.next_cursor.as_deref().filter(|c| !c.is_empty())
            }

            fn into_items(self) -> Vec<$item> {
                self.$field
            }
        }
    };
}

// =============================================================================
// Tools
// =============================================================================

/// Tool descriptor as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name
    pub name: String,
    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
    /// JSON schema of `structuredContent`
    #[serde(rename = "outputSchema", default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    /// Behavioural hints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Value>,
}

paginated_result!(
    /// Result of `tools/list`.
    ListToolsResult,
    tools,
    "tools",
    Tool
);

/// Progress token attached to a request.
pub type ProgressToken = String;

/// `_meta` block of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Token the server echoes in `notifications/progress`
    #[serde(rename = "progressToken", default, skip_serializing_if = "Option::is_none")]
    pub progress_token: Option<ProgressToken>,
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Tool name
    pub name: String,
    /// Tool arguments
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Request metadata
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RequestMeta>,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Content items
    #[serde(default)]
    pub content: Vec<Content>,
    /// Whether the tool itself failed
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    /// Structured output conforming to the tool's output schema
    #[serde(rename = "structuredContent", default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl CallToolResult {
    /// Whether the server flagged this result as a tool failure.
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first text item.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(Content::as_text)
    }

    /// All text items joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Resource descriptor as advertised by `resources/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource URI
    pub uri: String,
    /// Resource name
    pub name: String,
    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

paginated_result!(
    /// Result of `resources/list`.
    ListResourcesResult,
    resources,
    "resources",
    Resource
);

/// Parameterised resource descriptor from `resources/templates/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    /// RFC 6570 URI template
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    /// Template name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

paginated_result!(
    /// Result of `resources/templates/list`.
    ListResourceTemplatesResult,
    resource_templates,
    "resourceTemplates",
    ResourceTemplate
);

/// Parameters of `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResourceParams {
    /// URI to read
    pub uri: String,
}

/// Result of `resources/read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    /// Contents, usually a single element
    #[serde(default)]
    pub contents: Vec<ResourceContents>,
}

// =============================================================================
// Prompts
// =============================================================================

/// Prompt descriptor as advertised by `prompts/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Prompt name
    pub name: String,
    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

/// Declared prompt argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied
    #[serde(default)]
    pub required: bool,
}

paginated_result!(
    /// Result of `prompts/list`.
    ListPromptsResult,
    prompts,
    "prompts",
    Prompt
);

/// Parameters of `prompts/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPromptParams {
    /// Prompt name
    pub name: String,
    /// Argument values (always strings on the wire)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub arguments: HashMap<String, String>,
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPromptResult {
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rendered messages
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
}

/// One rendered prompt message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Author role
    pub role: Role,
    /// Message content
    pub content: Content,
}

// =============================================================================
// Utilities
// =============================================================================

/// Server log verbosity for `logging/setLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    /// debug
    Debug,
    /// info
    Info,
    /// notice
    Notice,
    /// warning
    Warning,
    /// error
    Error,
    /// critical
    Critical,
    /// alert
    Alert,
    /// emergency
    Emergency,
}

/// Parameters of `logging/setLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetLevelParams {
    /// Minimum level the server should emit
    pub level: LoggingLevel,
}

/// Parameters of `notifications/cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledParams {
    /// Id of the request to cancel
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    /// Why the request is being cancelled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Parameters of `notifications/progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressParams {
    /// Token from the originating request's `_meta`
    #[serde(rename = "progressToken")]
    pub progress_token: Value,
    /// Progress so far
    pub progress: f64,
    /// Total, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// Human-readable status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Parameters of `notifications/message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingMessageParams {
    /// Severity
    pub level: LoggingLevel,
    /// Logger name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    /// Arbitrary payload
    pub data: Value,
}

/// Empty result of `ping` and `logging/setLevel`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyResult {
    /// Optional metadata
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Server-initiated message seen on the notification stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerNotification {
    /// `notifications/progress`
    Progress(ProgressParams),
    /// `notifications/message`
    LogMessage(LoggingMessageParams),
    /// `notifications/cancelled`
    Cancelled(CancelledParams),
    /// Any other notification, kept raw
    Other {
        /// Method name
        method: String,
        /// Raw parameters
        params: Option<Value>,
    },
}

impl ServerNotification {
    /// Decode a JSON-RPC notification document.
    ///
    /// Returns `None` when the document is not a notification (it has an `id`, or no
    /// `method`), or when a known notification carries malformed parameters.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("id").is_some() {
            return None;
        }
        let method = value.get("method")?.as_str()?;
        let params = value.get("params").cloned();
        let decoded = match method {
            crate::methods::NOTIFICATION_PROGRESS => {
                Self::Progress(serde_json::from_value(params?).ok()?)
            }
            crate::methods::NOTIFICATION_MESSAGE => {
                Self::LogMessage(serde_json::from_value(params?).ok()?)
            }
            crate::methods::NOTIFICATION_CANCELLED => {
                Self::Cancelled(serde_json::from_value(params?).ok()?)
            }
            other => Self::Other {
                method: other.to_string(),
                params,
            },
        };
        Some(decoded)
    }
}
