//! JSON-RPC 2.0 envelope and MCP model types
//!
//! Wire structs follow the MCP schema naming (camelCase fields, `inputSchema`
//! for tool parameter schemas). Only the server-side subset needed by the
//! bridge is modeled here.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::BridgeError;

/// MCP protocol revision implemented by this server
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// A uniquely identifying ID for a request in JSON-RPC
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// An inbound JSON-RPC request or notification
///
/// Requests carry an `id` and expect exactly one response; notifications
/// omit the `id` and never receive one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<JsonValue>,
}

impl JsonRpcRequest {
    /// Whether this message is a notification (no response expected)
    #[inline]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error object carried in a JSON-RPC error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

/// An outbound JSON-RPC response, success or error
///
/// Invariant: `result` and `error` are mutually exclusive, and the `id`
/// always echoes the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    /// Build a success response echoing the request id
    pub fn success(id: RequestId, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response from a bridge error, echoing the request id
    pub fn failure(id: RequestId, err: &BridgeError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcErrorObject {
                code: err.json_rpc_code(),
                message: err.to_string(),
                data: None,
            }),
        }
    }
}

/// Outcome of parsing one framed unit from the transport
#[derive(Debug)]
pub enum ParsedMessage {
    /// A well-formed request or notification
    Request(JsonRpcRequest),
    /// Invalid envelope, but the unit carried a correlatable id
    Invalid { id: RequestId, reason: String },
    /// Nothing salvageable; the unit is logged and dropped
    Unreadable(String),
}

/// Parse one framed line into a JSON-RPC message
///
/// Salvage policy: if the line is not JSON at all the unit is unreadable; if
/// it is JSON but not a valid request envelope, we try to recover an `id` so
/// the peer still gets an error response tied to its request.
pub fn parse_message(line: &str) -> ParsedMessage {
    let value: JsonValue = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return ParsedMessage::Unreadable(e.to_string()),
    };

    match serde_json::from_value::<JsonRpcRequest>(value.clone()) {
        Ok(req) if req.jsonrpc == "2.0" => ParsedMessage::Request(req),
        Ok(req) => match req.id {
            Some(id) => ParsedMessage::Invalid {
                id,
                reason: format!("unsupported jsonrpc version '{}'", req.jsonrpc),
            },
            None => ParsedMessage::Unreadable("unsupported jsonrpc version".to_string()),
        },
        Err(e) => {
            let recovered = value
                .get("id")
                .cloned()
                .and_then(|id| serde_json::from_value::<RequestId>(id).ok());
            match recovered {
                Some(id) => ParsedMessage::Invalid {
                    id,
                    reason: e.to_string(),
                },
                None => ParsedMessage::Unreadable(e.to_string()),
            }
        }
    }
}

// === MCP model types ===

/// Name and version identifying one side of the handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// Capabilities advertised by the server during `initialize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<JsonValue>,
}

/// Result of the `initialize` handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
}

/// Tool metadata as listed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

/// One content item in a tool or prompt result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    /// Shorthand for a text content item
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Result payload for `tools/call`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<Content>,
    pub is_error: bool,
}

/// Resource metadata as listed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// One content block returned by `resources/read`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

/// Result payload for `resources/read`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

/// Argument metadata advertised for a prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgumentInfo {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// Prompt metadata as listed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptInfo {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgumentInfo>,
}

/// One message in an assembled prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: Content,
}

/// Result payload for `prompts/get`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}
