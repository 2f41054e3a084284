//! Error types for the bridge protocol layer

use thiserror::Error;

/// Main error type for bridge operations
///
/// Every variant except [`BridgeError::MalformedMessage`] can be surfaced to
/// the client as a JSON-RPC error response; malformed units without a
/// recoverable id are logged and dropped at the transport boundary instead.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The inbound unit could not be parsed as a JSON-RPC message
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The requested method is not registered with the dispatcher
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Request parameters failed schema validation
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// A handler exceeded its per-invocation time budget
    #[error("handler timed out after {0} seconds")]
    Timeout(u64),

    /// The requested resource URI is not registered
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The downstream API could not be reached or returned a server error
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The downstream API rejected the request (client-side failure)
    #[error("upstream rejected request: {0}")]
    UpstreamRejected(String),

    /// The downstream API answered with a body we could not parse
    #[error("upstream returned malformed response: {0}")]
    UpstreamMalformedResponse(String),

    /// Internal fault; the cause is logged, never leaked as a crash
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Create a MalformedMessage error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMessage(msg.into())
    }

    /// Create a MethodNotFound error
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound(method.into())
    }

    /// Create an InvalidParams error
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Create a NotFound error
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::NotFound(uri.into())
    }

    /// Create an UpstreamUnavailable error
    pub fn upstream_unavailable(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create an UpstreamRejected error
    pub fn upstream_rejected(msg: impl Into<String>) -> Self {
        Self::UpstreamRejected(msg.into())
    }

    /// Create an UpstreamMalformedResponse error
    pub fn upstream_malformed(msg: impl Into<String>) -> Self {
        Self::UpstreamMalformedResponse(msg.into())
    }

    /// Create an Internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// JSON-RPC error code for this error kind
    ///
    /// Standard codes come from the JSON-RPC 2.0 spec; `-32002` follows the
    /// MCP convention for resource-not-found; the remaining codes sit in the
    /// implementation-defined server range.
    pub fn json_rpc_code(&self) -> i64 {
        match self {
            Self::MalformedMessage(_) => -32700,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Internal(_) => -32603,
            Self::Timeout(_) => -32001,
            Self::NotFound(_) => -32002,
            Self::UpstreamUnavailable(_) => -32010,
            Self::UpstreamRejected(_) => -32011,
            Self::UpstreamMalformedResponse(_) => -32012,
        }
    }
}
