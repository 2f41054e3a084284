//! # Helpdesk MCP
//!
//! Model Context Protocol server layer for the helpdesk bridge: JSON-RPC 2.0
//! framing over a byte-stream pair, method dispatch, and the three MCP
//! primitive registries (tools, resources, prompts).
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::{Map, Value};
//! use helpdesk_mcp::{
//!     BridgeError, McpServer, ParameterType, Registry, ToolDescriptor, ToolHandler,
//! };
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ToolHandler for Echo {
//!     async fn call(&self, args: Map<String, Value>) -> Result<Value, BridgeError> {
//!         Ok(args.get("message").cloned().unwrap_or(Value::Null))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BridgeError> {
//!     let mut tools = Registry::new();
//!     tools.register(
//!         ToolDescriptor::builder("echo")
//!             .description("Echo a message back")
//!             .required_param("message", ParameterType::String, "Message to echo")
//!             .handler(Arc::new(Echo)),
//!     )?;
//!
//!     McpServer::builder()
//!         .server_info("echo-server", "1.0.0")
//!         .tools(tools)
//!         .build()
//!         .serve(tokio::io::stdin(), tokio::io::stdout())
//!         .await
//! }
//! ```

pub mod dispatcher;
pub mod error;
pub mod prompt;
pub mod protocol;
pub mod registry;
pub mod resource;
pub mod server;
pub mod tool;
pub mod transport;

// Re-export main types for convenience
pub use dispatcher::Dispatcher;
pub use error::{BridgeError, Result};
pub use prompt::{PromptBuilder, PromptDescriptor, PromptHandler};
pub use protocol::{
    Implementation, JsonRpcRequest, JsonRpcResponse, RequestId, PROTOCOL_VERSION,
};
pub use registry::{Keyed, Registry};
pub use resource::{ResourceDescriptor, ResourceHandler};
pub use server::{McpServer, McpServerBuilder};
pub use tool::{ParameterType, ToolBuilder, ToolDescriptor, ToolHandler};
