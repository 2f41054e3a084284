//! Method dispatch across the three registries
//!
//! Maps an incoming method name to exactly one handler and wraps the outcome
//! into the MCP result shape. Handler invocations run under the configured
//! per-invocation timeout.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::prompt::PromptDescriptor;
use crate::protocol::{
    CallToolResult, Content, Implementation, InitializeResult, ServerCapabilities,
    PROTOCOL_VERSION,
};
use crate::registry::Registry;
use crate::resource::ResourceDescriptor;
use crate::tool::ToolDescriptor;

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: HashMap<String, String>,
}

/// Routes requests to registry handlers and built-in discovery methods
pub struct Dispatcher {
    server_info: Implementation,
    tools: Registry<ToolDescriptor>,
    resources: Registry<ResourceDescriptor>,
    prompts: Registry<PromptDescriptor>,
    handler_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher over fully populated registries
    pub fn new(
        server_info: Implementation,
        tools: Registry<ToolDescriptor>,
        resources: Registry<ResourceDescriptor>,
        prompts: Registry<PromptDescriptor>,
        handler_timeout: Duration,
    ) -> Self {
        Self {
            server_info,
            tools,
            resources,
            prompts,
            handler_timeout,
        }
    }

    /// Dispatch one method call
    ///
    /// Returns `Ok(Some(result))` for requests, `Ok(None)` for absorbed
    /// notifications, and an error for every fault the client should see.
    pub async fn dispatch(&self, method: &str, params: Option<JsonValue>) -> Result<Option<JsonValue>> {
        debug!(method, "dispatching");
        match method {
            "initialize" => Ok(Some(serde_json::to_value(self.initialize_result())
                .map_err(|e| BridgeError::internal(e.to_string()))?)),
            "ping" => Ok(Some(json!({}))),
            "notifications/initialized" => Ok(None),
            "tools/list" => {
                let tools: Vec<_> = self.tools.iter().map(ToolDescriptor::info).collect();
                Ok(Some(json!({ "tools": tools })))
            }
            "tools/call" => {
                let params: CallToolParams = decode_params(params)?;
                self.call_tool(params).await.map(Some)
            }
            "resources/list" => {
                let resources: Vec<_> =
                    self.resources.iter().map(ResourceDescriptor::info).collect();
                Ok(Some(json!({ "resources": resources })))
            }
            "resources/read" => {
                let params: ReadResourceParams = decode_params(params)?;
                self.read_resource(params).await.map(Some)
            }
            "prompts/list" => {
                let prompts: Vec<_> = self.prompts.iter().map(PromptDescriptor::info).collect();
                Ok(Some(json!({ "prompts": prompts })))
            }
            "prompts/get" => {
                let params: GetPromptParams = decode_params(params)?;
                self.get_prompt(params).await.map(Some)
            }
            other => Err(BridgeError::method_not_found(other)),
        }
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(json!({})),
                resources: Some(json!({})),
                prompts: Some(json!({})),
            },
            server_info: self.server_info.clone(),
        }
    }

    /// Validating -> Invoking -> Completed|Failed
    async fn call_tool(&self, params: CallToolParams) -> Result<JsonValue> {
        let tool = self
            .tools
            .get(&params.name)
            .ok_or_else(|| BridgeError::method_not_found(&params.name))?;
        let payload = self.bounded(tool.invoke(params.arguments)).await?;
        let text = match payload {
            JsonValue::String(s) => s,
            other => other.to_string(),
        };
        let result = CallToolResult {
            content: vec![Content::text(text)],
            is_error: false,
        };
        serde_json::to_value(result).map_err(|e| BridgeError::internal(e.to_string()))
    }

    async fn read_resource(&self, params: ReadResourceParams) -> Result<JsonValue> {
        let resource = self
            .resources
            .get(&params.uri)
            .ok_or_else(|| BridgeError::not_found(&params.uri))?;
        let result = self.bounded(resource.read()).await?;
        serde_json::to_value(result).map_err(|e| BridgeError::internal(e.to_string()))
    }

    async fn get_prompt(&self, params: GetPromptParams) -> Result<JsonValue> {
        let prompt = self
            .prompts
            .get(&params.name)
            .ok_or_else(|| BridgeError::method_not_found(&params.name))?;
        let result = self.bounded(prompt.get(params.arguments)).await?;
        serde_json::to_value(result).map_err(|e| BridgeError::internal(e.to_string()))
    }

    /// Apply the per-invocation timeout to a handler future
    async fn bounded<T>(&self, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.handler_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout(self.handler_timeout.as_secs())),
        }
    }
}

fn decode_params<T: for<'de> Deserialize<'de>>(params: Option<JsonValue>) -> Result<T> {
    let value = params.unwrap_or(JsonValue::Null);
    serde_json::from_value(value).map_err(|e| BridgeError::invalid_params(e.to_string()))
}
