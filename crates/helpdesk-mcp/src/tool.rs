//! Tool descriptors, parameter schemas, and argument validation

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{BridgeError, Result};
use crate::protocol::ToolInfo;
use crate::registry::Keyed;

/// JSON type expected for a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParameterType {
    /// JSON schema type name
    pub fn schema_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn matches(self, value: &JsonValue) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// One named, typed parameter of a tool
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub param_type: ParameterType,
    pub required: bool,
}

/// Handler invoked when the client calls a tool
///
/// Implementations may perform downstream calls; the dispatcher applies the
/// per-invocation timeout around the whole call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with validated arguments
    async fn call(&self, arguments: Map<String, JsonValue>) -> Result<JsonValue>;
}

/// Registered metadata + handler for one tool
///
/// Immutable after registration; owned exclusively by the tool registry.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    /// Start building a tool descriptor
    pub fn builder(name: impl Into<String>) -> ToolBuilder {
        ToolBuilder::new(name)
    }

    /// Tool name (unique registry key)
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter specs in declaration order
    #[inline]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// MCP `inputSchema` for this tool
    pub fn input_schema(&self) -> JsonValue {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.param_type.schema_name(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(JsonValue::String(param.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Listing metadata for `tools/list`
    pub fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema(),
        }
    }

    /// Check call arguments against the parameter schema
    ///
    /// Missing required parameters and type mismatches fail with
    /// `InvalidParams`; unknown extra keys are accepted.
    pub fn validate_arguments(&self, arguments: &Map<String, JsonValue>) -> Result<()> {
        for param in &self.parameters {
            match arguments.get(&param.name) {
                None | Some(JsonValue::Null) => {
                    if param.required {
                        return Err(BridgeError::invalid_params(format!(
                            "missing required parameter: {}",
                            param.name
                        )));
                    }
                }
                Some(value) => {
                    if !param.param_type.matches(value) {
                        return Err(BridgeError::invalid_params(format!(
                            "parameter '{}' must be of type {}",
                            param.name,
                            param.param_type.schema_name()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate, then run the handler
    pub async fn invoke(&self, arguments: Map<String, JsonValue>) -> Result<JsonValue> {
        self.validate_arguments(&arguments)?;
        self.handler.call(arguments).await
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl Keyed for ToolDescriptor {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Fluent builder for tool descriptors
pub struct ToolBuilder {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
}

impl ToolBuilder {
    /// Create a new builder for the named tool
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
        }
    }

    /// Set the description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Add a required parameter
    pub fn required_param(
        mut self,
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            description: description.into(),
            param_type,
            required: true,
        });
        self
    }

    /// Add an optional parameter
    pub fn optional_param(
        mut self,
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            description: description.into(),
            param_type,
            required: false,
        });
        self
    }

    /// Attach the handler and finish the descriptor
    pub fn handler(self, handler: Arc<dyn ToolHandler>) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            handler,
        }
    }
}
