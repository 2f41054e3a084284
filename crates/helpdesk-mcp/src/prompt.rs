//! Prompt descriptors: parameterized template generators

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BridgeError, Result};
use crate::protocol::{Content, GetPromptResult, PromptArgumentInfo, PromptInfo, PromptMessage};
use crate::registry::Keyed;

/// One named argument of a prompt
#[derive(Debug, Clone)]
pub struct PromptArgumentSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// Handler assembling a natural-language text block from string arguments
///
/// Implementations typically aggregate several downstream reads; the
/// partial-failure policy is the handler's own and must stay consistent.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    /// Assemble the prompt text
    async fn assemble(&self, arguments: HashMap<String, String>) -> Result<String>;
}

/// Registered metadata + handler for one prompt
#[derive(Clone)]
pub struct PromptDescriptor {
    name: String,
    description: String,
    arguments: Vec<PromptArgumentSpec>,
    handler: Arc<dyn PromptHandler>,
}

impl PromptDescriptor {
    /// Start building a prompt descriptor
    pub fn builder(name: impl Into<String>) -> PromptBuilder {
        PromptBuilder::new(name)
    }

    /// Prompt name (unique registry key)
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Listing metadata for `prompts/list`
    pub fn info(&self) -> PromptInfo {
        PromptInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            arguments: self
                .arguments
                .iter()
                .map(|arg| PromptArgumentInfo {
                    name: arg.name.clone(),
                    description: arg.description.clone(),
                    required: arg.required,
                })
                .collect(),
        }
    }

    /// Check provided arguments, run the handler, and wrap the text block
    pub async fn get(&self, arguments: HashMap<String, String>) -> Result<GetPromptResult> {
        for arg in &self.arguments {
            if arg.required && !arguments.contains_key(&arg.name) {
                return Err(BridgeError::invalid_params(format!(
                    "missing required argument: {}",
                    arg.name
                )));
            }
        }
        let text = self.handler.assemble(arguments).await?;
        Ok(GetPromptResult {
            description: Some(self.description.clone()),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: Content::text(text),
            }],
        })
    }
}

impl std::fmt::Debug for PromptDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptDescriptor")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl Keyed for PromptDescriptor {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Fluent builder for prompt descriptors
pub struct PromptBuilder {
    name: String,
    description: String,
    arguments: Vec<PromptArgumentSpec>,
}

impl PromptBuilder {
    /// Create a new builder for the named prompt
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            arguments: Vec::new(),
        }
    }

    /// Set the description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Add an argument
    pub fn arg(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.arguments.push(PromptArgumentSpec {
            name: name.into(),
            description: description.into(),
            required,
        });
        self
    }

    /// Attach the handler and finish the descriptor
    pub fn handler(self, handler: Arc<dyn PromptHandler>) -> PromptDescriptor {
        PromptDescriptor {
            name: self.name,
            description: self.description,
            arguments: self.arguments,
            handler,
        }
    }
}
