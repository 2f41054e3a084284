//! # Helpdesk Bridge
//!
//! Exposes an existing helpdesk ticket REST API to MCP clients through the
//! three protocol primitives: tools (actions with side effects), resources
//! (read-only snapshots), and prompts (parameterized template generators).
//! The bridge itself is stateless; registries are assembled once at startup
//! and the downstream API owns all data.

pub mod client;
pub mod config;
pub mod prompts;
pub mod resources;
pub mod tools;

use std::sync::Arc;

use helpdesk_mcp::{PromptDescriptor, Registry, ResourceDescriptor, Result, ToolDescriptor};

use crate::prompts::TriageTicketPrompt;
use crate::resources::{RecentTicketsResource, TicketStatsResource};
use crate::tools::{CreateTicketTool, SearchTicketsTool};

pub use crate::client::{NewTicket, Ticket, TicketBackend, TicketClient, TicketStats};
pub use crate::config::{BridgeConfig, BridgeConfigBuilder, ConfigError};

/// Assemble the three registries over a ticket backend
///
/// Called once at startup, before the dispatch loop; registries are
/// immutable afterwards.
pub fn build_registries(
    backend: Arc<dyn TicketBackend>,
) -> Result<(
    Registry<ToolDescriptor>,
    Registry<ResourceDescriptor>,
    Registry<PromptDescriptor>,
)> {
    let mut tools = Registry::new();
    tools.register(CreateTicketTool::descriptor(Arc::clone(&backend)))?;
    tools.register(SearchTicketsTool::descriptor(Arc::clone(&backend)))?;

    let mut resources = Registry::new();
    resources.register(RecentTicketsResource::descriptor(Arc::clone(&backend)))?;
    resources.register(TicketStatsResource::descriptor(Arc::clone(&backend)))?;

    let mut prompts = Registry::new();
    prompts.register(TriageTicketPrompt::descriptor(backend))?;

    Ok((tools, resources, prompts))
}
