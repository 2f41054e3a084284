//! Resource handlers: read-only ticket snapshots

use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_mcp::{BridgeError, ResourceDescriptor, ResourceHandler, Result};

use crate::client::TicketBackend;

const RECENT_LIMIT: usize = 10;

/// Snapshot of the most recent tickets, one line per ticket
pub struct RecentTicketsResource {
    backend: Arc<dyn TicketBackend>,
}

impl RecentTicketsResource {
    /// Build the registered descriptor for this resource
    pub fn descriptor(backend: Arc<dyn TicketBackend>) -> ResourceDescriptor {
        ResourceDescriptor::new(
            "tickets://recent",
            "Recent tickets",
            "The most recently updated support tickets",
            Arc::new(Self { backend }),
        )
    }
}

#[async_trait]
impl ResourceHandler for RecentTicketsResource {
    async fn read(&self) -> Result<String> {
        let tickets = self.backend.recent_tickets(RECENT_LIMIT).await?;
        if tickets.is_empty() {
            return Ok("No recent tickets.".to_string());
        }
        let lines: Vec<String> = tickets
            .iter()
            .map(|t| {
                format!(
                    "#{} [{}/{}] {} ({})",
                    t.id, t.status, t.priority, t.title, t.created_at
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

/// Aggregate open/pending/closed counts as JSON
pub struct TicketStatsResource {
    backend: Arc<dyn TicketBackend>,
}

impl TicketStatsResource {
    /// Build the registered descriptor for this resource
    pub fn descriptor(backend: Arc<dyn TicketBackend>) -> ResourceDescriptor {
        ResourceDescriptor::new(
            "tickets://stats",
            "Ticket statistics",
            "Aggregate ticket counts by status",
            Arc::new(Self { backend }),
        )
        .with_mime_type("application/json")
    }
}

#[async_trait]
impl ResourceHandler for TicketStatsResource {
    async fn read(&self) -> Result<String> {
        let stats = self.backend.ticket_stats().await?;
        serde_json::to_string_pretty(&stats).map_err(|e| BridgeError::internal(e.to_string()))
    }
}
