//! Prompt handlers aggregating downstream data into text blocks

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_mcp::{BridgeError, PromptDescriptor, PromptHandler, Result};
use tracing::warn;

use crate::client::TicketBackend;

const CONTEXT_LIMIT: usize = 5;

/// Assembles a triage briefing for one ticket
///
/// Fetches the ticket and recent context in parallel. Partial-failure
/// policy: the ticket itself failing fails the prompt; missing context is
/// replaced with a placeholder noting the omission.
pub struct TriageTicketPrompt {
    backend: Arc<dyn TicketBackend>,
}

impl TriageTicketPrompt {
    /// Build the registered descriptor for this prompt
    pub fn descriptor(backend: Arc<dyn TicketBackend>) -> PromptDescriptor {
        PromptDescriptor::builder("triage_ticket")
            .description("Summarize a ticket and suggest a triage decision")
            .arg("ticket_id", "Numeric id of the ticket to triage", true)
            .handler(Arc::new(Self { backend }))
    }
}

#[async_trait]
impl PromptHandler for TriageTicketPrompt {
    async fn assemble(&self, arguments: HashMap<String, String>) -> Result<String> {
        let raw_id = arguments
            .get("ticket_id")
            .ok_or_else(|| BridgeError::invalid_params("missing required argument: ticket_id"))?;
        let id: u64 = raw_id
            .parse()
            .map_err(|_| BridgeError::invalid_params(format!("ticket_id must be numeric, got '{raw_id}'")))?;

        let (ticket, recent) = tokio::join!(
            self.backend.get_ticket(id),
            self.backend.recent_tickets(CONTEXT_LIMIT),
        );
        let ticket = ticket?;

        let context = match recent {
            Ok(tickets) if tickets.is_empty() => "(no other recent tickets)".to_string(),
            Ok(tickets) => tickets
                .iter()
                .filter(|t| t.id != ticket.id)
                .map(|t| format!("- #{} [{}/{}] {}", t.id, t.status, t.priority, t.title))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                warn!("recent ticket context unavailable: {e}");
                "(recent ticket context unavailable)".to_string()
            }
        };

        Ok(format!(
            "Please triage the following support ticket.\n\n\
             Ticket #{id}: {title}\n\
             Status: {status}  Priority: {priority}  Created: {created}\n\n\
             {description}\n\n\
             Other recent tickets:\n{context}\n\n\
             Suggest a priority, an owner team, and the next action.",
            id = ticket.id,
            title = ticket.title,
            status = ticket.status,
            priority = ticket.priority,
            created = ticket.created_at,
            description = ticket.description,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{NewTicket, Ticket, TicketStats};

    struct FakeBackend {
        context_fails: bool,
    }

    fn ticket(id: u64, title: &str) -> Ticket {
        Ticket {
            id,
            title: title.to_string(),
            description: "something broke".to_string(),
            status: "open".to_string(),
            priority: "normal".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[async_trait]
    impl TicketBackend for FakeBackend {
        async fn create_ticket(&self, _ticket: NewTicket) -> Result<Ticket> {
            unimplemented!()
        }

        async fn get_ticket(&self, id: u64) -> Result<Ticket> {
            if id == 404 {
                return Err(BridgeError::upstream_rejected("HTTP 404 Not Found"));
            }
            Ok(ticket(id, "VPN keeps dropping"))
        }

        async fn recent_tickets(&self, _limit: usize) -> Result<Vec<Ticket>> {
            if self.context_fails {
                return Err(BridgeError::upstream_unavailable("HTTP 503"));
            }
            Ok(vec![ticket(7, "Wifi flaky"), ticket(8, "VPN slow")])
        }

        async fn search_tickets(&self, _query: &str, _limit: usize) -> Result<Vec<Ticket>> {
            unimplemented!()
        }

        async fn ticket_stats(&self) -> Result<TicketStats> {
            unimplemented!()
        }
    }

    async fn assemble(backend: FakeBackend, id: &str) -> Result<String> {
        let prompt = TriageTicketPrompt {
            backend: Arc::new(backend),
        };
        let mut args = HashMap::new();
        args.insert("ticket_id".to_string(), id.to_string());
        prompt.assemble(args).await
    }

    #[tokio::test]
    async fn test_assembles_ticket_and_context() {
        let text = assemble(FakeBackend { context_fails: false }, "12")
            .await
            .unwrap();
        assert!(text.contains("Ticket #12: VPN keeps dropping"));
        assert!(text.contains("- #7 [open/normal] Wifi flaky"));
    }

    #[tokio::test]
    async fn test_degrades_gracefully_when_context_fails() {
        let text = assemble(FakeBackend { context_fails: true }, "12")
            .await
            .unwrap();
        assert!(text.contains("Ticket #12"));
        assert!(text.contains("(recent ticket context unavailable)"));
    }

    #[tokio::test]
    async fn test_fails_when_primary_ticket_fails() {
        let err = assemble(FakeBackend { context_fails: false }, "404")
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::UpstreamRejected(_)));
    }

    #[tokio::test]
    async fn test_rejects_non_numeric_id() {
        let err = assemble(FakeBackend { context_fails: false }, "twelve")
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidParams(_)));
    }
}
