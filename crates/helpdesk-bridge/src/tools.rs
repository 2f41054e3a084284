//! Tool handlers wrapping the ticket API

use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_mcp::{BridgeError, ParameterType, Result, ToolDescriptor, ToolHandler};
use serde_json::{json, Map, Value as JsonValue};
use tracing::info;

use crate::client::{NewTicket, TicketBackend};

const PRIORITIES: &[&str] = &["low", "normal", "high"];

fn require_str(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(JsonValue::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| BridgeError::invalid_params(format!("missing required parameter: {name}")))
}

/// Creates a support ticket downstream
pub struct CreateTicketTool {
    backend: Arc<dyn TicketBackend>,
}

impl CreateTicketTool {
    /// Build the registered descriptor for this tool
    pub fn descriptor(backend: Arc<dyn TicketBackend>) -> ToolDescriptor {
        ToolDescriptor::builder("create_support_ticket")
            .description("Create a new support ticket in the helpdesk system")
            .required_param("title", ParameterType::String, "Short summary of the issue")
            .required_param(
                "description",
                ParameterType::String,
                "Full description of the issue",
            )
            .optional_param(
                "priority",
                ParameterType::String,
                "Ticket priority: low, normal, or high (default normal)",
            )
            .handler(Arc::new(Self { backend }))
    }
}

#[async_trait]
impl ToolHandler for CreateTicketTool {
    async fn call(&self, args: Map<String, JsonValue>) -> Result<JsonValue> {
        let title = require_str(&args, "title")?;
        let description = require_str(&args, "description")?;
        let priority = args
            .get("priority")
            .and_then(JsonValue::as_str)
            .unwrap_or("normal")
            .to_string();
        if !PRIORITIES.contains(&priority.as_str()) {
            return Err(BridgeError::invalid_params(format!(
                "priority must be one of {PRIORITIES:?}, got '{priority}'"
            )));
        }

        let ticket = self
            .backend
            .create_ticket(NewTicket {
                title,
                description,
                priority,
            })
            .await?;
        info!(id = ticket.id, "created ticket");
        Ok(json!(format!(
            "Created ticket #{} ({}): {}",
            ticket.id, ticket.priority, ticket.title
        )))
    }
}

/// Searches existing tickets
pub struct SearchTicketsTool {
    backend: Arc<dyn TicketBackend>,
}

impl SearchTicketsTool {
    /// Build the registered descriptor for this tool
    pub fn descriptor(backend: Arc<dyn TicketBackend>) -> ToolDescriptor {
        ToolDescriptor::builder("search_tickets")
            .description("Search existing tickets by free-text query")
            .required_param("query", ParameterType::String, "Search terms")
            .optional_param(
                "limit",
                ParameterType::Integer,
                "Maximum number of results (default 10)",
            )
            .handler(Arc::new(Self { backend }))
    }
}

#[async_trait]
impl ToolHandler for SearchTicketsTool {
    async fn call(&self, args: Map<String, JsonValue>) -> Result<JsonValue> {
        let query = require_str(&args, "query")?;
        let limit = args
            .get("limit")
            .and_then(JsonValue::as_u64)
            .unwrap_or(10)
            .min(100) as usize;

        let tickets = self.backend.search_tickets(&query, limit).await?;
        if tickets.is_empty() {
            return Ok(json!(format!("No tickets matched '{query}'")));
        }
        let mut lines = vec![format!("{} ticket(s) matched '{query}':", tickets.len())];
        for ticket in &tickets {
            lines.push(format!(
                "#{} [{}/{}] {}",
                ticket.id, ticket.status, ticket.priority, ticket.title
            ));
        }
        Ok(json!(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Ticket, TicketStats};
    use helpdesk_mcp::Result;

    struct FakeBackend;

    #[async_trait]
    impl TicketBackend for FakeBackend {
        async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
            Ok(Ticket {
                id: 101,
                title: ticket.title,
                description: ticket.description,
                status: "open".to_string(),
                priority: ticket.priority,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            })
        }

        async fn get_ticket(&self, _id: u64) -> Result<Ticket> {
            unimplemented!()
        }

        async fn recent_tickets(&self, _limit: usize) -> Result<Vec<Ticket>> {
            unimplemented!()
        }

        async fn search_tickets(&self, _query: &str, _limit: usize) -> Result<Vec<Ticket>> {
            Ok(vec![])
        }

        async fn ticket_stats(&self) -> Result<TicketStats> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_create_ticket_result_string() {
        let tool = CreateTicketTool::descriptor(Arc::new(FakeBackend));
        let mut args = Map::new();
        args.insert("title".to_string(), json!("Printer on fire"));
        args.insert("description".to_string(), json!("It is literally on fire"));
        args.insert("priority".to_string(), json!("high"));
        let result = tool.invoke(args).await.unwrap();
        let text = result.as_str().unwrap();
        assert!(text.starts_with("Created ticket #101"));
        assert!(text.contains("Printer on fire"));
    }

    #[tokio::test]
    async fn test_create_ticket_rejects_unknown_priority() {
        let tool = CreateTicketTool::descriptor(Arc::new(FakeBackend));
        let mut args = Map::new();
        args.insert("title".to_string(), json!("x"));
        args.insert("description".to_string(), json!("y"));
        args.insert("priority".to_string(), json!("apocalyptic"));
        let err = tool.invoke(args).await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_search_with_no_matches() {
        let tool = SearchTicketsTool::descriptor(Arc::new(FakeBackend));
        let mut args = Map::new();
        args.insert("query".to_string(), json!("unicorn"));
        let result = tool.invoke(args).await.unwrap();
        assert_eq!(result, json!("No tickets matched 'unicorn'"));
    }
}
