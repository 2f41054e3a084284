//! Downstream client for the wrapped ticket REST API
//!
//! Attaches the configured bearer credential, applies the per-call timeout,
//! caps simultaneous calls with a semaphore, and classifies failures into
//! the bridge error taxonomy. Calls are never retried automatically; tool
//! calls may have side effects downstream.

use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_mcp::{BridgeError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;

use crate::config::BridgeConfig;

/// A ticket as returned by the downstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub created_at: String,
}

/// Payload for creating a ticket
#[derive(Debug, Clone, Serialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: String,
}

/// Aggregate ticket counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStats {
    pub open: u64,
    pub pending: u64,
    pub closed: u64,
}

/// Abstraction over the downstream ticket API
///
/// Handlers depend on this seam rather than the HTTP client directly, so
/// tests can substitute an in-memory backend.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    /// Create a new ticket (side-effecting)
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket>;

    /// Fetch one ticket by id
    async fn get_ticket(&self, id: u64) -> Result<Ticket>;

    /// Fetch the most recently updated tickets
    async fn recent_tickets(&self, limit: usize) -> Result<Vec<Ticket>>;

    /// Full-text search over tickets
    async fn search_tickets(&self, query: &str, limit: usize) -> Result<Vec<Ticket>>;

    /// Fetch aggregate counts
    async fn ticket_stats(&self) -> Result<TicketStats>;
}

/// HTTP implementation of [`TicketBackend`] over `reqwest`
pub struct TicketClient {
    http: reqwest::Client,
    base_url: Url,
    api_token: String,
    permits: Arc<Semaphore>,
}

impl TicketClient {
    /// Create a client from validated configuration
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BridgeError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            api_token: config.api_token.clone(),
            permits: Arc::new(Semaphore::new(config.concurrency_limit)),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| BridgeError::internal(format!("bad endpoint '{path}': {e}")))
    }

    /// Send a prepared request and decode the JSON body
    ///
    /// Holds a semaphore permit for the duration of the call. Classification:
    /// transport errors and 5xx are `UpstreamUnavailable`, 4xx is
    /// `UpstreamRejected`, an undecodable body is `UpstreamMalformedResponse`.
    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| BridgeError::internal("downstream semaphore closed"))?;

        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| BridgeError::upstream_unavailable(e.to_string()))?;

        let status = response.status();
        debug!(status = %status, "downstream response");
        if status.is_server_error() {
            return Err(BridgeError::upstream_unavailable(format!("HTTP {status}")));
        }
        if status.is_client_error() {
            return Err(BridgeError::upstream_rejected(format!("HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BridgeError::upstream_malformed(e.to_string()))
    }
}

#[async_trait]
impl TicketBackend for TicketClient {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        let url = self.endpoint("tickets")?;
        self.execute(self.http.post(url).json(&ticket)).await
    }

    async fn get_ticket(&self, id: u64) -> Result<Ticket> {
        let url = self.endpoint(&format!("tickets/{id}"))?;
        self.execute(self.http.get(url)).await
    }

    async fn recent_tickets(&self, limit: usize) -> Result<Vec<Ticket>> {
        let url = self.endpoint("tickets/recent")?;
        self.execute(self.http.get(url).query(&[("limit", limit)]))
            .await
    }

    async fn search_tickets(&self, query: &str, limit: usize) -> Result<Vec<Ticket>> {
        let url = self.endpoint("tickets/search")?;
        self.execute(
            self.http
                .get(url)
                .query(&[("q", query)])
                .query(&[("limit", limit)]),
        )
        .await
    }

    async fn ticket_stats(&self) -> Result<TicketStats> {
        let url = self.endpoint("tickets/stats")?;
        self.execute(self.http.get(url)).await
    }
}
