//! Bridge entry point: stdin/stdout MCP server wrapping the ticket API

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use helpdesk_bridge::build_registries;
use helpdesk_bridge::client::{TicketBackend, TicketClient};
use helpdesk_bridge::config::BridgeConfig;
use helpdesk_mcp::McpServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "helpdesk-bridge",
    version,
    about = "MCP bridge exposing a helpdesk ticket REST API as tools, resources, and prompts"
)]
struct Args {
    /// Base URL of the ticket API
    #[arg(long, env = "API_BASE_URL")]
    api_base_url: String,

    /// Bearer credential for the Authorization header
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// Per-call ceiling for downstream requests, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value_t = 30)]
    request_timeout_seconds: u64,

    /// Maximum simultaneous downstream calls
    #[arg(long, env = "CONCURRENCY_LIMIT", default_value_t = 8)]
    concurrency_limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so all diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = BridgeConfig::builder()
        .api_base_url(args.api_base_url)
        .api_token(args.api_token)
        .request_timeout_seconds(args.request_timeout_seconds)
        .concurrency_limit(args.concurrency_limit)
        .build()?;
    info!(
        api = %config.api_base_url,
        timeout_s = config.request_timeout.as_secs(),
        concurrency = config.concurrency_limit,
        "starting helpdesk bridge"
    );

    let backend: Arc<dyn TicketBackend> = Arc::new(TicketClient::new(&config)?);
    let (tools, resources, prompts) = build_registries(backend)?;

    // The handler budget covers one downstream call plus dispatch overhead
    let handler_timeout = config.request_timeout + Duration::from_secs(5);

    McpServer::builder()
        .server_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        .tools(tools)
        .resources(resources)
        .prompts(prompts)
        .handler_timeout(handler_timeout)
        .build()
        .serve(tokio::io::stdin(), tokio::io::stdout())
        .await?;

    info!("bridge stopped");
    Ok(())
}
