//! Server orchestration: read loop, per-request tasks, graceful shutdown
//!
//! One logical dispatch loop consumes framed messages in arrival order. Each
//! request with an id runs in its own task so a slow tool call never blocks
//! the loop; responses funnel through the serialized writer and may complete
//! out of request order. Registries are wired in before the loop starts and
//! never change afterwards.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{BridgeError, Result};
use crate::prompt::PromptDescriptor;
use crate::protocol::{
    parse_message, Implementation, JsonRpcRequest, JsonRpcResponse, ParsedMessage, RequestId,
};
use crate::registry::Registry;
use crate::resource::ResourceDescriptor;
use crate::tool::ToolDescriptor;
use crate::transport::{spawn_writer, MessageReader, MessageWriter};

/// Senders that cancel the matching in-flight request task
type InFlightMap = Arc<Mutex<FxHashMap<RequestId, oneshot::Sender<()>>>>;

#[derive(Debug, Deserialize)]
struct CancelledParams {
    #[serde(rename = "requestId")]
    request_id: RequestId,
    #[serde(default)]
    reason: Option<String>,
}

/// MCP server driving the read-dispatch-write loop over a stream pair
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
    shutdown_grace: Duration,
}

impl McpServer {
    /// Create a builder for the server
    pub fn builder() -> McpServerBuilder {
        McpServerBuilder::new()
    }

    /// Serve the MCP protocol until EOF or an explicit `shutdown` request
    ///
    /// In-flight handlers get the configured grace period to finish before
    /// being aborted; the writer drains before the transport closes.
    pub async fn serve<R, W>(self, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (writer, writer_handle) = spawn_writer(output);
        let mut reader = MessageReader::new(input);
        let mut tasks: JoinSet<()> = JoinSet::new();
        let in_flight: InFlightMap = Arc::new(Mutex::new(FxHashMap::default()));

        info!("bridge serving");
        loop {
            // Reap tasks that already finished so the set stays small
            while tasks.try_join_next().is_some() {}

            let unit = match reader.next_unit().await {
                Ok(Some(unit)) => unit,
                Ok(None) => {
                    info!("input stream closed");
                    break;
                }
                Err(e) => {
                    warn!("transport read failed: {e}");
                    break;
                }
            };

            match parse_message(&unit) {
                ParsedMessage::Unreadable(reason) => {
                    warn!("dropping unreadable message: {reason}");
                }
                ParsedMessage::Invalid { id, reason } => {
                    let err = BridgeError::malformed(reason);
                    writer.send(&JsonRpcResponse::failure(id, &err)).await?;
                }
                ParsedMessage::Request(req) if req.method == "shutdown" => {
                    info!("shutdown requested");
                    if let Some(id) = req.id {
                        writer
                            .send(&JsonRpcResponse::success(id, json!(null)))
                            .await?;
                    }
                    break;
                }
                ParsedMessage::Request(req) if req.method == "notifications/cancelled" => {
                    self.handle_cancellation(&in_flight, req.params);
                }
                ParsedMessage::Request(req) => {
                    self.spawn_request(&mut tasks, &writer, &in_flight, req);
                }
            }
        }

        // Grace period for in-flight handlers, then abort the stragglers
        let deadline = tokio::time::Instant::now() + self.shutdown_grace;
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(_) => {
                    warn!("shutdown grace period elapsed, aborting in-flight handlers");
                    tasks.shutdown().await;
                    break;
                }
            }
        }

        drop(writer);
        let _ = writer_handle.await;
        Ok(())
    }

    fn handle_cancellation(&self, in_flight: &InFlightMap, params: Option<JsonValue>) {
        let params: CancelledParams =
            match serde_json::from_value(params.unwrap_or(JsonValue::Null)) {
                Ok(p) => p,
                Err(e) => {
                    warn!("ignoring malformed cancellation notification: {e}");
                    return;
                }
            };
        let sender = in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .remove(&params.request_id);
        match sender {
            Some(tx) => {
                debug!(
                    id = %params.request_id,
                    reason = params.reason.as_deref().unwrap_or("unspecified"),
                    "cancelling request"
                );
                let _ = tx.send(());
            }
            None => debug!(id = %params.request_id, "cancellation for unknown request"),
        }
    }

    fn spawn_request(
        &self,
        tasks: &mut JoinSet<()>,
        writer: &MessageWriter,
        in_flight: &InFlightMap,
        req: JsonRpcRequest,
    ) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let JsonRpcRequest {
            id, method, params, ..
        } = req;

        let Some(id) = id else {
            // Notification: nothing to respond to, faults are only logged
            tasks.spawn(async move {
                if let Err(e) = dispatcher.dispatch(&method, params).await {
                    warn!(method = %method, "notification handler failed: {e}");
                }
            });
            return;
        };

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        {
            let mut map = in_flight.lock().expect("in-flight lock poisoned");
            if map.contains_key(&id) {
                // Reusing an id while the first request is still running would
                // clobber its cancel sender; refuse the newcomer instead.
                drop(map);
                warn!(id = %id, "rejecting request that reuses an in-flight id");
                let err =
                    BridgeError::invalid_params(format!("request id {id} is already in flight"));
                let writer = writer.clone();
                tasks.spawn(async move {
                    if let Err(e) = writer.send(&JsonRpcResponse::failure(id, &err)).await {
                        warn!("failed to emit response: {e}");
                    }
                });
                return;
            }
            map.insert(id.clone(), cancel_tx);
        }

        let writer = writer.clone();
        let in_flight = Arc::clone(in_flight);
        tasks.spawn(async move {
            // The handler runs in its own task so a panic is contained and
            // surfaced as InternalError instead of killing this one.
            let mut work = tokio::spawn({
                let dispatcher = Arc::clone(&dispatcher);
                async move { dispatcher.dispatch(&method, params).await }
            });

            let outcome = tokio::select! {
                _ = &mut cancel_rx => {
                    work.abort();
                    debug!(id = %id, "request cancelled, discarding result");
                    None
                }
                joined = &mut work => Some(match joined {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => {
                        error!(id = %id, "handler panicked: {e}");
                        Err(BridgeError::internal("handler panicked"))
                    }
                    Err(_) => Err(BridgeError::internal("handler aborted")),
                }),
            };

            in_flight
                .lock()
                .expect("in-flight lock poisoned")
                .remove(&id);

            let Some(result) = outcome else { return };
            let response = match result {
                Ok(Some(value)) => JsonRpcResponse::success(id, value),
                Ok(None) => JsonRpcResponse::success(id, json!(null)),
                Err(e) => {
                    if matches!(e, BridgeError::Internal(_)) {
                        error!(error = %e, "internal fault during dispatch");
                    } else {
                        debug!(error = %e, "request failed");
                    }
                    JsonRpcResponse::failure(id, &e)
                }
            };
            if let Err(e) = writer.send(&response).await {
                warn!("failed to emit response: {e}");
            }
        });
    }
}

/// Builder wiring registries and limits into a server
pub struct McpServerBuilder {
    server_info: Implementation,
    tools: Registry<ToolDescriptor>,
    resources: Registry<ResourceDescriptor>,
    prompts: Registry<PromptDescriptor>,
    handler_timeout: Duration,
    shutdown_grace: Duration,
}

impl McpServerBuilder {
    /// Create a builder with empty registries and default limits
    pub fn new() -> Self {
        Self {
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            tools: Registry::new(),
            resources: Registry::new(),
            prompts: Registry::new(),
            handler_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
        }
    }

    /// Set the name and version reported during `initialize`
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_info = Implementation {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    /// Replace the tool registry
    pub fn tools(mut self, tools: Registry<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    /// Replace the resource registry
    pub fn resources(mut self, resources: Registry<ResourceDescriptor>) -> Self {
        self.resources = resources;
        self
    }

    /// Replace the prompt registry
    pub fn prompts(mut self, prompts: Registry<PromptDescriptor>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Per-handler-invocation timeout
    pub fn handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Grace period for in-flight handlers at shutdown
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Build the server
    pub fn build(self) -> McpServer {
        McpServer {
            dispatcher: Arc::new(Dispatcher::new(
                self.server_info,
                self.tools,
                self.resources,
                self.prompts,
                self.handler_timeout,
            )),
            shutdown_grace: self.shutdown_grace,
        }
    }
}

impl Default for McpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
