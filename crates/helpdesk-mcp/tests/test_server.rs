//! End-to-end tests for the serve loop over an in-memory stream pair

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use helpdesk_mcp::{
    BridgeError, McpServer, ParameterType, Registry, ResourceDescriptor, ResourceHandler,
    ToolDescriptor, ToolHandler,
};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, BridgeError> {
        let message = args.get("message").and_then(Value::as_str).unwrap_or("");
        Ok(json!(format!("echo: {message}")))
    }
}

/// Sleeps for the duration given in its `millis` argument
struct SleepTool;

#[async_trait]
impl ToolHandler for SleepTool {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, BridgeError> {
        let millis = args.get("millis").and_then(Value::as_u64).unwrap_or(200);
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(json!("slept"))
    }
}

struct RecentTickets;

#[async_trait]
impl ResourceHandler for RecentTickets {
    async fn read(&self) -> Result<String, BridgeError> {
        Ok("#1 open: printer on fire".to_string())
    }
}

struct Harness {
    to_server: DuplexStream,
    from_server: BufReader<DuplexStream>,
    server: JoinHandle<Result<(), BridgeError>>,
}

impl Harness {
    fn start() -> Self {
        let mut tools = Registry::new();
        tools
            .register(
                ToolDescriptor::builder("echo")
                    .description("Echo a message")
                    .required_param("message", ParameterType::String, "Message to echo")
                    .handler(Arc::new(EchoTool)),
            )
            .unwrap();
        tools
            .register(
                ToolDescriptor::builder("sleep")
                    .description("Sleep for a while")
                    .optional_param("millis", ParameterType::Integer, "Sleep duration")
                    .handler(Arc::new(SleepTool)),
            )
            .unwrap();

        let mut resources = Registry::new();
        resources
            .register(ResourceDescriptor::new(
                "tickets://recent",
                "Recent tickets",
                "Most recent tickets",
                Arc::new(RecentTickets),
            ))
            .unwrap();

        let server = McpServer::builder()
            .server_info("test-bridge", "0.0.0")
            .tools(tools)
            .resources(resources)
            .handler_timeout(Duration::from_secs(5))
            .shutdown_grace(Duration::from_secs(2))
            .build();

        let (to_server, server_input) = tokio::io::duplex(16 * 1024);
        let (server_output, from_server) = tokio::io::duplex(16 * 1024);
        let handle = tokio::spawn(server.serve(server_input, server_output));

        Self {
            to_server,
            from_server: BufReader::new(from_server),
            server: handle,
        }
    }

    async fn send(&mut self, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        self.to_server.write_all(line.as_bytes()).await.unwrap();
    }

    async fn send_raw(&mut self, raw: &str) {
        self.to_server.write_all(raw.as_bytes()).await.unwrap();
        self.to_server.write_all(b"\n").await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let mut line = String::new();
        let n = self.from_server.read_line(&mut line).await.unwrap();
        assert!(n > 0, "server closed the stream unexpectedly");
        serde_json::from_str(line.trim()).unwrap()
    }

    async fn shutdown(mut self) {
        self.send(json!({"jsonrpc": "2.0", "id": "bye", "method": "shutdown"}))
            .await;
        let resp = self.recv().await;
        assert_eq!(resp["id"], "bye");
        self.server.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_initialize_then_call_tool() {
    let mut h = Harness::start();

    h.send(json!({
        "jsonrpc": "2.0", "id": 0, "method": "initialize",
        "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "test", "version": "0"}}
    }))
    .await;
    let init = h.recv().await;
    assert_eq!(init["id"], 0);
    assert_eq!(init["result"]["serverInfo"]["name"], "test-bridge");

    h.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;

    h.send(json!({
        "jsonrpc": "2.0", "id": 1, "method": "tools/call",
        "params": {"name": "echo", "arguments": {"message": "hi"}}
    }))
    .await;
    let resp = h.recv().await;
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["result"]["content"][0]["text"], "echo: hi");

    h.shutdown().await;
}

#[tokio::test]
async fn test_unknown_method_and_unknown_tool() {
    let mut h = Harness::start();

    h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/destroy"}))
        .await;
    let resp = h.recv().await;
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["error"]["code"], -32601);

    h.send(json!({
        "jsonrpc": "2.0", "id": 2, "method": "tools/call",
        "params": {"name": "delete_everything", "arguments": {}}
    }))
    .await;
    let resp = h.recv().await;
    assert_eq!(resp["id"], 2);
    assert_eq!(resp["error"]["code"], -32601);

    h.shutdown().await;
}

#[tokio::test]
async fn test_unknown_resource_uri_is_not_found() {
    let mut h = Harness::start();

    h.send(json!({
        "jsonrpc": "2.0", "id": 1, "method": "resources/read",
        "params": {"uri": "tickets://nope"}
    }))
    .await;
    let resp = h.recv().await;
    assert_eq!(resp["error"]["code"], -32002);

    h.shutdown().await;
}

#[tokio::test]
async fn test_resource_read_is_idempotent() {
    let mut h = Harness::start();

    let read = json!({
        "jsonrpc": "2.0", "id": 1, "method": "resources/read",
        "params": {"uri": "tickets://recent"}
    });
    h.send(read.clone()).await;
    let first = h.recv().await;
    let mut second_req = read;
    second_req["id"] = json!(2);
    h.send(second_req).await;
    let second = h.recv().await;
    assert_eq!(first["result"]["contents"], second["result"]["contents"]);

    h.shutdown().await;
}

#[tokio::test]
async fn test_malformed_line_with_id_gets_error_response() {
    let mut h = Harness::start();

    // Valid JSON, recoverable id, but no method field
    h.send_raw(r#"{"jsonrpc": "2.0", "id": 9, "params": {}}"#).await;
    let resp = h.recv().await;
    assert_eq!(resp["id"], 9);
    assert_eq!(resp["error"]["code"], -32700);

    // Complete garbage is dropped; the bridge keeps serving
    h.send_raw("not json at all").await;
    h.send(json!({"jsonrpc": "2.0", "id": 10, "method": "ping"}))
        .await;
    let resp = h.recv().await;
    assert_eq!(resp["id"], 10);

    h.shutdown().await;
}

#[tokio::test]
async fn test_slow_request_does_not_block_fast_one() {
    let mut h = Harness::start();

    h.send(json!({
        "jsonrpc": "2.0", "id": "slow", "method": "tools/call",
        "params": {"name": "sleep", "arguments": {"millis": 400}}
    }))
    .await;
    h.send(json!({
        "jsonrpc": "2.0", "id": "fast", "method": "tools/call",
        "params": {"name": "echo", "arguments": {"message": "quick"}}
    }))
    .await;

    // Response order is not request order; collect both and match by id
    let mut by_id = HashMap::new();
    for _ in 0..2 {
        let resp = h.recv().await;
        by_id.insert(resp["id"].as_str().unwrap().to_string(), resp.clone());
    }
    assert_eq!(
        by_id["fast"]["result"]["content"][0]["text"],
        "echo: quick"
    );
    assert_eq!(by_id["slow"]["result"]["content"][0]["text"], "slept");

    h.shutdown().await;
}

#[tokio::test]
async fn test_cancelled_request_gets_no_response() {
    let mut h = Harness::start();

    h.send(json!({
        "jsonrpc": "2.0", "id": 77, "method": "tools/call",
        "params": {"name": "sleep", "arguments": {"millis": 60_000}}
    }))
    .await;
    h.send(json!({
        "jsonrpc": "2.0", "method": "notifications/cancelled",
        "params": {"requestId": 77, "reason": "user changed their mind"}
    }))
    .await;
    h.send(json!({
        "jsonrpc": "2.0", "id": 78, "method": "tools/call",
        "params": {"name": "echo", "arguments": {"message": "still alive"}}
    }))
    .await;

    // Only the echo answers; the cancelled request is silently discarded
    let resp = h.recv().await;
    assert_eq!(resp["id"], 78);
    assert_eq!(resp["result"]["content"][0]["text"], "echo: still alive");

    h.shutdown().await;
}

#[tokio::test]
async fn test_reused_in_flight_id_is_rejected() {
    let mut h = Harness::start();

    h.send(json!({
        "jsonrpc": "2.0", "id": 5, "method": "tools/call",
        "params": {"name": "sleep", "arguments": {"millis": 300}}
    }))
    .await;
    h.send(json!({
        "jsonrpc": "2.0", "id": 5, "method": "tools/call",
        "params": {"name": "echo", "arguments": {"message": "impostor"}}
    }))
    .await;

    // The newcomer is refused while the first request keeps running
    let rejection = h.recv().await;
    assert_eq!(rejection["id"], 5);
    assert_eq!(rejection["error"]["code"], -32602);
    assert!(rejection["error"]["message"]
        .as_str()
        .unwrap()
        .contains("already in flight"));

    let original = h.recv().await;
    assert_eq!(original["id"], 5);
    assert_eq!(original["result"]["content"][0]["text"], "slept");

    h.shutdown().await;
}

#[tokio::test]
async fn test_eof_terminates_the_server() {
    let h = Harness::start();
    drop(h.to_server);
    h.server.await.unwrap().unwrap();
}
