//! Line-delimited JSON-RPC framing over byte streams
//!
//! One message per line, preserving arrival order on the read side. Writes
//! from concurrent handler tasks funnel through a single writer task so that
//! no two responses ever interleave on the output stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::protocol::JsonRpcResponse;

/// Reads framed messages from the inbound byte stream
pub struct MessageReader<R> {
    reader: BufReader<R>,
    line: String,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    /// Wrap an inbound stream
    pub fn new(input: R) -> Self {
        Self {
            reader: BufReader::new(input),
            line: String::new(),
        }
    }

    /// Read the next framed unit, or `None` on EOF
    ///
    /// Blank lines are skipped; the raw line is returned unparsed so the
    /// caller controls the malformed-unit policy.
    pub async fn next_unit(&mut self) -> std::io::Result<Option<String>> {
        loop {
            self.line.clear();
            let n = self.reader.read_line(&mut self.line).await?;
            if n == 0 {
                return Ok(None);
            }
            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }
}

/// Cloneable handle feeding the single serialized writer task
#[derive(Clone)]
pub struct MessageWriter {
    tx: mpsc::Sender<String>,
}

impl MessageWriter {
    /// Serialize and enqueue one response
    pub async fn send(&self, response: &JsonRpcResponse) -> Result<()> {
        let line = serde_json::to_string(response)
            .map_err(|e| BridgeError::internal(format!("response serialization failed: {e}")))?;
        self.tx
            .send(line)
            .await
            .map_err(|_| BridgeError::internal("writer task has shut down"))
    }
}

/// Spawn the writer task for an outbound stream
///
/// Returns the cloneable handle plus the task's join handle. The task drains
/// its queue and flushes after every message; dropping the last
/// [`MessageWriter`] lets it finish, so in-flight writes always complete
/// before the transport closes.
pub fn spawn_writer<W>(mut output: W) -> (MessageWriter, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(64);
    let handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            debug!(len = line.len(), "writing response");
            if let Err(e) = write_line(&mut output, &line).await {
                warn!("transport write failed: {e}");
                break;
            }
        }
        let _ = output.flush().await;
    });
    (MessageWriter { tx }, handle)
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> std::io::Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
