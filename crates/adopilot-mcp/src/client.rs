//! Stdio MCP client.
//!
//! Messages are single-line JSON objects separated by `\n`. One request is
//! in flight at a time: the transport lock is held from writing the request
//! until its response has been read.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use adopilot_core::config::ServerCommand;
use adopilot_core::types::ToolDescriptor;

use crate::error::McpError;
use crate::protocol::{
    CallToolResult, InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcReply, JsonRpcRequest,
    ListToolsResult, ServerInfo, JSONRPC_VERSION, METHOD_NOT_FOUND, PROTOCOL_VERSION,
};
use crate::traits::ToolServer;

type BoxedReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

// ─────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────

struct Transport {
    reader: BoxedReader,
    writer: BoxedWriter,
}

impl Transport {
    async fn send<T: Serialize>(&mut self, message: &T) -> Result<(), McpError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read until the response to `id` arrives, answering server requests
    /// and skipping notifications on the way.
    async fn read_response(&mut self, id: u64) -> Result<Value, McpError> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(McpError::Closed);
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let message: JsonRpcMessage = match serde_json::from_str(line) {
                Ok(m) => m,
                Err(e) => {
                    debug!(error = %e, "skipping non-JSON-RPC line from tool server");
                    continue;
                }
            };

            if message.answers(id) {
                if let Some(err) = message.error {
                    return Err(McpError::Rpc {
                        code: err.code,
                        message: err.message,
                    });
                }
                return Ok(message.result.unwrap_or(Value::Null));
            }

            match (message.method, message.id) {
                (Some(method), Some(request_id)) => self.answer_server_request(&method, request_id).await?,
                (Some(method), None) => debug!(method = %method, "tool server notification"),
                (None, other) => debug!(id = ?other, "ignoring response to an earlier request"),
            }
        }
    }

    /// We expose no client capabilities, so only `ping` gets a real answer.
    async fn answer_server_request(&mut self, method: &str, id: Value) -> Result<(), McpError> {
        let reply = if method == "ping" {
            JsonRpcReply {
                jsonrpc: JSONRPC_VERSION,
                id,
                result: Some(json!({})),
                error: None,
            }
        } else {
            debug!(method = %method, "rejecting unsupported server request");
            JsonRpcReply {
                jsonrpc: JSONRPC_VERSION,
                id,
                result: None,
                error: Some(JsonRpcError {
                    code: METHOD_NOT_FOUND,
                    message: format!("Method not found: {method}"),
                    data: None,
                }),
            }
        };
        self.send(&reply).await
    }
}

// ─────────────────────────────────────────────
// McpClient
// ─────────────────────────────────────────────

/// JSON-RPC client for one tool server.
pub struct McpClient {
    transport: Mutex<Transport>,
    next_id: AtomicU64,
    request_timeout: Duration,
    /// Held so the server is killed when the client is dropped.
    child: Option<Child>,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("request_timeout", &self.request_timeout)
            .field("pid", &self.child.as_ref().and_then(Child::id))
            .finish()
    }
}

impl McpClient {
    /// Wrap an already-connected pair of streams. No handshake is performed.
    pub fn from_streams<R, W>(reader: R, writer: W, request_timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        let writer: BoxedWriter = Box::new(writer);
        Self {
            transport: Mutex::new(Transport {
                reader: BufReader::new(reader),
                writer,
            }),
            next_id: AtomicU64::new(1),
            request_timeout,
            child: None,
        }
    }

    /// Start the server process and connect to its stdio.
    ///
    /// The server's stderr is inherited so its diagnostics reach the
    /// terminal. Call [`initialize`](Self::initialize) before anything else.
    pub fn spawn(command: &ServerCommand, request_timeout: Duration) -> Result<Self, McpError> {
        info!(program = %command.program, args = ?command.args, "starting tool server");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| McpError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(McpError::Closed)?;
        let stdout = child.stdout.take().ok_or(McpError::Closed)?;

        let mut client = Self::from_streams(stdout, stdin, request_timeout);
        client.child = Some(child);
        Ok(client)
    }

    /// Perform the `initialize` handshake and send `notifications/initialized`.
    pub async fn initialize(&self) -> Result<ServerInfo, McpError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "adopilot",
                "version": env!("CARGO_PKG_VERSION"),
            }
        });
        let result = self.request("initialize", Some(params)).await?;
        let init: InitializeResult = serde_json::from_value(result)?;

        if !init.protocol_version.is_empty() && init.protocol_version != PROTOCOL_VERSION {
            warn!(
                requested = PROTOCOL_VERSION,
                server = %init.protocol_version,
                "tool server negotiated a different protocol version"
            );
        }

        self.notify("notifications/initialized", None).await?;

        info!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            "tool server initialized"
        );
        Ok(init.server_info)
    }

    /// Send a request and wait for its result.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut transport = self.transport.lock().await;

        debug!(id, method, "tool server request");
        let exchange = async {
            transport
                .send(&JsonRpcRequest::request(id, method, params))
                .await?;
            transport.read_response(id).await
        };

        match tokio::time::timeout(self.request_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(McpError::Timeout {
                method: method.to_string(),
                secs: self.request_timeout.as_secs(),
            }),
        }
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let mut transport = self.transport.lock().await;
        transport
            .send(&JsonRpcRequest::notification(method, params))
            .await
    }
}

#[async_trait]
impl ToolServer for McpClient {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ListToolsResult =
                serde_json::from_value(self.request("tools/list", params).await?)?;
            debug!(page_len = page.tools.len(), more = page.next_cursor.is_some(), "tools/list page");
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if Some(&next) != cursor.as_ref() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, McpError> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
