//! MCP server lifecycle for the article search adapter.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool and resource requests
//! 3. **Shutdown**: Graceful connection termination
//!
//! # Concurrency
//!
//! The main loop owns the reader and handles cheap requests inline.
//! `tools/call` runs on its own task so a slow upstream never blocks other
//! requests. All responses flow through one channel to a writer task that
//! owns the output stream, so writes never interleave.
//!
//! # Shutdown
//!
//! The loop ends on SIGINT/SIGTERM (Ctrl+C on Windows), on EOF, or when
//! [`ShutdownHandle::stop`] is called. On every exit path in-flight calls
//! are abandoned and the writer is flushed and closed.

use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::mcp::dispatcher::{Dispatcher, ToolOutcome};
use crate::mcp::protocol::{
    ErrorCode, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, Outgoing, RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::transport::{self, Line, MessageReader, MessageWriter};

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Resource-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceCapabilities>,
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            resources: Some(ResourceCapabilities::default()),
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Resource-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCapabilities {
    /// Whether clients may subscribe to resource updates.
    #[serde(skip_serializing_if = "is_false")]
    pub subscribe: bool,
    /// Whether the resource list can change during the session.
    #[serde(skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Parameters for resources/read request.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceParams {
    /// URI of the resource.
    pub uri: String,
}

/// Stops a running [`McpServer`] from another task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Requests shutdown. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Per-run channels: the response sender, in-flight tool calls and the
/// writer task.
struct Inflight {
    tx: mpsc::UnboundedSender<Outgoing>,
    tasks: JoinSet<()>,
    /// `None` once the writer task has been joined.
    writer: Option<JoinHandle<io::Result<()>>>,
}

impl Inflight {
    fn send(&self, message: impl Into<Outgoing>) {
        // Only fails once the writer has gone away; serve() notices that.
        let _ = self.tx.send(message.into());
    }
}

/// Resolves with the reason output stopped, once the writer task ends.
async fn writer_stopped(writer: &mut Option<JoinHandle<io::Result<()>>>) -> io::Error {
    let Some(handle) = writer.as_mut() else {
        return std::future::pending().await;
    };
    let joined = handle.await;
    *writer = None;

    match joined {
        Ok(Ok(())) => io::Error::new(io::ErrorKind::BrokenPipe, "output closed"),
        Ok(Err(e)) => e,
        Err(e) => io::Error::other(e),
    }
}

/// The MCP server for NYTimes article search.
pub struct McpServer<R, W> {
    /// Current server state.
    state: ServerState,
    /// Reading half of the transport.
    reader: MessageReader<R>,
    /// Writing half, moved into the writer task on run.
    writer: Option<MessageWriter<W>>,
    /// Tool and resource handler.
    dispatcher: Arc<Dispatcher>,
    /// Shutdown request channel.
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl McpServer<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Creates a server speaking over stdin/stdout.
    #[must_use]
    pub fn stdio(dispatcher: Dispatcher) -> Self {
        let (reader, writer) = transport::stdio();
        Self::new(dispatcher, reader, writer)
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Creates a server over the given transport halves.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, reader: MessageReader<R>, writer: MessageWriter<W>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            state: ServerState::AwaitingInit,
            reader,
            writer: Some(writer),
            dispatcher: Arc::new(dispatcher),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns a handle that stops [`run`](Self::run) when triggered.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Runs the MCP server until shutdown, then releases the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails or the server already ran.
    /// A failed write stops the server immediately.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("server transport already released"))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Outgoing>();
        let writer_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                writer.write(&message).await?;
            }
            writer.close().await
        });

        let mut inflight = Inflight {
            tx,
            tasks: JoinSet::new(),
            writer: Some(writer_task),
        };

        let result = self.serve(&mut inflight).await;
        self.state = ServerState::ShuttingDown;

        let abandoned = inflight.tasks.len();
        if abandoned > 0 {
            tracing::info!(abandoned, "Abandoning in-flight tool calls");
        }
        inflight.tasks.shutdown().await;

        let Inflight { tx, writer, .. } = inflight;
        drop(tx);

        let closed = match writer {
            Some(handle) => handle.await.unwrap_or_else(|e| Err(io::Error::other(e))),
            None => Ok(()),
        };
        result.and(closed)
    }

    /// The main loop. Returns when shutdown is requested or input ends.
    async fn serve(&mut self, inflight: &mut Inflight) -> io::Result<()> {
        let mut stop = self.shutdown_rx.clone();
        let interrupted = interrupted();
        tokio::pin!(interrupted);

        loop {
            tokio::select! {
                signal = &mut interrupted => {
                    let signal = signal?;
                    tracing::info!(signal, "Received signal, initiating graceful shutdown");
                    return Ok(());
                }

                Ok(()) = stop.changed() => {
                    tracing::info!("Shutdown requested");
                    return Ok(());
                }

                error = writer_stopped(&mut inflight.writer) => {
                    tracing::error!(error = %error, "Output failed, stopping");
                    return Err(error);
                }

                Some(joined) = inflight.tasks.join_next(), if !inflight.tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Request task failed");
                    }
                }

                line_result = self.reader.read_line() => {
                    if self.handle_transport_result(line_result, inflight)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    fn handle_transport_result(
        &mut self,
        line_result: io::Result<Option<Line>>,
        inflight: &mut Inflight,
    ) -> io::Result<bool> {
        let line = match line_result? {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Rejected non-UTF-8 message");
                inflight.send(Outgoing::Error(JsonRpcError::parse_error()));
                return Ok(false);
            }
            None => {
                tracing::info!("Input closed");
                return Ok(true);
            }
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        self.handle_line(&line, inflight);

        Ok(false)
    }

    /// Handles a single line of input.
    fn handle_line(&mut self, line: &str, inflight: &mut Inflight) {
        use crate::mcp::protocol::parse_message;

        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => self.handle_request(req, inflight),
            Ok(IncomingMessage::Notification(ref notif)) => self.handle_notification(notif),
            Err(error) => {
                tracing::debug!(code = error.error.code, "Rejected malformed message");
                inflight.send(Outgoing::Error(error));
            }
        }
    }

    /// Handles an incoming request.
    fn handle_request(&mut self, req: JsonRpcRequest, inflight: &mut Inflight) {
        tracing::debug!(id = %req.id, method = %req.method, "Handling request");

        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "ping" => Ok(Self::handle_ping(&req)),
            "resources/list" => self.handle_resources_list(&req),
            "resources/read" => self.handle_resources_read(&req),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => match self.spawn_tools_call(&req, inflight) {
                Ok(()) => return,
                Err(error) => Err(error),
            },
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        };

        inflight.send(response);
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            self.state = ServerState::Running;
            tracing::info!("Client initialised, server running");
        } else {
            tracing::debug!(method = %notif.method, "Ignoring notification");
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::with_message(
                req.id.clone(),
                ErrorCode::InvalidRequest,
                "Server already initialised",
            ));
        }

        let params: InitializeParams = parse_params(req, "initialize")?;

        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested_version = %params.protocol_version,
                "Client connected"
            );
        }

        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Handles the resources/list request.
    fn handle_resources_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let result = json!({
            "resources": self.dispatcher.list_resources(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the resources/read request.
    fn handle_resources_read(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ReadResourceParams = parse_params(req, "resource read")?;

        self.dispatcher
            .read_resource(&params.uri)
            .map(|contents| JsonRpcResponse::success(req.id.clone(), contents))
            .map_err(|e| JsonRpcError::with_message(req.id.clone(), e.code, e.message))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let result = json!({
            "tools": self.dispatcher.list_tools(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Starts a tools/call request on its own task.
    ///
    /// The call runs inside a nested task so a panic is reported as an
    /// internal error for this request only.
    fn spawn_tools_call(
        &self,
        req: &JsonRpcRequest,
        inflight: &mut Inflight,
    ) -> Result<(), JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = parse_params(req, "tool call")?;
        let id = req.id.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        let tx = inflight.tx.clone();

        inflight.tasks.spawn(async move {
            let call = tokio::spawn(async move {
                dispatcher.call_tool(&params.name, &params.arguments).await
            });

            let outgoing = match call.await {
                Ok(outcome) => tool_call_response(id, outcome),
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "Tool call task failed");
                    Outgoing::Error(JsonRpcError::internal_error(id, "Internal error"))
                }
            };
            let _ = tx.send(outgoing);
        });

        Ok(())
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::with_message(
                id.clone(),
                ErrorCode::InvalidRequest,
                "Server not initialised",
            ));
        }
        Ok(())
    }
}

/// Deserialises required request params.
fn parse_params<T: serde::de::DeserializeOwned>(
    req: &JsonRpcRequest,
    what: &str,
) -> Result<T, JsonRpcError> {
    req.params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Invalid {what} params: {e}"))
        })?
        .ok_or_else(|| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Missing {what} params"))
        })
}

/// Maps a dispatcher outcome onto the JSON-RPC result or error channel.
fn tool_call_response(id: RequestId, outcome: ToolOutcome) -> Outgoing {
    let result = match outcome.into_result() {
        Ok(result) => result,
        Err(e) => return Outgoing::Error(JsonRpcError::with_message(id, e.code, e.message)),
    };

    match serde_json::to_value(&result) {
        Ok(value) => Outgoing::Response(JsonRpcResponse::success(id, value)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            Outgoing::Error(JsonRpcError::internal_error(
                id,
                "Internal error: failed to serialise result",
            ))
        }
    }
}

/// Resolves when the process is asked to terminate.
#[cfg(unix)]
async fn interrupted() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

/// Resolves when the process is asked to terminate.
#[cfg(windows)]
async fn interrupted() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::error::UpstreamError;
    use crate::nytimes::{ArticleSource, SearchQuery, UpstreamArticle};

    struct Empty;

    #[async_trait]
    impl ArticleSource for Empty {
        async fn search(&self, _: &SearchQuery) -> Result<Vec<UpstreamArticle>, UpstreamError> {
            Ok(Vec::new())
        }
    }

    fn server() -> McpServer<&'static [u8], Vec<u8>> {
        McpServer::new(
            Dispatcher::new(Arc::new(Empty)),
            MessageReader::new(b"".as_slice()),
            MessageWriter::new(Vec::new()),
        )
    }

    #[test]
    fn server_initial_state() {
        let server = server();
        assert_eq!(server.state(), ServerState::AwaitingInit);
    }

    #[test]
    fn capabilities_advertise_resources_and_tools() {
        let value = serde_json::to_value(ServerCapabilities::default()).unwrap();
        assert_eq!(value, json!({"resources": {}, "tools": {}}));
    }

    #[test]
    fn server_info_name() {
        assert_eq!(ServerInfo::default().name, "nytimes-article-search-server");
    }

    #[test]
    fn protocol_error_keeps_code() {
        let outgoing = tool_call_response(
            RequestId::Number(3),
            ToolOutcome::ProtocolError(crate::mcp::dispatcher::ProtocolError::new(
                ErrorCode::MethodNotFound,
                "Unknown tool: x",
            )),
        );
        let Outgoing::Error(error) = outgoing else {
            panic!("expected error");
        };
        assert_eq!(error.error.code, -32601);
        assert_eq!(error.id, Some(RequestId::Number(3)));
    }

    #[test]
    fn tool_error_is_successful_response() {
        let outgoing = tool_call_response(
            RequestId::Number(4),
            ToolOutcome::ToolError("NYTimes API error: boom".to_string()),
        );
        let Outgoing::Response(response) = outgoing else {
            panic!("expected response");
        };
        assert_eq!(response.result["isError"], true);
        assert_eq!(
            response.result["content"][0]["text"],
            "NYTimes API error: boom"
        );
    }

    /// Output whose every write fails.
    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
            _: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn output_failure_stops_server_with_input_open() {
        let (mut host, input) = tokio::io::duplex(1024);
        let mut server = McpServer::new(
            Dispatcher::new(Arc::new(Empty)),
            MessageReader::new(BufReader::new(input)),
            MessageWriter::new(BrokenPipe),
        );

        host.write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .await
            .unwrap();

        let err = tokio::time::timeout(Duration::from_secs(5), server.run())
            .await
            .expect("server kept running after output failed")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(server.state(), ServerState::ShuttingDown);
        drop(host);
    }

    #[tokio::test]
    async fn eof_shuts_down_cleanly() {
        let mut server = server();
        server.run().await.unwrap();
        assert_eq!(server.state(), ServerState::ShuttingDown);

        let err = server.run().await.unwrap_err();
        assert!(err.to_string().contains("already released"));
    }
}
