//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes NYTimes article search as an MCP tool. The server
//! communicates over stdio transport using JSON-RPC 2.0 messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │  Transport  │───▶│   Server    │───▶│  Dispatcher  │     │
//! │   │   (stdio)   │    │ (lifecycle) │    │ (tools, res) │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! │                                                │             │
//! │                                                ▼             │
//! │                                      ┌──────────────────┐    │
//! │                                      │ Article Search   │    │
//! │                                      │ API client       │    │
//! │                                      └──────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod dispatcher;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use dispatcher::{Dispatcher, ProtocolError, ToolCallResult, ToolOutcome};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::{McpServer, ServerState, ShutdownHandle};
pub use tools::{list_tools, ToolDescriptor, SEARCH_ARTICLES};
pub use transport::{MessageReader, MessageWriter};
