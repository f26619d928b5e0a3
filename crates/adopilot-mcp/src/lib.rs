//! Model Context Protocol client for Adopilot.
//!
//! The agent discovers and invokes remote tools through the [`ToolServer`]
//! trait. [`McpClient`] implements it by speaking newline-delimited
//! JSON-RPC 2.0 to a tool server process over its stdin/stdout.
//!
//! - [`protocol`]: JSON-RPC envelopes and MCP result types
//! - [`client`]: the stdio client and its handshake
//! - [`traits`]: the `ToolServer` seam the agent depends on

pub mod client;
pub mod error;
pub mod protocol;
pub mod traits;

pub use client::McpClient;
pub use error::McpError;
pub use protocol::{CallToolResult, ServerInfo};
pub use traits::ToolServer;
