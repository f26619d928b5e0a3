//! The tool server seam.

use async_trait::async_trait;
use serde_json::{Map, Value};

use adopilot_core::types::ToolDescriptor;

use crate::error::McpError;
use crate::protocol::CallToolResult;

/// A remote server that advertises and executes tools.
///
/// Implemented by [`McpClient`](crate::McpClient); tests substitute
/// in-memory servers.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Every tool the server advertises, in the server's order.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError>;

    /// Invoke `name` with decoded `arguments`.
    ///
    /// A tool that ran but reported failure comes back as `Ok` with
    /// `is_error` set; `Err` means the call itself did not complete.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, McpError>;
}
