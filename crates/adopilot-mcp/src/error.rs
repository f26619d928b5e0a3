//! Tool server failures.

use thiserror::Error;

/// Anything that can go wrong talking to a tool server.
#[derive(Debug, Error)]
pub enum McpError {
    /// The server process could not be started.
    #[error("failed to start tool server '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the server failed.
    #[error("tool server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed its output before answering.
    #[error("tool server closed the connection")]
    Closed,

    /// The server sent something that is not valid JSON-RPC.
    #[error("invalid message from tool server: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a JSON-RPC error object.
    #[error("tool server error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// No answer arrived within the request deadline.
    #[error("no response to '{method}' within {secs}s")]
    Timeout { method: String, secs: u64 },
}
