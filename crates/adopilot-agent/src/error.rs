//! Failures that abort a run.
//!
//! None of these are recovered inside the agent. The caller decides whether
//! one failed prompt ends the batch.

use std::fmt;

use thiserror::Error;

use adopilot_mcp::McpError;
use adopilot_providers::ProviderError;

/// Which of the two completions of a run failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionPhase {
    /// The call that offers the tools.
    First,
    /// The call that reads the tool results and answers.
    Second,
}

impl fmt::Display for CompletionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionPhase::First => f.write_str("first"),
            CompletionPhase::Second => f.write_str("second"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    /// The tool catalog could not be obtained.
    #[error("tool discovery failed: {0}")]
    Discovery(#[source] McpError),

    /// The model sent arguments that are not a JSON object.
    #[error("invalid arguments for tool call '{call_id}' ({tool}): {source}")]
    ArgumentDecode {
        tool: String,
        call_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The tool server failed, or reported the tool call as an error.
    #[error("tool '{tool}' failed: {message}")]
    ToolExecution {
        tool: String,
        message: String,
        #[source]
        source: Option<McpError>,
    },

    /// The completion API failed.
    #[error("{phase} completion failed: {source}")]
    Completion {
        phase: CompletionPhase,
        #[source]
        source: ProviderError,
    },
}

impl AgentError {
    /// Short machine-friendly name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Discovery(_) => "discovery",
            AgentError::ArgumentDecode { .. } => "argument_decode",
            AgentError::ToolExecution { .. } => "tool_execution",
            AgentError::Completion { .. } => "completion",
        }
    }
}
