//! Agent error types.

use thiserror::Error;

use crate::llm::LlmError;
use crate::mcp::McpError;

/// Errors raised by the catalog, router, and orchestrator.
///
/// Failures the model can act on (unknown tool, backend down during one
/// call) are folded into the conversation by the orchestrator; the
/// variants here surface only when the client itself cannot proceed.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Every connected server failed to list its tools.
    #[error("no server could list its tools: {}", failures.join("; "))]
    CatalogUnavailable { failures: Vec<String> },

    /// The model requested a tool name that doesn't resolve to a session.
    #[error("unknown tool: '{name}'")]
    UnknownTool { name: String },

    /// A server-side failure during dispatch.
    #[error("tool execution failed: {0}")]
    Mcp(#[from] McpError),

    /// The model API call failed.
    #[error("model request failed: {0}")]
    Model(#[from] LlmError),

    /// The model kept requesting tools past the configured round bound.
    #[error("conversation exceeded {rounds} tool-call rounds without converging")]
    DepthExceeded { rounds: u32 },
}
