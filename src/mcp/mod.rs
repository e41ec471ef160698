//! MCP client — JSON-RPC over stdio sessions for MCP tool servers.
//!
//! This module handles:
//! - Spawning server subprocesses from script paths (`.py` / `.js`)
//! - JSON-RPC 2.0 communication over process stdio, correlated by request id
//! - The initialize handshake, `tools/list`, and `tools/call`
//! - The session registry with best-effort aggregate teardown

pub mod errors;
pub mod registry;
pub mod session;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use errors::McpError;
pub use registry::{SessionRegistry, NAME_SEPARATOR};
pub use session::{ScriptKind, Session, ToolSession};
pub use types::{InvokeOutcome, ToolDescriptor};
