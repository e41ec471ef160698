//! MCP client error types.

use thiserror::Error;

/// Errors that can occur while talking to MCP servers.
#[derive(Debug, Error)]
pub enum McpError {
    /// The server script has an extension we don't know how to run.
    /// Raised before any process is spawned.
    #[error("unsupported server script '{path}': must be a .py or .js file")]
    UnsupportedScript { path: String },

    /// A session with this name is already registered.
    #[error("a session named '{name}' is already registered")]
    DuplicateSession { name: String },

    /// The session name contains the namespace separator.
    ///
    /// Qualified tool names are `{server}_{tool}` and are split on the first
    /// underscore, so server names must not contain one.
    #[error("session name '{name}' contains the reserved character '_'")]
    ReservedCharacter { name: String },

    /// A server process failed to start.
    #[error("failed to spawn server '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },

    /// The initialization handshake failed.
    #[error("server '{name}' initialization failed: {reason}")]
    InitFailed { name: String, reason: String },

    /// The channel to the server is broken (process exited, stdio closed,
    /// malformed framing).
    #[error("transport error for server '{server}': {reason}")]
    Transport { server: String, reason: String },

    /// The server returned a JSON-RPC error response.
    #[error("server error [{code}]: {message}")]
    Server {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// A round trip to the server timed out.
    #[error("server '{server}' timed out after {timeout_ms}ms during {what}")]
    Timeout {
        server: String,
        what: String,
        timeout_ms: u64,
    },

    /// One or more sessions failed to close during registry teardown.
    #[error("session teardown failed: {}", failures.join("; "))]
    Teardown { failures: Vec<String> },
}
