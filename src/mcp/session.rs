//! One live connection to an MCP server subprocess.
//!
//! A [`Session`] owns the child process and its stdio transport. It is
//! created by [`Session::connect`], which infers the runtime from the
//! script's extension, spawns the process, and performs the MCP
//! initialization handshake. The [`ToolSession`] trait is the seam the
//! registry, catalog, and router work against.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::errors::McpError;
use super::transport::{extract_result, StdioTransport};
use super::types::{
    flatten_call_result, InitializeResult, InvokeOutcome, ToolDescriptor, ToolsListResult,
};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Timeout for the initialize handshake.
const INIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a `tools/list` round trip.
const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a `tools/call` round trip.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for graceful shutdown before force-killing.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Protocol version sent in the initialize request.
const PROTOCOL_VERSION: &str = "2024-11-05";

// ─── ScriptKind ──────────────────────────────────────────────────────────────

/// The closed set of server script runtimes we know how to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Python,
    Node,
}

impl ScriptKind {
    /// Infer the runtime from a script path's extension.
    ///
    /// Anything other than `.py` or `.js` is a configuration error,
    /// reported before any process is spawned.
    pub fn infer(path: &Path) -> Result<Self, McpError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Ok(ScriptKind::Python),
            Some("js") => Ok(ScriptKind::Node),
            _ => Err(McpError::UnsupportedScript {
                path: path.display().to_string(),
            }),
        }
    }

    /// The interpreter command for this script kind.
    pub fn command(&self) -> &'static str {
        match self {
            ScriptKind::Python => "python3",
            ScriptKind::Node => "node",
        }
    }
}

// ─── ToolSession ─────────────────────────────────────────────────────────────

/// Capability discovery and invocation against one connected server.
///
/// [`Session`] is the production implementation; tests substitute mocks.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// List the tools this server advertises, in the server's own order.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError>;

    /// Invoke a tool by its local (unqualified) name.
    ///
    /// Backend-reported failures come back as `InvokeOutcome { is_error:
    /// true }`; only a broken channel is an `Err`.
    async fn invoke(
        &self,
        tool: &str,
        arguments: serde_json::Value,
    ) -> Result<InvokeOutcome, McpError>;

    /// Release the channel and the server process. Idempotent.
    async fn close(&self) -> Result<(), McpError>;
}

impl std::fmt::Debug for dyn ToolSession + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ToolSession")
    }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// A running MCP server process with its JSON-RPC transport.
pub struct Session {
    name: String,
    transport: StdioTransport,
    process: Mutex<Child>,
}

impl Session {
    /// Launch a server script and perform the MCP initialization handshake.
    ///
    /// On handshake failure the child is killed and any stderr output is
    /// folded into the error for diagnosis.
    pub async fn connect(name: &str, script_path: &Path) -> Result<Session, McpError> {
        let kind = ScriptKind::infer(script_path)?;

        let mut cmd = Command::new(kind.command());
        cmd.arg(script_path);
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| McpError::SpawnFailed {
            name: name.to_string(),
            reason: format!("{e}"),
        })?;

        let stdin = child.stdin.take().ok_or(McpError::SpawnFailed {
            name: name.to_string(),
            reason: "failed to capture stdin".into(),
        })?;
        let stdout = child.stdout.take().ok_or(McpError::SpawnFailed {
            name: name.to_string(),
            reason: "failed to capture stdout".into(),
        })?;
        let stderr_handle = child.stderr.take();

        let transport = StdioTransport::new(name, stdin, stdout);

        match tokio::time::timeout(INIT_TIMEOUT, initialize(&transport)).await {
            Ok(Ok(init)) => {
                tracing::info!(
                    server = name,
                    server_info = ?init.server_info,
                    "session initialized"
                );
            }
            Ok(Err(e)) => {
                let stderr_ctx = read_stderr_on_failure(stderr_handle).await;
                let _ = child.kill().await;
                return Err(McpError::InitFailed {
                    name: name.to_string(),
                    reason: format!("{e}{}", stderr_suffix(&stderr_ctx)),
                });
            }
            Err(_) => {
                let stderr_ctx = read_stderr_on_failure(stderr_handle).await;
                let _ = child.kill().await;
                return Err(McpError::InitFailed {
                    name: name.to_string(),
                    reason: format!(
                        "initialization timed out after {}s{}",
                        INIT_TIMEOUT.as_secs(),
                        stderr_suffix(&stderr_ctx)
                    ),
                });
            }
        }

        Ok(Session {
            name: name.to_string(),
            transport,
            process: Mutex::new(child),
        })
    }

    /// The server name this session was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ToolSession for Session {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let response = tokio::time::timeout(LIST_TIMEOUT, self.transport.request("tools/list", None))
            .await
            .map_err(|_| McpError::Timeout {
                server: self.name.clone(),
                what: "tools/list".into(),
                timeout_ms: LIST_TIMEOUT.as_millis() as u64,
            })??;

        let result = extract_result(response)?;
        let listing: ToolsListResult =
            serde_json::from_value(result).map_err(|e| McpError::Transport {
                server: self.name.clone(),
                reason: format!("failed to parse tools/list response: {e}"),
            })?;

        Ok(listing.tools)
    }

    async fn invoke(
        &self,
        tool: &str,
        arguments: serde_json::Value,
    ) -> Result<InvokeOutcome, McpError> {
        let params = serde_json::json!({
            "name": tool,
            "arguments": arguments,
        });

        let response = tokio::time::timeout(
            CALL_TIMEOUT,
            self.transport.request("tools/call", Some(params)),
        )
        .await
        .map_err(|_| McpError::Timeout {
            server: self.name.clone(),
            what: format!("tools/call '{tool}'"),
            timeout_ms: CALL_TIMEOUT.as_millis() as u64,
        })??;

        // A JSON-RPC error object is a backend-reported failure, not a
        // broken channel — fold it into the outcome so the conversation
        // can carry it back to the model.
        match extract_result(response) {
            Ok(result) => Ok(flatten_call_result(result)),
            Err(McpError::Server { code, message, .. }) => Ok(InvokeOutcome {
                content: format!("[{code}] {message}"),
                is_error: true,
            }),
            Err(e) => Err(e),
        }
    }

    async fn close(&self) -> Result<(), McpError> {
        // Dropping stdin signals the server to exit.
        self.transport.close().await;

        let mut process = self.process.lock().await;
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, process.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(server = %self.name, ?status, "server exited");
                Ok(())
            }
            _ => {
                process.kill().await.map_err(|e| McpError::Transport {
                    server: self.name.clone(),
                    reason: format!("failed to kill server process: {e}"),
                })
            }
        }
    }
}

// ─── Handshake ───────────────────────────────────────────────────────────────

/// Perform the MCP initialization handshake: `initialize` request followed
/// by the `notifications/initialized` notification.
async fn initialize(transport: &StdioTransport) -> Result<InitializeResult, McpError> {
    let params = serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    });

    let response = transport.request("initialize", Some(params)).await?;
    let result = extract_result(response)?;

    let init: InitializeResult = serde_json::from_value(result).unwrap_or(InitializeResult {
        capabilities: serde_json::Value::Null,
        protocol_version: None,
        server_info: None,
    });

    transport.notify("notifications/initialized", None).await?;

    Ok(init)
}

/// Read any available stderr output from a failed server process.
///
/// Uses a short timeout to avoid blocking if stderr is empty or the process
/// is still writing. Truncates to 2000 chars to keep error messages readable.
async fn read_stderr_on_failure(stderr_handle: Option<tokio::process::ChildStderr>) -> String {
    use tokio::io::AsyncReadExt;

    let Some(mut stderr) = stderr_handle else {
        return String::new();
    };

    let mut buf = String::new();
    match tokio::time::timeout(Duration::from_millis(500), stderr.read_to_string(&mut buf)).await {
        Ok(Ok(_)) => {
            if buf.len() > 2000 {
                buf.truncate(2000);
                buf.push_str("...(truncated)");
            }
            buf
        }
        _ => String::new(),
    }
}

/// Format a stderr suffix for error messages (empty string if no stderr).
fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(" | stderr: {}", stderr.trim())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_kind_python() {
        let kind = ScriptKind::infer(Path::new("servers/weather.py")).unwrap();
        assert_eq!(kind, ScriptKind::Python);
        assert_eq!(kind.command(), "python3");
    }

    #[test]
    fn test_script_kind_node() {
        let kind = ScriptKind::infer(Path::new("servers/github.js")).unwrap();
        assert_eq!(kind, ScriptKind::Node);
        assert_eq!(kind.command(), "node");
    }

    #[test]
    fn test_script_kind_rejects_unknown_extension() {
        let err = ScriptKind::infer(Path::new("servers/weather.sh")).unwrap_err();
        assert!(matches!(err, McpError::UnsupportedScript { .. }));
    }

    #[test]
    fn test_script_kind_rejects_no_extension() {
        let err = ScriptKind::infer(Path::new("servers/weather")).unwrap_err();
        assert!(matches!(err, McpError::UnsupportedScript { .. }));
    }

    #[test]
    fn test_stderr_suffix() {
        assert_eq!(stderr_suffix(""), "");
        assert_eq!(
            stderr_suffix("ModuleNotFoundError: mcp\n"),
            " | stderr: ModuleNotFoundError: mcp"
        );
    }
}
