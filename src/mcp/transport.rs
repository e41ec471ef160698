//! JSON-RPC over stdio transport.
//!
//! Handles low-level communication with MCP server child processes:
//! - Writing JSON-RPC requests to stdin
//! - Reading JSON-RPC responses from stdout
//! - Line-delimited JSON protocol (one JSON object per line)
//!
//! A single mutex guards the whole write-then-read exchange, so two
//! outstanding requests can never interleave on the channel. Responses are
//! still correlated by `id` rather than assumed to be the next line read:
//! a cancelled call can leave its response in the pipe, and servers may
//! write non-protocol noise to stdout.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::Mutex;

use super::errors::McpError;
use super::types::{JsonRpcRequest, JsonRpcResponse};

// ─── Transport ───────────────────────────────────────────────────────────────

struct TransportIo {
    writer: ChildStdin,
    reader: BufReader<ChildStdout>,
}

/// Bi-directional JSON-RPC transport over a child process's stdio.
pub struct StdioTransport {
    server_name: String,
    /// Per-transport monotonic request ID counter.
    next_id: AtomicU64,
    /// `None` once the transport has been closed.
    io: Mutex<Option<TransportIo>>,
}

impl StdioTransport {
    /// Create a new transport from a child process's stdin/stdout.
    pub fn new(server_name: &str, stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            server_name: server_name.to_string(),
            next_id: AtomicU64::new(1),
            io: Mutex::new(Some(TransportIo {
                writer: stdin,
                reader: BufReader::new(stdout),
            })),
        }
    }

    fn transport_error(&self, reason: impl Into<String>) -> McpError {
        McpError::Transport {
            server: self.server_name.clone(),
            reason: reason.into(),
        }
    }

    /// Send a JSON-RPC request and wait for the matching response.
    ///
    /// Holds the channel for the full exchange: write one line of JSON,
    /// read lines until a response with a matching `id` arrives.
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let mut json = serde_json::to_string(&req)
            .map_err(|e| self.transport_error(format!("failed to serialize request: {e}")))?;
        json.push('\n');

        let mut guard = self.io.lock().await;
        let io = guard
            .as_mut()
            .ok_or_else(|| self.transport_error("transport closed"))?;

        io.writer
            .write_all(json.as_bytes())
            .await
            .map_err(|e| self.transport_error(format!("failed to write to stdin: {e}")))?;
        io.writer
            .flush()
            .await
            .map_err(|e| self.transport_error(format!("failed to flush stdin: {e}")))?;

        // Read response lines until we find one with matching id
        let mut line_buf = String::new();
        loop {
            line_buf.clear();
            let bytes_read = io
                .reader
                .read_line(&mut line_buf)
                .await
                .map_err(|e| self.transport_error(format!("failed to read from stdout: {e}")))?;

            if bytes_read == 0 {
                return Err(
                    self.transport_error("server stdout closed (process may have exited)")
                );
            }

            if let Some(resp) = match_response(&line_buf, id) {
                return Ok(resp);
            }
        }
    }

    /// Send a JSON-RPC notification (no response expected).
    pub async fn notify(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });

        let mut json = serde_json::to_string(&notification)
            .map_err(|e| self.transport_error(format!("failed to serialize notification: {e}")))?;
        json.push('\n');

        let mut guard = self.io.lock().await;
        let io = guard
            .as_mut()
            .ok_or_else(|| self.transport_error("transport closed"))?;

        io.writer
            .write_all(json.as_bytes())
            .await
            .map_err(|e| self.transport_error(format!("failed to write notification: {e}")))?;
        io.writer
            .flush()
            .await
            .map_err(|e| self.transport_error(format!("failed to flush notification: {e}")))?;

        Ok(())
    }

    /// Close the transport, dropping the server's stdin.
    ///
    /// Servers are expected to exit on stdin EOF. Waits for any in-flight
    /// exchange to finish first; subsequent calls fail with a transport
    /// error. Idempotent.
    pub async fn close(&self) {
        let mut guard = self.io.lock().await;
        let _ = guard.take();
    }
}

/// Parse one stdout line as the response to request `id`.
///
/// Returns `None` for blank lines, server log noise that isn't JSON-RPC,
/// and responses for other request IDs (stale responses from a cancelled
/// call are skipped this way).
fn match_response(line: &str, id: u64) -> Option<JsonRpcResponse> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonRpcResponse>(trimmed) {
        Ok(resp) if resp.id == id => Some(resp),
        _ => None,
    }
}

// ─── Response Helpers ────────────────────────────────────────────────────────

/// Extract the result from a JSON-RPC response, converting errors to `McpError`.
pub fn extract_result(response: JsonRpcResponse) -> Result<serde_json::Value, McpError> {
    if let Some(err) = response.error {
        return Err(McpError::Server {
            code: err.code,
            message: err.message,
            data: err.data,
        });
    }

    response.result.ok_or(McpError::Server {
        code: super::types::error_codes::INTERNAL_ERROR,
        message: "response missing both result and error".into(),
        data: None,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_response_matching_id() {
        let line = r#"{"jsonrpc": "2.0", "id": 7, "result": {"ok": true}}"#;
        let resp = match_response(line, 7).unwrap();
        assert_eq!(resp.id, 7);
        assert!(resp.result.is_some());
    }

    #[test]
    fn test_match_response_skips_other_ids() {
        // A stale response left behind by a cancelled request.
        let line = r#"{"jsonrpc": "2.0", "id": 6, "result": {}}"#;
        assert!(match_response(line, 7).is_none());
    }

    #[test]
    fn test_match_response_skips_noise() {
        assert!(match_response("", 1).is_none());
        assert!(match_response("   \n", 1).is_none());
        assert!(match_response("starting server on stdio...", 1).is_none());
        assert!(match_response(r#"{"not": "a response"}"#, 1).is_none());
    }

    #[test]
    fn test_extract_result_success() {
        let resp = JsonRpcResponse {
            jsonrpc: "2.0".into(),
            id: 1,
            result: Some(serde_json::json!({"text": "hello"})),
            error: None,
        };
        let result = extract_result(resp).unwrap();
        assert_eq!(result["text"], "hello");
    }

    #[test]
    fn test_extract_result_error() {
        let resp = JsonRpcResponse {
            jsonrpc: "2.0".into(),
            id: 1,
            result: None,
            error: Some(super::super::types::JsonRpcError {
                code: -32601,
                message: "Method not found".into(),
                data: None,
            }),
        };
        let err = extract_result(resp).unwrap_err();
        match err {
            McpError::Server { code, message, .. } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            _ => panic!("expected Server error"),
        }
    }

    #[test]
    fn test_extract_result_missing_both() {
        let resp = JsonRpcResponse {
            jsonrpc: "2.0".into(),
            id: 1,
            result: None,
            error: None,
        };
        let err = extract_result(resp).unwrap_err();
        assert!(matches!(err, McpError::Server { .. }));
    }
}
