//! Shared types for the MCP client.
//!
//! JSON-RPC 2.0 message types and the MCP protocol structures we consume:
//! the initialize handshake, `tools/list` descriptors, and `tools/call`
//! results.

use serde::{Deserialize, Serialize};

// ─── JSON-RPC 2.0 ───────────────────────────────────────────────────────────

/// JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request.
    pub fn new(id: u64, method: &str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response message (success or error).
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: u64,
    pub result: Option<serde_json::Value>,
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

// ─── MCP Protocol Types ──────────────────────────────────────────────────────

/// A tool advertised by a server via `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Payload of the `tools/list` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsListResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

/// MCP initialize response payload.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResult {
    #[serde(default)]
    pub capabilities: serde_json::Value,
    #[serde(default, alias = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(default, alias = "serverInfo")]
    pub server_info: Option<ServerInfo>,
}

/// Server info returned in the initialize response.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Flattened result of a `tools/call` invocation.
///
/// A backend-reported failure (`isError: true` or a JSON-RPC error object)
/// is still a valid outcome: it is carried back into the conversation so
/// the model can adapt, rather than raised to the caller.
#[derive(Debug, Clone)]
pub struct InvokeOutcome {
    /// Text content of the result, text blocks joined with newlines.
    pub content: String,
    /// Whether the server reported the invocation as failed.
    pub is_error: bool,
}

/// Parse the `tools/call` result payload (`{content: [...], isError}`)
/// into a flattened [`InvokeOutcome`].
///
/// Text blocks contribute their `text` field; any other block kind is
/// serialized verbatim so nothing the server said is dropped.
pub fn flatten_call_result(result: serde_json::Value) -> InvokeOutcome {
    let is_error = result
        .get("isError")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let mut parts: Vec<String> = Vec::new();
    match result.get("content") {
        Some(serde_json::Value::Array(blocks)) => {
            for block in blocks {
                match block.get("text").and_then(|t| t.as_str()) {
                    Some(text) => parts.push(text.to_string()),
                    None => parts.push(block.to_string()),
                }
            }
        }
        Some(serde_json::Value::String(s)) => parts.push(s.clone()),
        Some(other) => parts.push(other.to_string()),
        None => {}
    }

    InvokeOutcome {
        content: parts.join("\n"),
        is_error,
    }
}

// ─── Standard JSON-RPC Error Codes ───────────────────────────────────────────

/// Well-known JSON-RPC error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

// ─── Tests ───────────────────────────────────────────────────────────────────
