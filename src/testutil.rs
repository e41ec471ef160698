//! Shared test doubles: a scriptable session and a scripted model.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::llm::{ContentBlock, LlmError, MessagesRequest, MessagesResponse, ModelApi};
use crate::mcp::{InvokeOutcome, McpError, ToolDescriptor, ToolSession};

// ─── MockSession ─────────────────────────────────────────────────────────────

/// A `ToolSession` double with configurable failure modes and a call log.
pub struct MockSession {
    pub tools: Vec<ToolDescriptor>,
    /// `list_tools` fails with a transport error.
    pub fail_listing: bool,
    /// `invoke` fails with a transport error.
    pub fail_invoke: bool,
    /// `invoke` succeeds but the backend reports this error message.
    pub invoke_error_message: Option<String>,
    /// `close` fails with a transport error.
    pub fail_close: bool,
    /// Record `(name, order_log)` on close, for teardown-order tests.
    pub close_log: Option<(String, Arc<Mutex<Vec<String>>>)>,
    /// Every `(tool, arguments)` pair invoked on this session.
    pub calls: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl MockSession {
    /// A session advertising the given local tool names.
    pub fn new(tool_names: &[&str]) -> Self {
        Self {
            tools: tool_names
                .iter()
                .map(|name| ToolDescriptor {
                    name: name.to_string(),
                    description: format!("mock tool {name}"),
                    input_schema: serde_json::json!({"type": "object"}),
                })
                .collect(),
            fail_listing: false,
            fail_invoke: false,
            invoke_error_message: None,
            fail_close: false,
            close_log: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn transport_error(&self, reason: &str) -> McpError {
        McpError::Transport {
            server: "mock".into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ToolSession for MockSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        if self.fail_listing {
            return Err(self.transport_error("listing failed"));
        }
        Ok(self.tools.clone())
    }

    async fn invoke(
        &self,
        tool: &str,
        arguments: serde_json::Value,
    ) -> Result<InvokeOutcome, McpError> {
        if self.fail_invoke {
            return Err(self.transport_error("invoke failed"));
        }
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), arguments));

        if let Some(message) = &self.invoke_error_message {
            return Ok(InvokeOutcome {
                content: message.clone(),
                is_error: true,
            });
        }
        Ok(InvokeOutcome {
            content: format!("{tool}: ok"),
            is_error: false,
        })
    }

    async fn close(&self) -> Result<(), McpError> {
        if let Some((name, log)) = &self.close_log {
            log.lock().unwrap().push(name.clone());
        }
        if self.fail_close {
            return Err(self.transport_error("close failed"));
        }
        Ok(())
    }
}

// ─── ScriptedModel ───────────────────────────────────────────────────────────

/// A `ModelApi` double that replays a fixed sequence of responses and
/// records every request it receives.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<MessagesResponse>>,
    /// Returned once the script runs out; `None` means error instead.
    repeat: Option<MessagesResponse>,
    pub requests: Mutex<Vec<MessagesRequest>>,
}

impl ScriptedModel {
    /// Replay `responses` in order; error if called again afterwards.
    pub fn new(responses: Vec<MessagesResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Return the same response on every call — a model that never converges.
    pub fn repeating(response: MessagesResponse) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ModelApi for ScriptedModel {
    async fn create_message(&self, request: MessagesRequest) -> Result<MessagesResponse, LlmError> {
        self.requests.lock().unwrap().push(request);

        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return Ok(response);
        }
        if let Some(repeat) = &self.repeat {
            return Ok(repeat.clone());
        }
        Err(LlmError::Api {
            status: 500,
            body: "scripted model ran out of responses".into(),
        })
    }
}

// ─── Response builders ───────────────────────────────────────────────────────

/// A response consisting of a single text block.
pub fn text_response(text: &str) -> MessagesResponse {
    MessagesResponse {
        content: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
        stop_reason: Some("end_turn".into()),
    }
}

/// A response requesting one tool invocation.
pub fn tool_use_response(id: &str, name: &str, input: serde_json::Value) -> MessagesResponse {
    MessagesResponse {
        content: vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }],
        stop_reason: Some("tool_use".into()),
    }
}
