//! Conversation orchestrator — the turn loop against the model.
//!
//! One `process_query` call seeds the history with the user's text, builds
//! the catalog, and loops: send (history, tools) to the model, execute any
//! requested tool calls in block order, fold the results back into the
//! history, and continue until the model answers without requesting tools.
//!
//! Failures the model can act on (unknown tool name, a server down during
//! one call, a backend-reported error) become failure tool results in the
//! history so the model can self-correct. A hard round bound prevents a
//! non-converging model from looping forever.

use crate::llm::{ContentBlock, Message, MessagesRequest, ModelApi, ToolSpec};
use crate::mcp::SessionRegistry;

use super::catalog::build_catalog;
use super::errors::AgentError;
use super::router;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Default maximum number of tool-call rounds per query.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 8;

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Drives multi-turn conversations over a session registry and a model.
///
/// Holds no conversation state between queries: each `process_query` owns
/// its own history.
pub struct Orchestrator<'a> {
    registry: &'a SessionRegistry,
    model: &'a dyn ModelApi,
    model_name: String,
    max_tokens: u32,
    max_tool_rounds: u32,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator over a registry and a model.
    pub fn new(
        registry: &'a SessionRegistry,
        model: &'a dyn ModelApi,
        model_name: &str,
        max_tokens: u32,
    ) -> Self {
        Self {
            registry,
            model,
            model_name: model_name.to_string(),
            max_tokens,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Set the maximum number of tool-call rounds per query.
    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Process one user query to completion.
    ///
    /// Returns the accumulated output: the model's text blocks plus a
    /// trace line for every tool call, in the order they happened.
    pub async fn process_query(&self, user_text: &str) -> Result<String, AgentError> {
        let catalog = build_catalog(self.registry).await?;
        let tools: Vec<ToolSpec> = catalog.iter().map(|e| e.to_tool_spec()).collect();

        tracing::info!(
            tool_count = tools.len(),
            server_count = self.registry.len(),
            "processing query"
        );

        let mut history: Vec<Message> = vec![Message::user_text(user_text)];
        let mut final_text: Vec<String> = Vec::new();
        let mut rounds: u32 = 0;

        loop {
            let response = self
                .model
                .create_message(MessagesRequest {
                    model: self.model_name.clone(),
                    max_tokens: self.max_tokens,
                    messages: history.clone(),
                    tools: tools.clone(),
                })
                .await?;

            let mut assistant_blocks: Vec<ContentBlock> = Vec::new();
            let mut tool_results: Vec<ContentBlock> = Vec::new();

            // Blocks are processed strictly in the order the model returned
            // them; tool calls run sequentially, never concurrently.
            for block in response.content {
                match block {
                    ContentBlock::Text { text } => {
                        final_text.push(text.clone());
                        assistant_blocks.push(ContentBlock::Text { text });
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        final_text.push(format!("[Calling tool {name} with args {input}]"));

                        let (content, is_error) =
                            match router::dispatch(self.registry, &name, input.clone()).await {
                                Ok(outcome) => (outcome.content, outcome.is_error),
                                Err(e @ AgentError::UnknownTool { .. }) => {
                                    tracing::warn!(tool = %name, "model requested unknown tool");
                                    (e.to_string(), true)
                                }
                                Err(AgentError::Mcp(e)) => {
                                    tracing::warn!(tool = %name, error = %e, "tool call failed");
                                    (e.to_string(), true)
                                }
                                Err(e) => return Err(e),
                            };

                        tool_results.push(ContentBlock::ToolResult {
                            tool_use_id: id.clone(),
                            content,
                            is_error,
                        });
                        assistant_blocks.push(ContentBlock::ToolUse { id, name, input });
                    }
                    ContentBlock::ToolResult { .. } | ContentBlock::Unknown => {
                        // Not expected in assistant output; ignore rather
                        // than fail on newer block kinds.
                        tracing::debug!("ignoring unrecognized content block");
                    }
                }
            }

            if tool_results.is_empty() {
                return Ok(final_text.join("\n"));
            }

            rounds += 1;
            if rounds >= self.max_tool_rounds {
                tracing::warn!(rounds, "tool round bound reached");
                return Err(AgentError::DepthExceeded { rounds });
            }

            // Every tool result lands in history before the next model call.
            history.push(Message::assistant(assistant_blocks));
            history.push(Message::tool_results(tool_results));
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
