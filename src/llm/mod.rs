//! Model API — Anthropic Messages client and its wire types.

pub mod client;
pub mod errors;
pub mod types;

// Re-exports for convenience
pub use client::{AnthropicClient, ModelApi};
pub use errors::LlmError;
pub use types::{ContentBlock, Message, MessagesRequest, MessagesResponse, Role, ToolSpec};
