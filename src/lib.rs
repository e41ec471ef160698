//! mcpchat — a multi-server MCP chat client.
//!
//! Connects to several MCP tool servers as subprocesses (JSON-RPC over
//! stdio), aggregates their tools into one namespaced catalog, and drives
//! a tool-use conversation with the Anthropic Messages API: the model's
//! tool requests are routed back to the owning server and the results fed
//! into the next turn, until the model answers without requesting tools.

pub mod agent;
pub mod chat;
pub mod config;
pub mod llm;
pub mod mcp;

#[cfg(test)]
pub(crate) mod testutil;
