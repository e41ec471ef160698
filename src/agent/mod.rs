//! Agent — catalog building, call routing, and the conversation loop.

pub mod catalog;
pub mod errors;
pub mod orchestrator;
pub mod router;

// Re-exports for convenience
pub use catalog::{build_catalog, qualify, split_qualified, CatalogEntry};
pub use errors::AgentError;
pub use orchestrator::{Orchestrator, DEFAULT_MAX_TOOL_ROUNDS};
