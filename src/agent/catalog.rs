//! Capability catalog — one namespaced tool list across all sessions.
//!
//! Each server's tools are prefixed with the server name so two servers
//! can expose the same local tool name without colliding. The catalog is
//! rebuilt per query from whatever sessions are currently registered.

use crate::llm::ToolSpec;
use crate::mcp::{SessionRegistry, NAME_SEPARATOR};

use super::errors::AgentError;

// ─── Qualified names ─────────────────────────────────────────────────────────

/// Join a server name and a local tool name into a qualified name.
pub fn qualify(server: &str, tool: &str) -> String {
    format!("{server}{NAME_SEPARATOR}{tool}")
}

/// Split a qualified name back into `(server, local_tool)`.
///
/// Splits on the *first* separator only. Server names cannot contain the
/// separator (enforced at registration), so this inverts [`qualify`] even
/// when the local tool name itself contains separators.
pub fn split_qualified(qualified: &str) -> Option<(&str, &str)> {
    qualified.split_once(NAME_SEPARATOR)
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// One namespaced tool descriptor in the aggregated catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// `{server}_{tool}` — unique across the catalog.
    pub qualified_name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    /// The session that owns this tool.
    pub server: String,
}

impl CatalogEntry {
    /// Convert to the shape sent in the model request's `tools` array.
    pub fn to_tool_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.qualified_name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// Build the catalog from all registered sessions, in registration order,
/// preserving each server's own tool order.
///
/// Best-effort: a session whose listing fails is logged and omitted, so a
/// single down server never blocks conversation with the others. Fails
/// with [`AgentError::CatalogUnavailable`] only when every session's
/// listing failed.
pub async fn build_catalog(registry: &SessionRegistry) -> Result<Vec<CatalogEntry>, AgentError> {
    let mut entries: Vec<CatalogEntry> = Vec::new();
    let mut failures: Vec<String> = Vec::new();

    for (name, session) in registry.iter() {
        match session.list_tools().await {
            Ok(tools) => {
                for tool in tools {
                    entries.push(CatalogEntry {
                        qualified_name: qualify(name, &tool.name),
                        description: tool.description,
                        input_schema: tool.input_schema,
                        server: name.to_string(),
                    });
                }
            }
            Err(e) => {
                tracing::warn!(server = name, error = %e, "omitting server from catalog");
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    if !registry.is_empty() && failures.len() == registry.len() {
        return Err(AgentError::CatalogUnavailable { failures });
    }

    Ok(entries)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
