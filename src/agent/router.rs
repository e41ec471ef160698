//! Call router — resolves a qualified tool name back to its session.
//!
//! The model addresses tools by qualified name (`{server}_{tool}`); the
//! router splits the name, finds the owning session, and delegates the
//! invocation. Failures are surfaced to the caller (the orchestrator),
//! which reports them back into the conversation rather than crashing.

use crate::mcp::{InvokeOutcome, SessionRegistry, ToolSession};

use super::catalog::split_qualified;
use super::errors::AgentError;

/// Resolve a qualified name to `(session, local_tool_name)`.
///
/// Fails with [`AgentError::UnknownTool`] if the name has no separator or
/// the server half isn't registered.
pub fn resolve<'r, 'q>(
    registry: &'r SessionRegistry,
    qualified: &'q str,
) -> Result<(&'r dyn ToolSession, &'q str), AgentError> {
    let (server, tool) = split_qualified(qualified).ok_or_else(|| AgentError::UnknownTool {
        name: qualified.to_string(),
    })?;

    let session = registry.get(server).ok_or_else(|| AgentError::UnknownTool {
        name: qualified.to_string(),
    })?;

    Ok((session, tool))
}

/// Resolve and invoke a qualified tool call.
///
/// Backend-reported failures come back as `InvokeOutcome { is_error:
/// true }`; resolution failures and broken channels are `Err`.
pub async fn dispatch(
    registry: &SessionRegistry,
    qualified: &str,
    arguments: serde_json::Value,
) -> Result<InvokeOutcome, AgentError> {
    let (session, tool) = resolve(registry, qualified)?;

    tracing::debug!(tool = qualified, "dispatching tool call");
    let outcome = session.invoke(tool, arguments).await?;

    if outcome.is_error {
        tracing::warn!(tool = qualified, "tool reported an error result");
    }
    Ok(outcome)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::SessionRegistry;
    use crate::testutil::MockSession;

    fn two_server_registry() -> SessionRegistry {
        let mut registry = SessionRegistry::new();
        registry
            .register("alpha", Box::new(MockSession::new(&["ping"])))
            .unwrap();
        registry
            .register("beta", Box::new(MockSession::new(&["ping"])))
            .unwrap();
        registry
    }

    #[test]
    fn test_resolve_known_tool() {
        let registry = two_server_registry();
        let (_, tool) = resolve(&registry, "alpha_ping").unwrap();
        assert_eq!(tool, "ping");
    }

    #[test]
    fn test_resolve_no_separator() {
        let registry = two_server_registry();
        let err = resolve(&registry, "ping").unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool { name } if name == "ping"));
    }

    #[test]
    fn test_resolve_unknown_server() {
        let registry = two_server_registry();
        let err = resolve(&registry, "gamma_ping").unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_reaches_only_the_named_server() {
        let mut registry = SessionRegistry::new();
        let alpha = MockSession::new(&["ping"]);
        let beta = MockSession::new(&["ping"]);
        let alpha_log = alpha.calls.clone();
        let beta_log = beta.calls.clone();
        registry.register("alpha", Box::new(alpha)).unwrap();
        registry.register("beta", Box::new(beta)).unwrap();

        dispatch(&registry, "beta_ping", serde_json::json!({}))
            .await
            .unwrap();

        assert!(alpha_log.lock().unwrap().is_empty());
        let beta_calls = beta_log.lock().unwrap();
        assert_eq!(beta_calls.len(), 1);
        assert_eq!(beta_calls[0].0, "ping");
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_backend_error_as_outcome() {
        let mut registry = SessionRegistry::new();
        let mut session = MockSession::new(&["crashy"]);
        session.invoke_error_message = Some("disk full".into());
        registry.register("files", Box::new(session)).unwrap();

        let outcome = dispatch(&registry, "files_crashy", serde_json::json!({}))
            .await
            .unwrap();
        assert!(outcome.is_error);
        assert!(outcome.content.contains("disk full"));
    }

    #[tokio::test]
    async fn test_dispatch_transport_failure_is_err() {
        let mut registry = SessionRegistry::new();
        let mut session = MockSession::new(&["ping"]);
        session.fail_invoke = true;
        registry.register("dead", Box::new(session)).unwrap();

        let err = dispatch(&registry, "dead_ping", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Mcp(_)));
    }
}
