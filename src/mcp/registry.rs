//! Session registry — the named collection of connected servers.
//!
//! Sessions are kept in registration order, which fixes the catalog order
//! seen by the model. The registry is the sole owner of its sessions:
//! they are created by [`SessionRegistry::connect`] and released by
//! [`SessionRegistry::close_all`].

use std::path::Path;

use super::errors::McpError;
use super::session::{Session, ToolSession};

/// The character joining a server name and a local tool name into a
/// qualified tool name (`{server}_{tool}`).
///
/// Qualified names are split back on the first occurrence, so the
/// separator is reserved: server names containing it are rejected at
/// registration time. Local tool names may contain it freely.
pub const NAME_SEPARATOR: char = '_';

/// Owns the sessions for all connected servers, addressable by name.
#[derive(Default)]
pub struct SessionRegistry {
    /// Registration order is preserved; names are unique.
    sessions: Vec<(String, Box<dyn ToolSession>)>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }

    /// Connect to a server script and register the session under `name`.
    ///
    /// Name validation happens before anything is spawned; on connect
    /// failure nothing is registered.
    pub async fn connect(&mut self, name: &str, script_path: &Path) -> Result<(), McpError> {
        self.check_name(name)?;
        let session = Session::connect(name, script_path).await?;
        self.sessions.push((name.to_string(), Box::new(session)));
        Ok(())
    }

    /// Register an already-built session under `name`.
    ///
    /// Same name rules as [`connect`](Self::connect). Lets embedders (and
    /// tests) supply their own [`ToolSession`] implementations.
    pub fn register(
        &mut self,
        name: &str,
        session: Box<dyn ToolSession>,
    ) -> Result<(), McpError> {
        self.check_name(name)?;
        self.sessions.push((name.to_string(), session));
        Ok(())
    }

    fn check_name(&self, name: &str) -> Result<(), McpError> {
        if name.contains(NAME_SEPARATOR) {
            return Err(McpError::ReservedCharacter {
                name: name.to_string(),
            });
        }
        if self.sessions.iter().any(|(n, _)| n == name) {
            return Err(McpError::DuplicateSession {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Look up a session by name.
    pub fn get(&self, name: &str) -> Option<&dyn ToolSession> {
        self.sessions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_ref())
    }

    /// Iterate sessions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ToolSession)> {
        self.sessions.iter().map(|(n, s)| (n.as_str(), s.as_ref()))
    }

    /// Registered session names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.sessions.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether any sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session, in reverse registration order.
    ///
    /// Best-effort: a failing close never stops the teardown of the
    /// remaining sessions. Individual failures are aggregated into a
    /// single [`McpError::Teardown`]. The registry is empty afterwards.
    pub async fn close_all(&mut self) -> Result<(), McpError> {
        let mut failures: Vec<String> = Vec::new();

        while let Some((name, session)) = self.sessions.pop() {
            if let Err(e) = session.close().await {
                tracing::warn!(server = %name, error = %e, "failed to close session");
                failures.push(format!("{name}: {e}"));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(McpError::Teardown { failures })
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
