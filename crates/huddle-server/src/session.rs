//! Session registry: the binding between one live connection and one
//! authenticated identity.
//!
//! A session is registered at WebSocket accept, bound by the first valid
//! `authenticate` command, and deregistered at teardown. The registry is the
//! sole authority consulted before any mutating command.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use huddle_shared::{SessionId, UserId};

/// Identity bound to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: UserId,
    pub display_name: String,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Option<SessionUser>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted, not-yet-authenticated connection.
    pub async fn register(&self, session_id: SessionId) {
        self.sessions.write().await.insert(session_id, None);
        debug!(session = %session_id, "session registered");
    }

    /// Bind an identity to a session. Returns `false` if the session is
    /// unknown or already bound; a live binding is never replaced.
    pub async fn bind(&self, session_id: SessionId, user: SessionUser) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session_id) {
            Some(slot @ None) => {
                debug!(session = %session_id, user = %user.user_id, "session bound");
                *slot = Some(user);
                true
            }
            Some(Some(_)) => false,
            None => false,
        }
    }

    /// The identity bound to a session, if any. Mutating commands gate on
    /// this returning `Some`.
    pub async fn identity(&self, session_id: SessionId) -> Option<SessionUser> {
        self.sessions.read().await.get(&session_id).cloned().flatten()
    }

    /// Remove a session, returning the identity that was bound to it.
    pub async fn deregister(&self, session_id: SessionId) -> Option<SessionUser> {
        let removed = self.sessions.write().await.remove(&session_id).flatten();
        debug!(session = %session_id, was_bound = removed.is_some(), "session deregistered");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> SessionUser {
        SessionUser {
            user_id: UserId::new(),
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_unbound_session_has_no_identity() {
        let registry = SessionRegistry::new();
        let session = SessionId::new();

        registry.register(session).await;
        assert!(registry.identity(session).await.is_none());
    }

    #[tokio::test]
    async fn test_bind_once() {
        let registry = SessionRegistry::new();
        let session = SessionId::new();
        registry.register(session).await;

        assert!(registry.bind(session, user("Ada")).await);
        // A live binding is never replaced.
        assert!(!registry.bind(session, user("Eve")).await);
        assert_eq!(registry.identity(session).await.unwrap().display_name, "Ada");
    }

    #[tokio::test]
    async fn test_bind_unknown_session_fails() {
        let registry = SessionRegistry::new();
        assert!(!registry.bind(SessionId::new(), user("Ada")).await);
    }

    #[tokio::test]
    async fn test_deregister_returns_binding() {
        let registry = SessionRegistry::new();
        let session = SessionId::new();
        registry.register(session).await;
        registry.bind(session, user("Ada")).await;

        let removed = registry.deregister(session).await;
        assert_eq!(removed.unwrap().display_name, "Ada");
        assert!(registry.identity(session).await.is_none());
    }
}
