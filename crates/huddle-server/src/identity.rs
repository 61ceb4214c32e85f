//! Identity resolution boundary.
//!
//! The chat core never validates credentials itself: it hands the presented
//! bearer token to an [`IdentityProvider`] and either gets an identity back
//! or drops the authenticate command. Production deployments put their auth
//! service behind this trait; development and tests use the in-memory
//! [`StaticTokenDirectory`].

use std::collections::HashMap;
use std::sync::RwLock;

use huddle_shared::UserId;

/// Identity and display fields resolved from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Resolves a bearer token to a user identity, or fails.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Option<UserIdentity>;
}

/// In-memory token directory. Each known token maps to a fixed identity
/// assigned when the token is registered.
#[derive(Default)]
pub struct StaticTokenDirectory {
    tokens: RwLock<HashMap<String, UserIdentity>>,
}

impl StaticTokenDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from `(token, display name)` pairs, assigning a
    /// fresh user id to each.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let directory = Self::new();
        for (token, name) in pairs {
            directory.insert(token, UserId::new(), name, None);
        }
        directory
    }

    /// Register (or replace) a token binding.
    pub fn insert(&self, token: &str, user_id: UserId, display_name: &str, avatar_url: Option<&str>) {
        let identity = UserIdentity {
            user_id,
            display_name: display_name.to_string(),
            avatar_url: avatar_url.map(str::to_string),
        };
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.to_string(), identity);
    }
}

impl IdentityProvider for StaticTokenDirectory {
    fn resolve(&self, token: &str) -> Option<UserIdentity> {
        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_token() {
        let directory = StaticTokenDirectory::new();
        let user = UserId::new();
        directory.insert("secret", user, "Ada", None);

        let identity = directory.resolve("secret").unwrap();
        assert_eq!(identity.user_id, user);
        assert_eq!(identity.display_name, "Ada");
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let directory = StaticTokenDirectory::new();
        assert!(directory.resolve("nope").is_none());
    }

    #[test]
    fn from_pairs_assigns_distinct_ids() {
        let directory = StaticTokenDirectory::from_pairs(&[
            ("t1".to_string(), "Ada".to_string()),
            ("t2".to_string(), "Grace".to_string()),
        ]);

        let a = directory.resolve("t1").unwrap();
        let b = directory.resolve("t2").unwrap();
        assert_ne!(a.user_id, b.user_id);
    }
}
