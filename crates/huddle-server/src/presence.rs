//! Per-user live-session reference counts.
//!
//! A user is online while at least one of their sessions is connected.
//! Counting sessions (rather than flipping a boolean) keeps presence
//! correct when one user holds several simultaneous connections.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use huddle_shared::UserId;

#[derive(Clone, Default)]
pub struct PresenceTracker {
    counts: Arc<Mutex<HashMap<UserId, usize>>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new live session for a user. Returns `true` when this is
    /// the user's first session, i.e. the user just came online.
    pub async fn connect(&self, user_id: UserId) -> bool {
        let mut counts = self.counts.lock().await;
        let count = counts.entry(user_id).or_insert(0);
        *count += 1;

        debug!(user = %user_id, sessions = *count, "presence connect");
        *count == 1
    }

    /// Record a closed session for a user. Returns `true` when the user's
    /// last session ended, i.e. the user just went offline. Calling this
    /// for a user with no live sessions is a no-op.
    pub async fn disconnect(&self, user_id: UserId) -> bool {
        let mut counts = self.counts.lock().await;
        let Some(count) = counts.get_mut(&user_id) else {
            return false;
        };

        *count = count.saturating_sub(1);
        debug!(user = %user_id, sessions = *count, "presence disconnect");

        if *count == 0 {
            counts.remove(&user_id);
            true
        } else {
            false
        }
    }

    /// Whether a user currently has at least one live session.
    #[cfg(test)]
    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.counts.lock().await.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_session_comes_online() {
        let tracker = PresenceTracker::new();
        let user = UserId::new();

        assert!(tracker.connect(user).await);
        assert!(tracker.is_online(user).await);
    }

    #[tokio::test]
    async fn test_second_session_is_not_a_transition() {
        let tracker = PresenceTracker::new();
        let user = UserId::new();

        assert!(tracker.connect(user).await);
        assert!(!tracker.connect(user).await);

        // First disconnect keeps the user online, second takes them offline.
        assert!(!tracker.disconnect(user).await);
        assert!(tracker.is_online(user).await);
        assert!(tracker.disconnect(user).await);
        assert!(!tracker.is_online(user).await);
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_no_op() {
        let tracker = PresenceTracker::new();
        assert!(!tracker.disconnect(UserId::new()).await);
    }
}
