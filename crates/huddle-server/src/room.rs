//! Broadcast router for the single shared room.
//!
//! Each subscribed session hands in the sending half of its bounded
//! outbound queue; `publish` fans an event out to every queue in the order
//! events are handed in. Delivery is best-effort at-most-once: a session
//! whose queue is full or whose receiver is gone simply misses the event.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use huddle_shared::{ServerEvent, SessionId};

#[derive(Clone, Default)]
pub struct Room {
    senders: Arc<RwLock<HashMap<SessionId, mpsc::Sender<ServerEvent>>>>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a session with the sending half of its outbound queue.
    pub async fn subscribe(&self, session_id: SessionId, tx: mpsc::Sender<ServerEvent>) {
        let mut senders = self.senders.write().await;
        senders.insert(session_id, tx);

        debug!(
            session = %session_id,
            subscribers = senders.len(),
            "session subscribed to room"
        );
    }

    /// Unsubscribe a session.
    pub async fn unsubscribe(&self, session_id: SessionId) {
        let mut senders = self.senders.write().await;
        senders.remove(&session_id);

        debug!(
            session = %session_id,
            subscribers = senders.len(),
            "session unsubscribed from room"
        );
    }

    /// Deliver an event to every subscribed session.
    pub async fn publish(&self, event: ServerEvent) {
        self.fan_out(None, event).await;
    }

    /// Deliver an event to every subscribed session except the originator.
    pub async fn publish_except(&self, origin: SessionId, event: ServerEvent) {
        self.fan_out(Some(origin), event).await;
    }

    async fn fan_out(&self, skip: Option<SessionId>, event: ServerEvent) {
        let senders = self.senders.read().await;

        for (session_id, tx) in senders.iter() {
            if Some(*session_id) == skip {
                continue;
            }

            if tx.try_send(event.clone()).is_err() {
                debug!(
                    target_session = %session_id,
                    "dropping event for slow or gone session"
                );
            }
        }
    }

    /// Number of currently subscribed sessions.
    pub async fn subscriber_count(&self) -> usize {
        self.senders.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_shared::UserId;

    fn offline_event() -> ServerEvent {
        ServerEvent::UserOffline { user_id: UserId::new() }
    }

    async fn subscribed(room: &Room, capacity: usize) -> (SessionId, mpsc::Receiver<ServerEvent>) {
        let session = SessionId::new();
        let (tx, rx) = mpsc::channel(capacity);
        room.subscribe(session, tx).await;
        (session, rx)
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let room = Room::new();
        let (session, _rx) = subscribed(&room, 8).await;
        assert_eq!(room.subscriber_count().await, 1);

        room.unsubscribe(session).await;
        assert_eq!(room.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let room = Room::new();
        let (_, mut rx_a) = subscribed(&room, 8).await;
        let (_, mut rx_b) = subscribed(&room, 8).await;

        let event = offline_event();
        room.publish(event.clone()).await;

        assert_eq!(rx_a.try_recv().unwrap(), event);
        assert_eq!(rx_b.try_recv().unwrap(), event);
    }

    #[tokio::test]
    async fn test_publish_except_skips_originator() {
        let room = Room::new();
        let (origin, mut rx_origin) = subscribed(&room, 8).await;
        let (_, mut rx_other) = subscribed(&room, 8).await;

        room.publish_except(origin, offline_event()).await;

        assert!(rx_origin.try_recv().is_err());
        assert!(rx_other.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_slow_session_drops_events_without_error() {
        let room = Room::new();
        let (_, mut rx) = subscribed(&room, 2).await;

        // Queue capacity is 2; the third event is silently dropped.
        room.publish(offline_event()).await;
        room.publish(offline_event()).await;
        room.publish(offline_event()).await;

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 2);
    }

    #[tokio::test]
    async fn test_gone_session_is_skipped() {
        let room = Room::new();
        let (_, rx) = subscribed(&room, 8).await;
        drop(rx);

        // Must not error or panic even though the receiver is gone.
        room.publish(offline_event()).await;
    }

    #[tokio::test]
    async fn test_fan_out_preserves_publish_order() {
        let room = Room::new();
        let (_, mut rx) = subscribed(&room, 8).await;

        let first = UserId::new();
        let second = UserId::new();
        room.publish(ServerEvent::UserOffline { user_id: first }).await;
        room.publish(ServerEvent::UserOffline { user_id: second }).await;

        assert_eq!(rx.try_recv().unwrap(), ServerEvent::UserOffline { user_id: first });
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::UserOffline { user_id: second });
    }
}
