//! The command pipeline: validate session, mutate the store, hydrate the
//! result, broadcast.
//!
//! All message mutations funnel through [`ChatService::with_message_lock`],
//! which serializes read-modify-write sequences per message id. The event
//! is published before the lock is released, so broadcast order matches
//! store commit order for any one message. Operations on different
//! messages proceed independently.
//!
//! Failures (bad token, sender mismatch, missing message) are dropped
//! silently at this boundary: logged, never surfaced to any client, never
//! fatal to the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use huddle_shared::constants::{HISTORY_PAGE_LIMIT, MAX_CONTENT_LEN};
use huddle_shared::{
    CommentView, MessageId, MessageView, PresenceView, ReactionKind, SenderView, ServerEvent,
    SessionId, UserId,
};
use huddle_store::{Database, Result as StoreResult, StoredMessage, StoreError};

use crate::identity::IdentityProvider;
use crate::presence::PresenceTracker;
use crate::room::Room;
use crate::session::{SessionRegistry, SessionUser};

/// Per-message-id mutual exclusion. Entries are created on first mutation
/// and kept for the message's lifetime (messages are only ever
/// soft-deleted, so they stay addressable).
#[derive(Default)]
struct MessageLocks {
    inner: StdMutex<HashMap<MessageId, Arc<Mutex<()>>>>,
}

impl MessageLocks {
    fn lock_for(&self, id: MessageId) -> Arc<Mutex<()>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(id).or_default().clone()
    }
}

pub struct ChatService {
    db: Mutex<Database>,
    locks: MessageLocks,
    registry: SessionRegistry,
    room: Room,
    presence: PresenceTracker,
    identity: Arc<dyn IdentityProvider>,
}

impl ChatService {
    pub fn new(db: Database, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            db: Mutex::new(db),
            locks: MessageLocks::default(),
            registry: SessionRegistry::new(),
            room: Room::new(),
            presence: PresenceTracker::new(),
            identity,
        }
    }

    /// Register a freshly accepted, not-yet-authenticated connection.
    pub async fn connect(&self, session_id: SessionId) {
        self.registry.register(session_id).await;
    }

    /// Bind an identity to a session from a bearer token.
    ///
    /// On success the session joins the room, presence is incremented, and
    /// `user-online` goes out to all other sessions. An invalid token or an
    /// already-bound session leaves everything untouched.
    pub async fn authenticate(
        &self,
        session_id: SessionId,
        token: &str,
        outbound: tokio::sync::mpsc::Sender<ServerEvent>,
    ) {
        let Some(identity) = self.identity.resolve(token) else {
            debug!(session = %session_id, "authenticate: token rejected");
            return;
        };

        let bound = self
            .registry
            .bind(
                session_id,
                SessionUser {
                    user_id: identity.user_id,
                    display_name: identity.display_name.clone(),
                },
            )
            .await;
        if !bound {
            debug!(session = %session_id, "authenticate: session unknown or already bound");
            return;
        }

        {
            let db = self.db.lock().await;
            if let Err(e) = db.upsert_user(
                identity.user_id,
                &identity.display_name,
                identity.avatar_url.as_deref(),
            ) {
                warn!(user = %identity.user_id, error = %e, "failed to upsert profile");
            }
        }

        self.room.subscribe(session_id, outbound).await;

        let came_online = self.presence.connect(identity.user_id).await;
        if came_online {
            let db = self.db.lock().await;
            if let Err(e) = db.set_online(identity.user_id) {
                warn!(user = %identity.user_id, error = %e, "failed to persist presence");
            }
        }

        self.room
            .publish_except(
                session_id,
                ServerEvent::UserOnline {
                    user_id: identity.user_id,
                    display_name: identity.display_name,
                },
            )
            .await;
    }

    /// Create a new message owned by the session's identity and broadcast
    /// it to every session in the room, including the sender's.
    pub async fn send_message(
        &self,
        session_id: SessionId,
        content: &str,
        media_url: Option<&str>,
    ) {
        let Some(user) = self.require_identity(session_id).await else {
            return;
        };
        if !content_ok(content) {
            warn!(session = %session_id, "send-message: content rejected");
            return;
        }

        let view = {
            let db = self.db.lock().await;
            db.create_message(user.user_id, content, media_url)
                .and_then(|message| hydrate(&db, &message))
        };

        match view {
            Ok(message) => {
                self.room.publish(ServerEvent::NewMessage { message }).await;
            }
            Err(e) => warn!(session = %session_id, error = %e, "send-message failed"),
        }
    }

    /// Replace a message's content. Sender-only; silently no-ops otherwise.
    pub async fn edit_message(&self, session_id: SessionId, message_id: MessageId, content: &str) {
        let Some(user) = self.require_identity(session_id).await else {
            return;
        };
        if !content_ok(content) {
            warn!(session = %session_id, "edit-message: content rejected");
            return;
        }

        self.with_message_lock(message_id, |db| {
            let message = db.edit_message(message_id, user.user_id, content)?;
            hydrate(db, &message).map(|message| ServerEvent::MessageUpdated { message })
        })
        .await;
    }

    /// Tombstone a message. Sender-only; silently no-ops otherwise. The
    /// broadcast carries the tombstoned record.
    pub async fn delete_message(&self, session_id: SessionId, message_id: MessageId) {
        let Some(user) = self.require_identity(session_id).await else {
            return;
        };

        self.with_message_lock(message_id, |db| {
            let message = db.tombstone_message(message_id, user.user_id)?;
            hydrate(db, &message).map(|message| ServerEvent::MessageDeleted { message })
        })
        .await;
    }

    /// Toggle the caller's reaction on a message. Any authenticated session
    /// may react; the like/dislike sets stay mutually exclusive per user.
    pub async fn react_message(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        kind: ReactionKind,
    ) {
        let Some(user) = self.require_identity(session_id).await else {
            return;
        };

        self.with_message_lock(message_id, |db| {
            // Reacting to a missing message is NotFound, same as edit.
            let message = db.get_message(message_id)?;
            db.toggle_reaction(message_id, user.user_id, kind)?;
            hydrate(db, &message).map(|message| match kind {
                ReactionKind::Like => ServerEvent::MessageLiked { message },
                ReactionKind::Dislike => ServerEvent::MessageDisliked { message },
            })
        })
        .await;
    }

    /// Append a comment to a message. Any authenticated session.
    pub async fn add_comment(&self, session_id: SessionId, message_id: MessageId, content: &str) {
        let Some(user) = self.require_identity(session_id).await else {
            return;
        };
        if !content_ok(content) {
            warn!(session = %session_id, "add-comment: content rejected");
            return;
        }

        self.with_message_lock(message_id, |db| {
            let message = db.get_message(message_id)?;
            db.add_comment(message_id, user.user_id, content)?;
            hydrate(db, &message).map(|message| ServerEvent::NewComment { message })
        })
        .await;
    }

    /// Broadcast a transient typing notification to everyone but the
    /// originator. Never persisted.
    pub async fn typing(&self, session_id: SessionId, is_typing: bool) {
        let Some(user) = self.require_identity(session_id).await else {
            return;
        };

        self.room
            .publish_except(
                session_id,
                ServerEvent::UserTyping {
                    user_id: user.user_id,
                    display_name: user.display_name,
                    is_typing,
                },
            )
            .await;
    }

    /// Tear down a session: unsubscribe, unbind, decrement presence, and
    /// broadcast `user-offline` to the remaining sessions if this was the
    /// user's last connection.
    pub async fn disconnect(&self, session_id: SessionId) {
        self.room.unsubscribe(session_id).await;

        let Some(user) = self.registry.deregister(session_id).await else {
            return;
        };

        let went_offline = self.presence.disconnect(user.user_id).await;
        if went_offline {
            {
                let db = self.db.lock().await;
                if let Err(e) = db.set_offline(user.user_id) {
                    warn!(user = %user.user_id, error = %e, "failed to persist presence");
                }
            }
            self.room
                .publish(ServerEvent::UserOffline { user_id: user.user_id })
                .await;
        }
    }

    /// Up to 50 most-recent messages, oldest-first, fully hydrated.
    pub async fn history(&self) -> StoreResult<Vec<MessageView>> {
        let db = self.db.lock().await;
        let messages = db.list_recent_messages(HISTORY_PAGE_LIMIT)?;

        let mut views = Vec::with_capacity(messages.len());
        for message in &messages {
            views.push(hydrate(&db, message)?);
        }
        Ok(views)
    }

    /// Number of sessions currently subscribed to the room.
    pub async fn subscriber_count(&self) -> usize {
        self.room.subscriber_count().await
    }

    /// Presence roster for initial room population.
    pub async fn presence_snapshot(&self) -> StoreResult<Vec<PresenceView>> {
        let db = self.db.lock().await;
        let users = db.presence_snapshot()?;

        Ok(users
            .into_iter()
            .map(|user| PresenceView {
                user_id: user.id,
                display_name: user.display_name,
                avatar_url: user.avatar_url,
                is_online: user.is_online,
                last_seen: user.last_seen,
            })
            .collect())
    }

    /// Identity gate for mutating commands: unauthenticated sessions get a
    /// debug log and nothing else.
    async fn require_identity(&self, session_id: SessionId) -> Option<SessionUser> {
        let identity = self.registry.identity(session_id).await;
        if identity.is_none() {
            debug!(session = %session_id, "command from unauthenticated session dropped");
        }
        identity
    }

    /// Run a read-modify-write sequence under the message's lock and
    /// publish the produced event before releasing it. Store errors mean
    /// the command is dropped: no broadcast, debug log only.
    async fn with_message_lock<F>(&self, message_id: MessageId, mutate: F)
    where
        F: FnOnce(&Database) -> StoreResult<ServerEvent>,
    {
        let lock = self.locks.lock_for(message_id);
        let _guard = lock.lock().await;

        let event = {
            let db = self.db.lock().await;
            mutate(&db)
        };

        match event {
            Ok(event) => self.room.publish(event).await,
            Err(StoreError::Unauthorized) => {
                debug!(message = %message_id, "mutation dropped: caller is not the sender");
            }
            Err(StoreError::NotFound) => {
                debug!(message = %message_id, "mutation dropped: message not found");
            }
            Err(e) => warn!(message = %message_id, error = %e, "mutation failed"),
        }
    }
}

/// Guard message and comment bodies: non-empty after trimming, bounded
/// length.
fn content_ok(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_CONTENT_LEN
}

/// Resolve a stored message into its wire view: sender display fields,
/// reaction id lists, and comments with their senders resolved.
fn hydrate(db: &Database, message: &StoredMessage) -> StoreResult<MessageView> {
    // Re-read inside the caller's lock so the view reflects the mutation
    // that was just committed.
    let message = db.get_message(message.id)?;

    let mut sender_cache: HashMap<UserId, SenderView> = HashMap::new();
    let sender = resolve_sender(db, message.sender_id, &mut sender_cache)?;

    let mut likes = Vec::new();
    let mut dislikes = Vec::new();
    for reaction in db.reactions_for_message(message.id)? {
        match reaction.kind.as_str() {
            "like" => likes.push(reaction.user_id),
            _ => dislikes.push(reaction.user_id),
        }
    }

    let mut comments = Vec::new();
    for comment in db.comments_for_message(message.id)? {
        comments.push(CommentView {
            sender: resolve_sender(db, comment.sender_id, &mut sender_cache)?,
            content: comment.content,
            timestamp: comment.timestamp,
        });
    }

    Ok(MessageView {
        id: message.id,
        sender,
        content: message.content,
        media_url: message.media_url,
        timestamp: message.timestamp,
        is_edited: message.is_edited,
        is_deleted: message.is_deleted,
        likes,
        dislikes,
        comments,
    })
}

fn resolve_sender(
    db: &Database,
    user_id: UserId,
    cache: &mut HashMap<UserId, SenderView>,
) -> StoreResult<SenderView> {
    if let Some(view) = cache.get(&user_id) {
        return Ok(view.clone());
    }

    let user = db.get_user(user_id)?;
    let view = SenderView {
        user_id: user.id,
        display_name: user.display_name,
        avatar_url: user.avatar_url,
    };
    cache.insert(user_id, view.clone());
    Ok(view)
}
