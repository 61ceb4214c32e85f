//! JSON wire protocol between chat clients and the gateway.
//!
//! Clients send [`ClientCommand`] frames over the WebSocket; the server
//! pushes [`ServerEvent`] frames to every subscriber of the room. Event tags
//! are kebab-case (`new-message`, `user-typing`, ...) to stay compatible
//! with the web front end's event names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MessageId, UserId};

/// Which reaction set a `react-message` command targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

/// Commands a client may issue over its WebSocket.
///
/// Every command except `authenticate` requires a bound identity; commands
/// from unauthenticated sessions are dropped without a reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    Authenticate {
        token: String,
    },
    SendMessage {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_url: Option<String>,
    },
    EditMessage {
        message_id: MessageId,
        content: String,
    },
    DeleteMessage {
        message_id: MessageId,
    },
    ReactMessage {
        message_id: MessageId,
        kind: ReactionKind,
    },
    AddComment {
        message_id: MessageId,
        content: String,
    },
    Typing {
        is_typing: bool,
    },
}

/// Events the server pushes to subscribed sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    NewMessage {
        message: MessageView,
    },
    MessageUpdated {
        message: MessageView,
    },
    /// Carries the full tombstoned record so clients can render the
    /// placeholder in place without a second lookup.
    MessageDeleted {
        message: MessageView,
    },
    MessageLiked {
        message: MessageView,
    },
    MessageDisliked {
        message: MessageView,
    },
    NewComment {
        message: MessageView,
    },
    UserOnline {
        user_id: UserId,
        display_name: String,
    },
    UserOffline {
        user_id: UserId,
    },
    UserTyping {
        user_id: UserId,
        display_name: String,
        is_typing: bool,
    },
}

/// A chat message hydrated for the wire: sender display fields resolved,
/// reaction id lists and comments inlined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageView {
    pub id: MessageId,
    pub sender: SenderView,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub likes: Vec<UserId>,
    pub dislikes: Vec<UserId>,
    pub comments: Vec<CommentView>,
}

/// Display fields for a message or comment author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SenderView {
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// One comment on a message, display fields resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentView {
    pub sender: SenderView,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Presence roster entry returned by the presence snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceView {
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
}
