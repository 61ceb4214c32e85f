//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the view-hydration layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use huddle_shared::{MessageId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A known user profile, including its presence columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Identity assigned by the external auth service.
    pub id: UserId,
    /// Human-readable display name.
    pub display_name: String,
    /// Optional URL of the avatar image.
    pub avatar_url: Option<String>,
    /// Whether at least one live session exists for this user.
    pub is_online: bool,
    /// Updated on every disconnect and on login.
    pub last_seen: DateTime<Utc>,
    /// When this profile row was first created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message row. Reaction and comment sub-state live in their
/// own tables and are joined in at hydration time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMessage {
    /// Unique message identifier.
    pub id: MessageId,
    /// Identity of the sender; set once at creation, never reassigned.
    pub sender_id: UserId,
    /// Text body. After a soft delete this holds the tombstone text.
    pub content: String,
    /// Opaque reference to an uploaded attachment, if any.
    pub media_url: Option<String>,
    /// Creation time, immutable.
    pub timestamp: DateTime<Utc>,
    /// Set by the sender's edit operation.
    pub is_edited: bool,
    /// Soft-deletion marker; the row is never physically removed.
    pub is_deleted: bool,
}

// ---------------------------------------------------------------------------
// Reaction
// ---------------------------------------------------------------------------

/// One user's reaction to one message. At most one row exists per
/// (message, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reaction {
    pub message_id: MessageId,
    pub user_id: UserId,
    /// `"like"` or `"dislike"`.
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment on a message. Append-only: no edit or delete on individual
/// comments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: uuid::Uuid,
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
