//! Message rows: creation, authorized mutation, soft deletion, history.

use chrono::{DateTime, Utc};
use rusqlite::params;

use huddle_shared::constants::TOMBSTONE_TEXT;
use huddle_shared::{MessageId, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::StoredMessage;

impl Database {
    /// Create and persist a new message. Always succeeds given a valid
    /// sender; id and timestamp are assigned here.
    pub fn create_message(
        &self,
        sender_id: UserId,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<StoredMessage> {
        let message = StoredMessage {
            id: MessageId::new(),
            sender_id,
            content: content.to_string(),
            media_url: media_url.map(str::to_string),
            timestamp: Utc::now(),
            is_edited: false,
            is_deleted: false,
        };

        self.conn().execute(
            "INSERT INTO messages (id, sender_id, content, media_url, timestamp, is_edited, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 0)",
            params![
                message.id.to_string(),
                message.sender_id.to_string(),
                message.content,
                message.media_url,
                message.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(message)
    }

    /// Fetch a single message by id.
    pub fn get_message(&self, id: MessageId) -> Result<StoredMessage> {
        self.conn()
            .query_row(
                "SELECT id, sender_id, content, media_url, timestamp, is_edited, is_deleted
                 FROM messages WHERE id = ?1",
                params![id.to_string()],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Replace a message's content. Only the original sender may edit;
    /// a tombstoned message can no longer be edited.
    pub fn edit_message(
        &self,
        id: MessageId,
        caller: UserId,
        content: &str,
    ) -> Result<StoredMessage> {
        let message = self.get_message(id)?;
        if message.sender_id != caller {
            return Err(StoreError::Unauthorized);
        }
        if message.is_deleted {
            return Err(StoreError::NotFound);
        }

        self.conn().execute(
            "UPDATE messages SET content = ?2, is_edited = 1 WHERE id = ?1",
            params![id.to_string(), content],
        )?;

        self.get_message(id)
    }

    /// Soft-delete a message: the row keeps its id and position, the body
    /// is replaced with the tombstone text. Only the original sender may
    /// delete.
    pub fn tombstone_message(&self, id: MessageId, caller: UserId) -> Result<StoredMessage> {
        let message = self.get_message(id)?;
        if message.sender_id != caller {
            return Err(StoreError::Unauthorized);
        }
        if message.is_deleted {
            return Err(StoreError::NotFound);
        }

        self.conn().execute(
            "UPDATE messages SET content = ?2, is_deleted = 1 WHERE id = ?1",
            params![id.to_string(), TOMBSTONE_TEXT],
        )?;

        self.get_message(id)
    }

    /// Return up to `limit` most-recent messages, oldest-first, for history
    /// replay.
    pub fn list_recent_messages(&self, limit: u32) -> Result<Vec<StoredMessage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, sender_id, content, media_url, timestamp, is_edited, is_deleted
             FROM messages
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        messages.reverse();
        Ok(messages)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`StoredMessage`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMessage> {
    let id_str: String = row.get(0)?;
    let sender_str: String = row.get(1)?;
    let content: String = row.get(2)?;
    let media_url: Option<String> = row.get(3)?;
    let ts_str: String = row.get(4)?;
    let is_edited: bool = row.get(5)?;
    let is_deleted: bool = row.get(6)?;

    let id = uuid::Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let sender_id = uuid::Uuid::parse_str(&sender_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(StoredMessage {
        id: MessageId(id),
        sender_id: UserId(sender_id),
        content,
        media_url,
        timestamp,
        is_edited,
        is_deleted,
    })
}
