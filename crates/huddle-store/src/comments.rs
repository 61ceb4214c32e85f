//! Comment rows. Append-only: individual comments are never edited or
//! removed, and `ON DELETE CASCADE` only fires if a message row is ever
//! physically purged (soft delete keeps comments intact).

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use huddle_shared::{MessageId, UserId};

use crate::database::Database;
use crate::error::Result;
use crate::models::Comment;

impl Database {
    /// Append a comment to a message.
    pub fn add_comment(
        &self,
        message_id: MessageId,
        sender_id: UserId,
        content: &str,
    ) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            message_id,
            sender_id,
            content: content.to_string(),
            timestamp: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO comments (id, message_id, sender_id, content, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id.to_string(),
                comment.message_id.to_string(),
                comment.sender_id.to_string(),
                comment.content,
                comment.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(comment)
    }

    /// All comments on a message in submission order. The rowid tiebreak
    /// keeps the order deterministic when timestamps collide.
    pub fn comments_for_message(&self, message_id: MessageId) -> Result<Vec<Comment>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, message_id, sender_id, content, timestamp
             FROM comments
             WHERE message_id = ?1
             ORDER BY timestamp ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![message_id.to_string()], row_to_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }
}

/// Map a `rusqlite::Row` to a [`Comment`].
fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let id_str: String = row.get(0)?;
    let message_str: String = row.get(1)?;
    let sender_str: String = row.get(2)?;
    let content: String = row.get(3)?;
    let ts_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let message_id = Uuid::parse_str(&message_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?;

    let sender_id = Uuid::parse_str(&sender_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)))?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Comment {
        id,
        message_id: MessageId(message_id),
        sender_id: UserId(sender_id),
        content,
        timestamp,
    })
}
