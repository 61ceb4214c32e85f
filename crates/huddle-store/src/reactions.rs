//! Reaction rows. The `(message_id, user_id)` primary key means a user is
//! in at most one of the two sets at any time; switching sides is an update
//! of `kind`, never a second row.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use huddle_shared::{MessageId, ReactionKind, UserId};

use crate::database::Database;
use crate::error::Result;
use crate::models::Reaction;

impl Database {
    /// Toggle `user_id`'s membership in the targeted reaction set.
    ///
    /// - no existing reaction: the user joins the targeted set
    /// - existing reaction of the same kind: the reaction is removed
    /// - existing reaction of the opposite kind: the user switches sets
    pub fn toggle_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<()> {
        let existing: Option<String> = self
            .conn()
            .query_row(
                "SELECT kind FROM reactions WHERE message_id = ?1 AND user_id = ?2",
                params![message_id.to_string(), user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match existing.as_deref() {
            Some(current) if current == kind.as_str() => {
                self.conn().execute(
                    "DELETE FROM reactions WHERE message_id = ?1 AND user_id = ?2",
                    params![message_id.to_string(), user_id.to_string()],
                )?;
            }
            Some(_) => {
                self.conn().execute(
                    "UPDATE reactions SET kind = ?3, created_at = ?4
                     WHERE message_id = ?1 AND user_id = ?2",
                    params![
                        message_id.to_string(),
                        user_id.to_string(),
                        kind.as_str(),
                        Utc::now().to_rfc3339(),
                    ],
                )?;
            }
            None => {
                self.conn().execute(
                    "INSERT INTO reactions (message_id, user_id, kind, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        message_id.to_string(),
                        user_id.to_string(),
                        kind.as_str(),
                        Utc::now().to_rfc3339(),
                    ],
                )?;
            }
        }

        Ok(())
    }

    /// All reactions on a message, oldest first.
    pub fn reactions_for_message(&self, message_id: MessageId) -> Result<Vec<Reaction>> {
        let mut stmt = self.conn().prepare(
            "SELECT message_id, user_id, kind, created_at
             FROM reactions WHERE message_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![message_id.to_string()], row_to_reaction)?;

        let mut reactions = Vec::new();
        for row in rows {
            reactions.push(row?);
        }
        Ok(reactions)
    }
}

/// Map a `rusqlite::Row` to a [`Reaction`].
fn row_to_reaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reaction> {
    let message_str: String = row.get(0)?;
    let user_str: String = row.get(1)?;
    let kind: String = row.get(2)?;
    let created_str: String = row.get(3)?;

    let message_id = uuid::Uuid::parse_str(&message_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let user_id = uuid::Uuid::parse_str(&user_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Reaction {
        message_id: MessageId(message_id),
        user_id: UserId(user_id),
        kind,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_db() -> (Database, UserId, MessageId) {
        let db = Database::open_in_memory().unwrap();
        let user = UserId::new();
        db.upsert_user(user, "Ada", None).unwrap();
        let message = db.create_message(user, "react to me", None).unwrap();
        (db, user, message.id)
    }

    fn kinds(db: &Database, message_id: MessageId) -> Vec<String> {
        db.reactions_for_message(message_id)
            .unwrap()
            .into_iter()
            .map(|r| r.kind)
            .collect()
    }

    #[test]
    fn like_then_dislike_switches_sets() {
        let (db, user, message_id) = seeded_db();

        db.toggle_reaction(message_id, user, ReactionKind::Like).unwrap();
        assert_eq!(kinds(&db, message_id), vec!["like"]);

        db.toggle_reaction(message_id, user, ReactionKind::Dislike).unwrap();
        assert_eq!(kinds(&db, message_id), vec!["dislike"]);
    }

    #[test]
    fn same_kind_twice_toggles_off() {
        let (db, user, message_id) = seeded_db();

        db.toggle_reaction(message_id, user, ReactionKind::Like).unwrap();
        db.toggle_reaction(message_id, user, ReactionKind::Like).unwrap();
        assert!(kinds(&db, message_id).is_empty());
    }

    #[test]
    fn one_row_per_user() {
        let (db, user, message_id) = seeded_db();
        let second = UserId::new();
        db.upsert_user(second, "Grace", None).unwrap();

        db.toggle_reaction(message_id, user, ReactionKind::Like).unwrap();
        db.toggle_reaction(message_id, second, ReactionKind::Like).unwrap();
        db.toggle_reaction(message_id, user, ReactionKind::Dislike).unwrap();

        let reactions = db.reactions_for_message(message_id).unwrap();
        assert_eq!(reactions.len(), 2);
        // Each user appears exactly once regardless of how often they flip.
        let mut users: Vec<_> = reactions.iter().map(|r| r.user_id).collect();
        users.sort_by_key(|u| u.0);
        let mut expected = vec![user, second];
        expected.sort_by_key(|u| u.0);
        assert_eq!(users, expected);
    }
}
