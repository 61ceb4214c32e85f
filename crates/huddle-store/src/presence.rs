//! Presence columns on the users table.
//!
//! `set_online` / `set_offline` are idempotent: repeated calls only move
//! `last_seen` forward. Unknown user ids are a no-op, never an error.

use chrono::Utc;
use rusqlite::params;

use huddle_shared::UserId;

use crate::database::Database;
use crate::error::Result;
use crate::models::User;

impl Database {
    /// Mark a user online and refresh `last_seen`.
    pub fn set_online(&self, user_id: UserId) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET is_online = 1, last_seen = ?2 WHERE id = ?1",
            params![user_id.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Mark a user offline and refresh `last_seen`.
    pub fn set_offline(&self, user_id: UserId) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET is_online = 0, last_seen = ?2 WHERE id = ?1",
            params![user_id.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Read-only presence view of every known user, for initial room
    /// population.
    pub fn presence_snapshot(&self) -> Result<Vec<User>> {
        self.list_users()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_online_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let user = UserId::new();
        db.upsert_user(user, "Ada", None).unwrap();

        db.set_online(user).unwrap();
        let first = db.get_user(user).unwrap();

        db.set_online(user).unwrap();
        let second = db.get_user(user).unwrap();

        assert!(first.is_online);
        assert!(second.is_online);
        // Only last_seen may move, and only forward.
        assert!(second.last_seen >= first.last_seen);
    }

    #[test]
    fn offline_updates_last_seen() {
        let db = Database::open_in_memory().unwrap();
        let user = UserId::new();
        db.upsert_user(user, "Ada", None).unwrap();

        db.set_online(user).unwrap();
        let online = db.get_user(user).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));
        db.set_offline(user).unwrap();
        let offline = db.get_user(user).unwrap();

        assert!(!offline.is_online);
        assert!(offline.last_seen > online.last_seen);
    }

    #[test]
    fn unknown_user_is_a_no_op() {
        let db = Database::open_in_memory().unwrap();
        db.set_online(UserId::new()).unwrap();
        db.set_offline(UserId::new()).unwrap();
    }
}
