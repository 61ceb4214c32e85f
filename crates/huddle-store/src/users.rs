//! User profile rows, populated when a session authenticates.

use chrono::{DateTime, Utc};
use rusqlite::params;

use huddle_shared::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    /// Insert a user profile, or refresh its display fields if the id is
    /// already known. Presence columns are left untouched on conflict.
    pub fn upsert_user(
        &self,
        id: UserId,
        display_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<User> {
        let now = Utc::now();

        self.conn().execute(
            "INSERT INTO users (id, display_name, avatar_url, is_online, last_seen, created_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)
             ON CONFLICT(id) DO UPDATE SET display_name = ?2, avatar_url = ?3",
            params![id.to_string(), display_name, avatar_url, now.to_rfc3339()],
        )?;

        self.get_user(id)
    }

    /// Fetch a single user profile.
    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, display_name, avatar_url, is_online, last_seen, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// All known user profiles, ordered by display name.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, display_name, avatar_url, is_online, last_seen, created_at
             FROM users ORDER BY display_name ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let display_name: String = row.get(1)?;
    let avatar_url: Option<String> = row.get(2)?;
    let is_online: bool = row.get(3)?;
    let last_seen_str: String = row.get(4)?;
    let created_str: String = row.get(5)?;

    let id = uuid::Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let last_seen: DateTime<Utc> = DateTime::parse_from_rfc3339(&last_seen_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(User {
        id: UserId(id),
        display_name,
        avatar_url,
        is_online,
        last_seen,
        created_at,
    })
}
