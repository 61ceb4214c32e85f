//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `users`, `messages`, `reactions`, and
//! `comments`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (profile + presence columns)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    display_name TEXT NOT NULL,
    avatar_url   TEXT,
    is_online    INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    last_seen    TEXT NOT NULL,               -- ISO-8601 / RFC-3339
    created_at   TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    sender_id  TEXT NOT NULL,                 -- FK -> users(id)
    content    TEXT NOT NULL,
    media_url  TEXT,
    timestamp  TEXT NOT NULL,                 -- ISO-8601
    is_edited  INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    is_deleted INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1

    FOREIGN KEY (sender_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_messages_ts ON messages(timestamp DESC);

-- ----------------------------------------------------------------
-- Reactions
--
-- One row per (message, user). The primary key makes like/dislike
-- mutually exclusive at the schema level: switching sides is an
-- UPDATE of `kind`, never a second row.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS reactions (
    message_id TEXT NOT NULL,                 -- FK -> messages(id)
    user_id    TEXT NOT NULL,                 -- FK -> users(id)
    kind       TEXT NOT NULL CHECK (kind IN ('like', 'dislike')),
    created_at TEXT NOT NULL,

    PRIMARY KEY (message_id, user_id),
    FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

-- ----------------------------------------------------------------
-- Comments (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    message_id TEXT NOT NULL,                 -- FK -> messages(id)
    sender_id  TEXT NOT NULL,                 -- FK -> users(id)
    content    TEXT NOT NULL,
    timestamp  TEXT NOT NULL,

    FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE,
    FOREIGN KEY (sender_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_comments_message_ts
    ON comments(message_id, timestamp ASC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
