//! Schema migrations, applied on every [`Database`](crate::Database) open.
//!
//! `PRAGMA user_version` records how far a database file has been
//! migrated; each step runs at most once and bumps the version when it
//! commits. v001 creates the four chat tables: `users`, `messages`,
//! `reactions`, `comments`.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Version a freshly migrated database ends up at. New schema steps get a
/// module and a bump here.
const CURRENT_VERSION: u32 = 1;

/// Bring the connection's schema up to [`CURRENT_VERSION`], applying any
/// steps its `user_version` has not yet seen.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::debug!(
        from_version = version,
        to_version = CURRENT_VERSION,
        "running schema migrations"
    );

    if version < 1 {
        v001_initial::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 1)?;
        tracing::info!("applied schema migration v001");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_set_user_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn rerunning_migrations_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        // A migrated database must open cleanly again and again.
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
    }
}
