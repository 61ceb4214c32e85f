//! # huddle-store
//!
//! Persistent storage for the Huddle chat room, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model. Callers needing async access wrap the handle in their own mutex;
//! the store itself stays synchronous, single-connection.

pub mod comments;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod presence;
pub mod reactions;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
