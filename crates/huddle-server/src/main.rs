//! # huddle-server
//!
//! Single-room team chat server.
//!
//! This binary provides:
//! - **WebSocket gateway** for the chat command surface (send, edit,
//!   delete, react, comment, typing) with best-effort event fan-out
//! - **SQLite-backed message store** with soft deletion, reactions, and
//!   append-only comments
//! - **Presence tracking** derived from live-session reference counts
//! - **REST API** (axum) for message history, the presence roster, and
//!   health checks

mod api;
mod chat;
mod config;
mod error;
mod gateway;
mod identity;
mod presence;
mod room;
mod session;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use huddle_shared::constants::APP_NAME;
use huddle_store::Database;

use crate::api::AppState;
use crate::chat::ChatService;
use crate::config::ServerConfig;
use crate::identity::StaticTokenDirectory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,huddle_server=debug")),
        )
        .init();

    info!("Starting {} chat server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        addr = %config.http_addr,
        tokens = config.tokens.len(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Message store (runs migrations on open)
    let db = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    // Development token directory; production deployments substitute their
    // auth service behind the IdentityProvider trait.
    let identity = Arc::new(StaticTokenDirectory::from_pairs(&config.tokens));

    let chat = Arc::new(ChatService::new(db, identity));

    let state = AppState {
        chat,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP/WebSocket server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
