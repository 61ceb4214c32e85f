use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use huddle_shared::{MessageView, PresenceView};

use crate::chat::ChatService;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::gateway;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(gateway::ws_upgrade))
        .route("/api/messages", get(message_history))
        .route("/api/presence", get(presence_roster))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "instance": state.config.instance_name,
        "sessions": state.chat.subscriber_count().await,
    }))
}

/// Up to 50 most-recent messages, oldest-first, hydrated for display.
async fn message_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<MessageView>>, ServerError> {
    let messages = state.chat.history().await?;
    Ok(Json(messages))
}

/// Presence roster for initial room population.
async fn presence_roster(
    State(state): State<AppState>,
) -> Result<Json<Vec<PresenceView>>, ServerError> {
    let roster = state.chat.presence_snapshot().await?;
    Ok(Json(roster))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
