//! WebSocket gateway: the persistent duplex channel each client speaks
//! over.
//!
//! One task per socket runs a select loop over inbound frames and the
//! session's outbound event queue. Commands are JSON text frames decoded
//! into [`ClientCommand`]; undecodable or oversized frames are dropped
//! without a reply, matching the command surface's silent-failure policy.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use huddle_shared::constants::{MAX_FRAME_SIZE, OUTBOUND_QUEUE_CAPACITY};
use huddle_shared::{ClientCommand, ServerEvent, SessionId};

use crate::api::AppState;
use crate::chat::ChatService;

/// Handle `GET /ws`: upgrade and hand the socket to its session task.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.max_frame_size(MAX_FRAME_SIZE)
        .on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, mut socket: WebSocket) {
    let session_id = SessionId::new();
    let chat = state.chat.clone();

    chat.connect(session_id).await;
    info!(session = %session_id, "websocket connected");

    // The outbound queue exists from accept time, but the room only learns
    // about its sender once the session authenticates.
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_QUEUE_CAPACITY);

    loop {
        tokio::select! {
            maybe_event = outbound_rx.recv() => {
                let Some(event) = maybe_event else { break };
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if socket.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(session = %session_id, error = %e, "failed to serialize event");
                    }
                }
            }
            maybe_frame = socket.recv() => {
                let Some(frame) = maybe_frame else { break };

                match frame {
                    Ok(Message::Text(raw)) => {
                        let command = match serde_json::from_str::<ClientCommand>(&raw) {
                            Ok(command) => command,
                            Err(e) => {
                                debug!(session = %session_id, error = %e, "undecodable frame dropped");
                                continue;
                            }
                        };

                        dispatch(&chat, session_id, &outbound_tx, command).await;
                    }
                    Ok(Message::Ping(payload)) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(session = %session_id, error = %e, "websocket read error");
                        break;
                    }
                }
            }
        }
    }

    // Teardown always runs, whatever broke the loop: a mutation already
    // committed still gets broadcast to the remaining sessions.
    chat.disconnect(session_id).await;
    info!(session = %session_id, "websocket closed");
}

async fn dispatch(
    chat: &ChatService,
    session_id: SessionId,
    outbound_tx: &mpsc::Sender<ServerEvent>,
    command: ClientCommand,
) {
    match command {
        ClientCommand::Authenticate { token } => {
            chat.authenticate(session_id, &token, outbound_tx.clone()).await;
        }
        ClientCommand::SendMessage { content, media_url } => {
            chat.send_message(session_id, &content, media_url.as_deref()).await;
        }
        ClientCommand::EditMessage { message_id, content } => {
            chat.edit_message(session_id, message_id, &content).await;
        }
        ClientCommand::DeleteMessage { message_id } => {
            chat.delete_message(session_id, message_id).await;
        }
        ClientCommand::ReactMessage { message_id, kind } => {
            chat.react_message(session_id, message_id, kind).await;
        }
        ClientCommand::AddComment { message_id, content } => {
            chat.add_comment(session_id, message_id, &content).await;
        }
        ClientCommand::Typing { is_typing } => {
            chat.typing(session_id, is_typing).await;
        }
    }
}
