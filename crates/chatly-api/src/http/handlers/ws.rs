//! WebSocket chat endpoint.
//!
//! `GET /ws` upgrades an authenticated request (valid session cookie) to a
//! WebSocket. Each socket gets its own chat session from the
//! [`ConnectionRegistry`]; the session lives exactly as long as the socket.
//!
//! Frames are JSON envelopes `{"event": ..., "data": ...}`:
//!
//! - client -> server: `ai-message` with the user text
//! - server -> client: `ai-message-response` with the reply or fallback text
//!
//! Malformed frames are logged and ignored. A close frame, a receive error
//! or the end of the stream closes the session.
//!
//! [`ConnectionRegistry`]: chatly_core::chat::registry::ConnectionRegistry

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use chatly_core::chat::registry::SessionHandle;
use chatly_types::identity::AuthenticatedIdentity;

use crate::http::extractors::auth::AuthenticatedUser;
use crate::state::AppState;

/// Frame sent by the client.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ClientEvent {
    AiMessage(String),
}

/// Frame sent to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ServerEvent {
    AiMessageResponse(String),
}

/// Upgrade to a chat WebSocket. Rejected with 401 before the upgrade when
/// the session cookie is missing, invalid or revoked.
pub async fn ws_handler(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat_connection(socket, state, user.identity))
}

/// Multiplex session replies and client frames in a single task.
async fn handle_chat_connection(
    socket: WebSocket,
    state: AppState,
    identity: AuthenticatedIdentity,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let session = state.registry.connect(&identity, reply_tx);

    loop {
        tokio::select! {
            // --- Branch 1: Forward session replies to the client ---
            reply = reply_rx.recv() => {
                let Some(text) = reply else {
                    // Session worker is gone
                    break;
                };
                match serde_json::to_string(&ServerEvent::AiMessageResponse(text)) {
                    Ok(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!("Failed to serialize chat reply: {err}");
                    }
                }
            }

            // --- Branch 2: Queue client messages on the session ---
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        process_frame(text.as_str(), &session);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    // Ignore binary, ping, pong protocol frames (handled by axum/tungstenite)
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.registry.disconnect(session.id());
    tracing::debug!(connection_id = %session.id(), "WebSocket connection closed");
}

/// Parse one client frame and queue its text on the session.
fn process_frame(text: &str, session: &SessionHandle) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(
                connection_id = %session.id(),
                error = %err,
                "Ignoring malformed WebSocket frame"
            );
            return;
        }
    };

    match event {
        ClientEvent::AiMessage(message) => {
            if let Err(err) = session.submit(message) {
                tracing::warn!(error = %err, "Dropping message for closed session");
            }
        }
    }
}
