//! Chat over WebSocket.
//!
//! Same routing as `POST /api/chat`, one JSON frame in and one out per turn.

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::AppState;
use crate::chat::ConversationRouter;

/// Client → server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    #[serde(rename = "message")]
    Message { owner_id: String, content: String },
}

/// Server → client.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ServerMessage {
    #[serde(rename = "response")]
    Response {
        owner_id: String,
        #[serde(flatten)]
        reply: Value,
    },
    #[serde(rename = "error")]
    Error {
        message: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        retryable: bool,
    },
}

pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws/chat", get(ws_chat_handler))
}

async fn ws_chat_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("Chat client connecting");
    ws.on_upgrade(|socket| handle_chat_socket(socket, state))
}

async fn handle_chat_socket(mut socket: WebSocket, state: AppState) {
    info!("Chat client connected");

    while let Some(result) = socket.recv().await {
        let reply = match result {
            Ok(Message::Text(text)) => handle_frame(&state.router, &text).await,
            Ok(Message::Ping(data)) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
                continue;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Chat WebSocket error");
                break;
            }
        };

        let Some(reply) = reply else { continue };
        if let Ok(json) = serde_json::to_string(&reply)
            && socket.send(Message::Text(json.into())).await.is_err()
        {
            debug!("Chat client disconnected during send");
            break;
        }
    }

    info!("Chat connection closed");
}

/// One inbound frame. Blank messages are ignored.
async fn handle_frame(router: &ConversationRouter, text: &str) -> Option<ServerMessage> {
    let (owner_id, content) = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Message { owner_id, content }) => (owner_id, content),
        Err(e) => {
            debug!(error = %e, text = %text, "Invalid JSON from chat client");
            return Some(ServerMessage::Error {
                message: format!("invalid message: {e}"),
                retryable: false,
            });
        }
    };

    let content = content.trim();
    if content.is_empty() || owner_id.trim().is_empty() {
        return None;
    }

    Some(match router.handle(owner_id.trim(), content).await {
        Ok(reply) => ServerMessage::Response {
            owner_id,
            reply: reply.to_json(content),
        },
        Err(e) => ServerMessage::Error {
            message: e.to_string(),
            retryable: e.is_retryable(),
        },
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn response_frame_flattens_reply() {
        let frame = ServerMessage::Response {
            owner_id: "u1".into(),
            reply: json!({"user_message": "안녕", "assistant_answer": "반가워요"}),
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "response");
        assert_eq!(value["owner_id"], "u1");
        assert_eq!(value["assistant_answer"], "반가워요");
    }

    #[test]
    fn error_frame_omits_false_retryable() {
        let frame = ServerMessage::Error {
            message: "nope".into(),
            retryable: false,
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "nope"}));
    }
}
