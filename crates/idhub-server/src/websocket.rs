//! Push channel
//!
//! A caller holding a correlation token opens `/api/v1/socket`, sends
//! `{"token": "..."}` and receives exactly one event once the token is
//! resolved or the poll budget runs out. The socket is then closed. If the
//! caller disconnects first the poll future is dropped.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Event name sent for malformed requests
pub const ERROR_EVENT: &str = "error";

/// Data sent with [`ERROR_EVENT`]
pub const INVALID_REQUEST: &str = "Invalid websocket request";

/// First client message
#[derive(Debug, Deserialize)]
pub struct PollRequest {
    /// Correlation token to wait for
    pub token: String,
}

/// Single server message
#[derive(Debug, Serialize)]
pub struct PushEvent {
    /// The token, or `error`
    pub event: String,
    /// Poll result or error text
    pub data: Value,
}

/// `GET /api/v1/socket`
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let Some(request) = next_request(&mut receiver).await else {
        debug!("WebSocket closed before a request arrived");
        return;
    };

    let event = match serde_json::from_str::<PollRequest>(&request) {
        Ok(PollRequest { token }) if !token.is_empty() => {
            info!("Push caller waiting for token");
            let outcome = tokio::select! {
                outcome = state.poller.resolve(&token) => outcome,
                () = wait_closed(&mut receiver) => {
                    debug!("Push caller disconnected, poll abandoned");
                    return;
                }
            };
            PushEvent {
                event: token,
                data: outcome.to_value(),
            }
        }
        _ => {
            warn!("Malformed websocket request");
            PushEvent {
                event: ERROR_EVENT.to_string(),
                data: Value::String(INVALID_REQUEST.to_string()),
            }
        }
    };

    match serde_json::to_string(&event) {
        Ok(text) => {
            if let Err(e) = sender.send(Message::Text(text.into())).await {
                warn!(error = %e, "Failed to send push event");
                return;
            }
        }
        Err(e) => warn!(error = %e, "Failed to encode push event"),
    }
    let _ = sender.send(Message::Close(None)).await;
}

/// First text frame, skipping control frames
async fn next_request(receiver: &mut SplitStream<WebSocket>) -> Option<String> {
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => return Some(text.as_str().to_owned()),
            Ok(Message::Binary(bytes)) => {
                return Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}

/// Resolves once the peer closes or the stream fails
async fn wait_closed(receiver: &mut SplitStream<WebSocket>) {
    while let Some(message) = receiver.next().await {
        if matches!(message, Ok(Message::Close(_)) | Err(_)) {
            return;
        }
    }
}
