//! WebSocket transport for the real-time hub.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use roadhub_entity::events::RoomKey;
use roadhub_realtime::connection::ConnectionHandle;
use roadhub_realtime::message::types::{InboundMessage, OutboundMessage};

use crate::state::AppState;

/// Connection query parameters. Authentication happens upstream; the
/// dispatch engine only needs to know who is listening.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// The connecting user (customer, contractor, or admin).
    pub user_id: Uuid,
}

/// Upgrade handler for `GET /ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.user_id))
}

/// Drive one WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (mut sink, mut stream) = socket.split();
    let (handle, mut outbound) = state.hub.register(user_id);
    let conn_id = handle.id;

    // Forward hub messages to the socket.
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize outbound message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Process client messages until disconnect.
    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str(text.as_str()) {
                Ok(inbound) => handle_inbound(&state, &handle, inbound).await,
                Err(e) => {
                    handle.send(OutboundMessage::Error {
                        code: "INVALID_MESSAGE".to_string(),
                        message: format!("Failed to parse message: {e}"),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.hub.unregister(&conn_id).await;
    writer.abort();
    debug!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Dispatch one inbound message.
async fn handle_inbound(state: &AppState, handle: &Arc<ConnectionHandle>, msg: InboundMessage) {
    match msg {
        InboundMessage::JoinRoom { room } => match room.parse::<RoomKey>() {
            Ok(key) => {
                if let Err(e) = state.hub.join_room(&handle.id, &key).await {
                    warn!(conn_id = %handle.id, room, error = %e, "Room join failed");
                }
            }
            Err(()) => {
                handle.send(OutboundMessage::Error {
                    code: "UNKNOWN_ROOM".to_string(),
                    message: format!("Unrecognized room name: {room}"),
                });
            }
        },
        InboundMessage::LeaveRoom { room } => {
            if let Ok(key) = room.parse::<RoomKey>() {
                state.hub.leave_room(&handle.id, &key).await;
            }
        }
        InboundMessage::Pong { .. } => {}
    }
}
