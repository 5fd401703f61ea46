//! WebSocket handler: per-room pixel relay.
//!
//! DESIGN
//! ======
//! On upgrade, joins the room, sends the snapshot, and enters a `select!`
//! loop:
//! - Incoming client messages → parse + apply to the room
//! - Broadcasts from room members (own echoes included) → forward to client
//!
//! Malformed text is answered with an `error` message; the connection stays
//! open. Binary frames are ignored. A client evicted by the room for falling
//! behind is disconnected and must reconnect for a fresh snapshot.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use board::session::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::room;
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// What the connection loop owes the sender after one inbound message.
/// Room broadcasts happen inside the service and reach the sender through its
/// outbox like any other member.
#[derive(Debug, PartialEq)]
enum Outcome {
    Done,
    Reply(ServerMessage),
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(Path(room_name): Path<String>, State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if let Err(err) = room::validate_room_name(&room_name) {
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }
    ws.on_upgrade(move |socket| run_ws(socket, state, room_name))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, room_name: String) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(state.outbox_capacity);

    let snapshot = match room::join_room(&state, &room_name, client_id, client_tx).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(%client_id, error = %err, "ws: join failed");
            return;
        }
    };
    info!(%client_id, room = %room_name, "ws: client connected");

    if send_message(&mut socket, &snapshot).await.is_err() {
        room::part_room(&state, &room_name, client_id).await;
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let outcome = process_inbound_text(&state, &room_name, client_id, text.as_str()).await;
                        if let Outcome::Reply(reply) = outcome {
                            if send_message(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            message = client_rx.recv() => {
                // Closed when the room evicted this client.
                let Some(message) = message else { break };
                if send_message(&mut socket, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    room::part_room(&state, &room_name, client_id).await;
    info!(%client_id, room = %room_name, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

async fn process_inbound_text(state: &AppState, room_name: &str, client_id: Uuid, text: &str) -> Outcome {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            debug!(%client_id, error = %err, "ws: malformed client message");
            return Outcome::Reply(ServerMessage::Error { message: format!("malformed message: {err}") });
        }
    };

    let result = match message {
        ClientMessage::SetPixels { pixels } => room::apply_pixels(state, room_name, client_id, pixels).await,
        ClientMessage::SetSelectedColor { color } => room::set_selected_color(state, room_name, client_id, color).await,
    };

    match result {
        Ok(()) => Outcome::Done,
        Err(err) => {
            warn!(%client_id, error = %err, "ws: message rejected");
            Outcome::Reply(ServerMessage::Error { message: err.to_string() })
        }
    }
}

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "ws: failed to serialize message");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;
