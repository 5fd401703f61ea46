//! Room service: membership, merge, and fan-out.
//!
//! Every mutation merges into the room's grid first, then is broadcast to
//! all members including the sender. The echo is the sender's confirmation
//! that the relay accepted the write.

use board::grid::{CellColor, PixelPatch};
use board::session::ServerMessage;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{AppState, RoomState};

const MAX_ROOM_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("invalid room name: {0:?}")]
    InvalidName(String),
    #[error("room not found: {0}")]
    NotFound(String),
}

/// Room names are path segments: 1-64 chars of `[A-Za-z0-9_-]`.
pub fn validate_room_name(name: &str) -> Result<(), RoomError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_ROOM_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(()) } else { Err(RoomError::InvalidName(name.to_owned())) }
}

/// Register a client in a room, creating the room on first join. Returns the
/// snapshot the client should start from.
pub async fn join_room(
    state: &AppState,
    room: &str,
    client_id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
) -> Result<ServerMessage, RoomError> {
    validate_room_name(room)?;
    let mut rooms = state.rooms.write().await;
    let entry = rooms.entry(room.to_owned()).or_insert_with(RoomState::new);
    entry.clients.insert(client_id, tx);
    info!(%client_id, room, members = entry.clients.len(), "room: client joined");
    Ok(ServerMessage::Snapshot { pixels: entry.pixels.snapshot(), selected_color: entry.selected_color.clone() })
}

/// Remove a client from a room. The room and its grid stay in memory.
pub async fn part_room(state: &AppState, room: &str, client_id: Uuid) {
    let mut rooms = state.rooms.write().await;
    if let Some(entry) = rooms.get_mut(room) {
        entry.clients.remove(&client_id);
        info!(%client_id, room, members = entry.clients.len(), "room: client left");
    }
}

/// Merge cell writes and fan them out. Empty patches are not broadcast.
pub async fn apply_pixels(state: &AppState, room: &str, from: Uuid, pixels: PixelPatch) -> Result<(), RoomError> {
    if pixels.is_empty() {
        return Ok(());
    }
    let mut rooms = state.rooms.write().await;
    let entry = rooms.get_mut(room).ok_or_else(|| RoomError::NotFound(room.to_owned()))?;
    entry.pixels.apply_remote(&pixels);
    broadcast(entry, &ServerMessage::PixelsUpdated { from, pixels }, None);
    Ok(())
}

pub async fn set_selected_color(state: &AppState, room: &str, from: Uuid, color: CellColor) -> Result<(), RoomError> {
    let mut rooms = state.rooms.write().await;
    let entry = rooms.get_mut(room).ok_or_else(|| RoomError::NotFound(room.to_owned()))?;
    entry.selected_color = Some(color.clone());
    broadcast(entry, &ServerMessage::SelectedColorChanged { from, color }, None);
    Ok(())
}

/// Send a message to every member of a room, optionally skipping one.
///
/// A client whose outbox is full or closed is evicted: it has missed a write
/// and can only converge again by reconnecting for a fresh snapshot. Dropping
/// its sender ends its connection loop.
pub fn broadcast(room: &mut RoomState, message: &ServerMessage, exclude: Option<Uuid>) {
    let mut evicted = Vec::new();
    for (client_id, tx) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        match tx.try_send(message.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(%client_id, "room: outbox full, evicting client");
                evicted.push(*client_id);
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%client_id, "room: outbox closed, evicting client");
                evicted.push(*client_id);
            }
        }
    }
    for client_id in evicted {
        room.clients.remove(&client_id);
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;
