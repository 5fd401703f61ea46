//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds every live room. A room is one shared board: its pixel grid, the
//! shared selected color, and the outbox of each connected client. Rooms live
//! for the lifetime of the process; nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use board::grid::{CellColor, GridStore};
use board::session::ServerMessage;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::DEFAULT_OUTBOX_CAPACITY;

// =============================================================================
// ROOM STATE
// =============================================================================

/// Per-room live state.
#[derive(Default)]
pub struct RoomState {
    /// Merged pixel writes, last arrival wins per cell.
    pub pixels: GridStore,
    /// Last selected color anyone published. `None` until the first one.
    pub selected_color: Option<CellColor>,
    /// Connected clients: `client_id` -> sender for outgoing messages.
    pub clients: HashMap<Uuid, mpsc::Sender<ServerMessage>>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
    pub outbox_capacity: usize,
}

impl AppState {
    #[must_use]
    pub fn new(outbox_capacity: usize) -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())), outbox_capacity }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOX_CAPACITY)
    }
}
