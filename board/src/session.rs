//! Wire messages exchanged with the realtime relay.
//!
//! JSON text frames tagged by `type`. Pixel maps use `"x,y"` keys; keys that
//! do not name a board cell are dropped while decoding instead of failing the
//! whole message.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::grid::{BoardCoordinate, CellColor, PixelPatch};

/// Client → relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Merge cell writes into the shared grid.
    SetPixels {
        #[serde(deserialize_with = "lenient_patch")]
        pixels: PixelPatch,
    },
    /// Replace the shared selected color.
    SetSelectedColor { color: CellColor },
}

/// Relay → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full room state, sent once on join.
    Snapshot {
        #[serde(deserialize_with = "lenient_patch")]
        pixels: PixelPatch,
        selected_color: Option<CellColor>,
    },
    /// Another member (or this client, echoed) wrote cells.
    PixelsUpdated {
        from: Uuid,
        #[serde(deserialize_with = "lenient_patch")]
        pixels: PixelPatch,
    },
    SelectedColorChanged { from: Uuid, color: CellColor },
    /// The last frame from this client could not be handled.
    Error { message: String },
}

fn lenient_patch<'de, D>(deserializer: D) -> Result<PixelPatch, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, CellColor>::deserialize(deserializer)?;
    let mut patch = PixelPatch::new();
    for (key, color) in raw {
        match key.parse::<BoardCoordinate>() {
            Ok(coord) => {
                patch.insert(coord, color);
            }
            Err(err) => debug!(error = %err, "session: dropped pixel key"),
        }
    }
    Ok(patch)
}
