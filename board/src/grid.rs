//! Grid model: board coordinates, cell colors, and the shared cell store.
//!
//! The grid is sparse. Only painted cells have an entry; an absent key reads
//! as [`CellColor::background`]. Every key is inside the board, so callers can
//! hand the store raw coordinates and let it drop the ones that fall outside.
//!
//! Optimistic writes (made before the ledger confirms anything) and
//! authoritative writes (derived from confirmed ledger events) share one merge
//! rule: the write that arrives last wins, per cell. There is no version
//! tracking. An authoritative write for an action always arrives after that
//! action's own optimistic guess, and every write sets a cell to a fixed
//! color, so replaying either one any number of times lands on the same grid.
//!
//! Every local write returns a [`PixelPatch`] for the host to publish on the
//! realtime channel. Patches received from the channel come back in through
//! [`GridStore::apply_remote`].

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{BACKGROUND_HEX, BOARD_SIZE};

/// A cell on the board. Both components are in `[0, BOARD_SIZE)` when built
/// through [`BoardCoordinate::new`].
///
/// On the wire and as a map key the coordinate is the string `"x,y"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BoardCoordinate {
    pub x: i32,
    pub y: i32,
}

impl BoardCoordinate {
    /// Build a coordinate, returning `None` when it falls outside the board.
    #[must_use]
    pub fn new(x: i32, y: i32) -> Option<Self> {
        in_bounds(x, y).then_some(Self { x, y })
    }

    /// Build a coordinate from wide integers, as carried by ledger events.
    #[must_use]
    pub fn from_wide(x: i64, y: i64) -> Option<Self> {
        let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
            return None;
        };
        Self::new(x, y)
    }
}

/// Returns `true` if `(x, y)` is a cell on the board.
#[must_use]
pub fn in_bounds(x: i32, y: i32) -> bool {
    (0..BOARD_SIZE).contains(&x) && (0..BOARD_SIZE).contains(&y)
}

impl fmt::Display for BoardCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Error returned when a `"x,y"` key does not name a board cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell key: {0:?}")]
pub struct InvalidCellKey(pub String);

impl FromStr for BoardCoordinate {
    type Err = InvalidCellKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCellKey(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse::<i32>().map_err(|_| invalid())?;
        let y = y.trim().parse::<i32>().map_err(|_| invalid())?;
        Self::new(x, y).ok_or_else(invalid)
    }
}

impl From<BoardCoordinate> for String {
    fn from(coord: BoardCoordinate) -> Self {
        coord.to_string()
    }
}

impl TryFrom<String> for BoardCoordinate {
    type Error = InvalidCellKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An opaque color token, normally a CSS hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellColor(String);

impl CellColor {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token for an unpainted cell.
    #[must_use]
    pub fn background() -> Self {
        Self(BACKGROUND_HEX.to_string())
    }

    #[must_use]
    pub fn is_background(&self) -> bool {
        self.0.eq_ignore_ascii_case(BACKGROUND_HEX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the token as `#rgb`, `#rrggbb`, or `#rrggbbaa` into RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidColor`] for any other token.
    pub fn to_rgba(&self) -> Result<[u8; 4], InvalidColor> {
        let invalid = || InvalidColor(self.0.clone());
        let hex = self.0.strip_prefix('#').filter(|hex| hex.is_ascii()).ok_or_else(invalid)?;
        let digits = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| invalid());
        let nibble = |i: usize| digits(i..i + 1).map(|v| v * 17);
        let byte = |i: usize| digits(i..i + 2);
        match hex.len() {
            3 => Ok([nibble(0)?, nibble(1)?, nibble(2)?, 255]),
            6 => Ok([byte(0)?, byte(2)?, byte(4)?, 255]),
            8 => Ok([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
            _ => Err(invalid()),
        }
    }
}

/// Error returned when a color token is not a hex color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color token: {0:?}")]
pub struct InvalidColor(pub String);

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellColor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A set of cell writes, the unit of publication on the realtime channel.
///
/// Background writes are carried explicitly so receivers clear the cell.
pub type PixelPatch = BTreeMap<BoardCoordinate, CellColor>;

/// The exact set of cells touched by an area effect centered on `(cx, cy)`.
///
/// A cell `(cx + dx, cy + dy)` is included when `dx² + dy² ≤ radius²`, which
/// is the integer form of `sqrt(dx² + dy²) ≤ radius`. The same function serves
/// the optimistic pre-clear and the authoritative confirmation, so both touch
/// identical cells. Cells off the board are left out; the center itself may be
/// off the board.
#[must_use]
pub fn area_cells(cx: i64, cy: i64, radius: u32) -> BTreeSet<BoardCoordinate> {
    let r = i64::from(radius);
    let r_sq = i128::from(r) * i128::from(r);
    let max = i64::from(BOARD_SIZE) - 1;

    let x_lo = cx.saturating_sub(r).max(0);
    let x_hi = cx.saturating_add(r).min(max);
    let y_lo = cy.saturating_sub(r).max(0);
    let y_hi = cy.saturating_add(r).min(max);

    let mut cells = BTreeSet::new();
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            let dx = i128::from(x) - i128::from(cx);
            let dy = i128::from(y) - i128::from(cy);
            if dx * dx + dy * dy <= r_sq {
                if let Some(coord) = BoardCoordinate::from_wide(x, y) {
                    cells.insert(coord);
                }
            }
        }
    }
    cells
}

/// The canonical cell-color map shared by every connected client.
#[derive(Debug, Clone, Default)]
pub struct GridStore {
    cells: HashMap<BoardCoordinate, CellColor>,
}

impl GridStore {
    /// Create an empty (all background) grid.
    #[must_use]
    pub fn new() -> Self {
        Self { cells: HashMap::new() }
    }

    /// Write `color` into every key before confirmation. Returns the patch to
    /// publish; nothing waits for an acknowledgement.
    pub fn apply_optimistic<I>(&mut self, keys: I, color: &CellColor) -> PixelPatch
    where
        I: IntoIterator<Item = BoardCoordinate>,
    {
        self.write_all(keys, color)
    }

    /// Write `color` into every key on behalf of a confirmed ledger event.
    ///
    /// Same path as [`GridStore::apply_optimistic`]: last arrival wins.
    pub fn apply_authoritative<I>(&mut self, keys: I, color: &CellColor) -> PixelPatch
    where
        I: IntoIterator<Item = BoardCoordinate>,
    {
        self.write_all(keys, color)
    }

    /// Merge a patch received from the realtime channel, in arrival order.
    pub fn apply_remote(&mut self, patch: &PixelPatch) {
        for (coord, color) in patch {
            self.write(*coord, color);
        }
    }

    /// Replace the whole grid with a channel snapshot.
    pub fn load_snapshot(&mut self, snapshot: &PixelPatch) {
        self.cells.clear();
        self.apply_remote(snapshot);
    }

    /// Color of a cell, [`CellColor::background`] when unpainted or off the board.
    #[must_use]
    pub fn read(&self, coord: BoardCoordinate) -> CellColor {
        self.cells.get(&coord).cloned().unwrap_or_else(CellColor::background)
    }

    /// Borrowing lookup. `None` means background.
    #[must_use]
    pub fn get(&self, coord: BoardCoordinate) -> Option<&CellColor> {
        self.cells.get(&coord)
    }

    /// Iterate over painted cells in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&BoardCoordinate, &CellColor)> {
        self.cells.iter()
    }

    /// The painted cells as an ordered patch, e.g. for seeding a new peer.
    #[must_use]
    pub fn snapshot(&self) -> PixelPatch {
        self.cells.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    /// Number of painted cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no cell is painted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn write_all<I>(&mut self, keys: I, color: &CellColor) -> PixelPatch
    where
        I: IntoIterator<Item = BoardCoordinate>,
    {
        let mut patch = PixelPatch::new();
        for coord in keys {
            if self.write(coord, color) {
                patch.insert(coord, color.clone());
            }
        }
        patch
    }

    /// Store one cell. Returns false for keys outside the board, which are ignored.
    fn write(&mut self, coord: BoardCoordinate, color: &CellColor) -> bool {
        if !in_bounds(coord.x, coord.y) {
            return false;
        }
        if color.is_background() {
            self.cells.remove(&coord);
        } else {
            self.cells.insert(coord, color.clone());
        }
        true
    }
}
