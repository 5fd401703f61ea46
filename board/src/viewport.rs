//! Viewport transform: pan, zoom-to-cursor, and screen/world/cell mapping.
//!
//! Scale is screen pixels per cell. The offset is the world point at the
//! screen origin, clamped on every mutation so the view stays on the board.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{BOARD_SIZE, DEFAULT_VIEWPORT_PX, INITIAL_SCALE, MAX_SCALE, MIN_SCALE};
use crate::grid::BoardCoordinate;

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Screen-space rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Half-open range of board cells currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

/// Pan/zoom transform between board cells (world) and CSS pixels (screen).
///
/// `scale` is screen pixels per cell, always within `[MIN_SCALE, MAX_SCALE]`.
/// `offset` is the world coordinate of the viewport's top-left corner and is
/// clamped to `[0, BOARD_SIZE - viewport size in cells]` after every mutation.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    scale: f64,
    offset: Point,
    width_px: f64,
    height_px: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_PX, DEFAULT_VIEWPORT_PX)
    }
}

impl Viewport {
    /// A viewport of the given pixel size at the initial scale, showing the board origin.
    #[must_use]
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self { scale: INITIAL_SCALE, offset: Point::default(), width_px, height_px }
    }

    /// Build a viewport from raw state, clamping both scale and offset.
    #[must_use]
    pub fn with_state(width_px: f64, height_px: f64, scale: f64, offset: Point) -> Self {
        let mut vp = Self { scale: clamp_scale(scale), offset, width_px, height_px };
        vp.offset = vp.clamp_offset(offset);
        vp
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn offset(&self) -> Point {
        self.offset
    }

    #[must_use]
    pub fn size_px(&self) -> (f64, f64) {
        (self.width_px, self.height_px)
    }

    /// Viewport size measured in cells at the current scale.
    #[must_use]
    pub fn size_in_cells(&self) -> (f64, f64) {
        (self.width_px / self.scale, self.height_px / self.scale)
    }

    /// Convert a world point (cells) to screen coordinates.
    #[must_use]
    pub fn to_screen(&self, world: Point) -> Point {
        Point { x: (world.x - self.offset.x) * self.scale, y: (world.y - self.offset.y) * self.scale }
    }

    /// Convert a screen point to world coordinates (fractional cells).
    #[must_use]
    pub fn to_world(&self, screen: Point) -> Point {
        Point { x: screen.x / self.scale + self.offset.x, y: screen.y / self.scale + self.offset.y }
    }

    /// The board cell under a screen point, or `None` when it is off the board.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_at(&self, screen: Point) -> Option<BoardCoordinate> {
        let world = self.to_world(screen);
        if !world.x.is_finite() || !world.y.is_finite() {
            return None;
        }
        let (x, y) = (world.x.floor(), world.y.floor());
        let limit = f64::from(BOARD_SIZE);
        if x < 0.0 || y < 0.0 || x >= limit || y >= limit {
            return None;
        }
        BoardCoordinate::new(x as i32, y as i32)
    }

    /// Screen rectangle covered by a cell.
    #[must_use]
    pub fn cell_rect(&self, coord: BoardCoordinate) -> ScreenRect {
        let origin = self.to_screen(Point::new(f64::from(coord.x), f64::from(coord.y)));
        ScreenRect { x: origin.x, y: origin.y, width: self.scale, height: self.scale }
    }

    /// Cells intersecting the viewport, clamped to the board.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn visible_cells(&self) -> CellRange {
        let (w, h) = self.size_in_cells();
        let limit = f64::from(BOARD_SIZE);
        let start_x = self.offset.x.floor().clamp(0.0, limit);
        let start_y = self.offset.y.floor().clamp(0.0, limit);
        let end_x = (self.offset.x + w).ceil().clamp(0.0, limit);
        let end_y = (self.offset.y + h).ceil().clamp(0.0, limit);
        CellRange {
            start_x: start_x as i32,
            start_y: start_y as i32,
            end_x: end_x as i32,
            end_y: end_y as i32,
        }
    }

    /// Zoom one step about a screen point, keeping the world point under it fixed.
    ///
    /// The world point is captured under the current scale before the scale
    /// changes; reordering these steps makes the board slide under the cursor.
    pub fn zoom_at(&mut self, screen: Point, direction: f64) {
        let world = self.to_world(screen);
        self.scale = clamp_scale(self.scale + direction);
        let target = Point { x: world.x - screen.x / self.scale, y: world.y - screen.y / self.scale };
        self.offset = self.clamp_offset(target);
    }

    /// Pan by a screen-space delta. Positive deltas move the view toward larger cell indices.
    pub fn pan_by(&mut self, screen_delta: Point) {
        let target = Point {
            x: self.offset.x + screen_delta.x / self.scale,
            y: self.offset.y + screen_delta.y / self.scale,
        };
        self.offset = self.clamp_offset(target);
    }

    /// Set the scale directly (zoom slider), keeping the offset in bounds.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = clamp_scale(scale);
        self.offset = self.clamp_offset(self.offset);
    }

    /// Update the viewport's pixel size, keeping the offset in bounds.
    pub fn resize(&mut self, width_px: f64, height_px: f64) {
        self.width_px = width_px.max(0.0);
        self.height_px = height_px.max(0.0);
        self.offset = self.clamp_offset(self.offset);
    }

    fn clamp_offset(&self, target: Point) -> Point {
        let (w, h) = self.size_in_cells();
        Point { x: clamp_axis(target.x, w), y: clamp_axis(target.y, h) }
    }
}

/// Clamp one offset component to `[0, BOARD_SIZE - visible]`. When more than
/// the whole board is visible the upper bound collapses to zero.
fn clamp_axis(value: f64, visible_cells: f64) -> f64 {
    let max = (f64::from(BOARD_SIZE) - visible_cells).max(0.0);
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return MIN_SCALE;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}
