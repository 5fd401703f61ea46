//! Input model: pointer buttons, wheel deltas, and the interaction mode state machine.
//!
//! Exactly one [`InteractionMode`] is active at a time. Each variant carries
//! only the gesture context it needs, so combinations such as "panning while
//! area-selecting" cannot be represented. Pointer handlers consume raw screen
//! points and produce [`Intent`]s; the engine applies those intents to the
//! viewport, the overlay, and the selection.
//!
//! `Locked` pre-empts every gesture while a mutating ledger action is in
//! flight. In that mode pointer events only refresh the hovered cell.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use tracing::debug;

use crate::consts::{BOARD_SIZE, DRAG_THRESHOLD_PX};
use crate::grid::BoardCoordinate;
use crate::overlay::ReferenceOverlay;
use crate::viewport::{Point, Viewport};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

impl WheelDelta {
    /// One zoom step: scrolling down zooms out, anything else zooms in.
    #[must_use]
    pub fn zoom_direction(self) -> f64 {
        if self.dy > 0.0 { -1.0 } else { 1.0 }
    }
}

/// A rectangle of cells, inclusive of both dragged corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SelectionRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl SelectionRect {
    /// The rectangle spanned by two corner cells, in either order.
    #[must_use]
    pub fn from_corners(a: BoardCoordinate, b: BoardCoordinate) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self { x, y, width: (a.x - b.x).abs() + 1, height: (a.y - b.y).abs() + 1 }
    }

    /// Whether the rectangle lies entirely on the board.
    #[must_use]
    pub fn is_within_board(&self) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.x.saturating_add(self.width) <= BOARD_SIZE
            && self.y.saturating_add(self.height) <= BOARD_SIZE
    }
}

/// The active gesture. One variant at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging the board.
    Panning {
        /// Where the pointer went down, used to tell a click from a drag.
        origin: Point,
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
        /// Set once the pointer strays beyond the drag threshold; never cleared.
        dragged: bool,
    },
    /// Dragging the reference overlay.
    OverlayDragging {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// Sweeping out a rectangle of cells.
    AreaSelecting {
        /// Corner cell where the sweep started.
        anchor: BoardCoordinate,
        /// Corner cell under the pointer.
        current: BoardCoordinate,
    },
    /// A mutating ledger action is in flight; gestures are refused.
    Locked,
}

/// What a pointer event asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// The hovered cell changed (`None` when off the board).
    Hover(Option<BoardCoordinate>),
    /// Pan the viewport by a screen-space delta.
    PanBy(Point),
    /// Move the reference overlay by a delta in cells.
    MoveOverlay(Point),
    /// A click without drag selected this cell for painting.
    PaintSelect(BoardCoordinate),
    /// The in-progress area selection changed.
    SelectionChanged(SelectionRect),
    /// The user released an area selection.
    AreaSelected(SelectionRect),
}

/// Gesture arbiter. Owns the active mode, the area-select arm, and the hover cell.
#[derive(Debug, Clone, Default)]
pub struct InteractionFsm {
    mode: InteractionMode,
    area_select_armed: bool,
    hover: Option<BoardCoordinate>,
}

impl InteractionFsm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self.mode, InteractionMode::Locked)
    }

    #[must_use]
    pub fn hover(&self) -> Option<BoardCoordinate> {
        self.hover
    }

    #[must_use]
    pub fn is_area_select_armed(&self) -> bool {
        self.area_select_armed
    }

    /// The rectangle currently being swept, if any.
    #[must_use]
    pub fn selection(&self) -> Option<SelectionRect> {
        match self.mode {
            InteractionMode::AreaSelecting { anchor, current } => Some(SelectionRect::from_corners(anchor, current)),
            _ => None,
        }
    }

    /// Make the next pointer-down on the board start an area selection.
    pub fn arm_area_select(&mut self) {
        self.area_select_armed = true;
    }

    pub fn disarm_area_select(&mut self) {
        self.area_select_armed = false;
    }

    /// Force `Locked`, discarding whatever gesture was in progress.
    pub fn lock(&mut self) {
        if !self.is_locked() {
            debug!(from = ?self.mode, "input: locked");
        }
        self.mode = InteractionMode::Locked;
    }

    /// Leave `Locked` for `Idle`. No effect in any other mode.
    pub fn unlock(&mut self) {
        if self.is_locked() {
            debug!("input: unlocked");
            self.mode = InteractionMode::Idle;
        }
    }

    pub fn on_pointer_down(
        &mut self,
        screen: Point,
        button: Button,
        viewport: &Viewport,
        overlay: Option<&ReferenceOverlay>,
    ) -> Vec<Intent> {
        let mut intents = self.track_hover(screen, viewport);
        if button != Button::Primary || !matches!(self.mode, InteractionMode::Idle) {
            return intents;
        }

        let world = viewport.to_world(screen);
        let over_overlay = overlay.is_some_and(|o| o.contains(world));
        let cell = viewport.cell_at(screen);

        self.mode = if over_overlay {
            InteractionMode::OverlayDragging { last_screen: screen }
        } else if let (true, Some(anchor)) = (self.area_select_armed, cell) {
            self.area_select_armed = false;
            intents.push(Intent::SelectionChanged(SelectionRect::from_corners(anchor, anchor)));
            InteractionMode::AreaSelecting { anchor, current: anchor }
        } else {
            InteractionMode::Panning { origin: screen, last_screen: screen, dragged: false }
        };
        intents
    }

    pub fn on_pointer_move(&mut self, screen: Point, viewport: &Viewport) -> Vec<Intent> {
        let mut intents = self.track_hover(screen, viewport);
        match &mut self.mode {
            InteractionMode::Panning { origin, last_screen, dragged } => {
                // Dragging right reveals cells to the left, so the pan delta is reversed.
                let delta = Point::new(last_screen.x - screen.x, last_screen.y - screen.y);
                *last_screen = screen;
                if (screen.x - origin.x).hypot(screen.y - origin.y) > DRAG_THRESHOLD_PX {
                    *dragged = true;
                }
                intents.push(Intent::PanBy(delta));
            }
            InteractionMode::OverlayDragging { last_screen } => {
                let scale = viewport.scale();
                let delta = Point::new((screen.x - last_screen.x) / scale, (screen.y - last_screen.y) / scale);
                *last_screen = screen;
                intents.push(Intent::MoveOverlay(delta));
            }
            InteractionMode::AreaSelecting { anchor, current } => {
                if let Some(cell) = viewport.cell_at(screen) {
                    if cell != *current {
                        *current = cell;
                        intents.push(Intent::SelectionChanged(SelectionRect::from_corners(*anchor, cell)));
                    }
                }
            }
            InteractionMode::Idle | InteractionMode::Locked => {}
        }
        intents
    }

    pub fn on_pointer_up(&mut self, screen: Point, button: Button, viewport: &Viewport) -> Vec<Intent> {
        let mut intents = self.track_hover(screen, viewport);
        if button != Button::Primary {
            return intents;
        }
        match self.mode {
            InteractionMode::Panning { dragged, .. } => {
                self.mode = InteractionMode::Idle;
                if !dragged {
                    if let Some(cell) = viewport.cell_at(screen) {
                        intents.push(Intent::PaintSelect(cell));
                    }
                }
            }
            InteractionMode::OverlayDragging { .. } => {
                self.mode = InteractionMode::Idle;
            }
            InteractionMode::AreaSelecting { anchor, current } => {
                self.mode = InteractionMode::Idle;
                intents.push(Intent::AreaSelected(SelectionRect::from_corners(anchor, current)));
            }
            InteractionMode::Idle | InteractionMode::Locked => {}
        }
        intents
    }

    /// Clear hover when the pointer leaves the canvas.
    pub fn on_pointer_leave(&mut self) -> Vec<Intent> {
        if self.hover.take().is_some() { vec![Intent::Hover(None)] } else { Vec::new() }
    }

    fn track_hover(&mut self, screen: Point, viewport: &Viewport) -> Vec<Intent> {
        let cell = viewport.cell_at(screen);
        if cell == self.hover {
            return Vec::new();
        }
        self.hover = cell;
        vec![Intent::Hover(cell)]
    }
}
