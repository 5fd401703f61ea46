//! Shared numeric constants for the board crate.

// ── Board ───────────────────────────────────────────────────────

/// Width and height of the board, in cells.
pub const BOARD_SIZE: i32 = 500;

/// Color token for an unpainted cell.
pub const BACKGROUND_HEX: &str = "#111";

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed scale (screen pixels per cell).
pub const MIN_SCALE: f64 = 3.0;

/// Largest allowed scale (screen pixels per cell).
pub const MAX_SCALE: f64 = 40.0;

/// Scale a fresh viewport starts at.
pub const INITIAL_SCALE: f64 = 8.0;

/// Default viewport size in CSS pixels, used until the host reports one.
pub const DEFAULT_VIEWPORT_PX: f64 = 550.0;

// ── Input ───────────────────────────────────────────────────────

/// Net pointer travel, in screen pixels, below which a pan counts as a click.
pub const DRAG_THRESHOLD_PX: f64 = 4.0;

// ── Ledger actions ──────────────────────────────────────────────

/// Radius used for every area-effect request.
pub const AREA_EFFECT_RADIUS: u32 = 3;

// ── Effects ─────────────────────────────────────────────────────

/// Fixed period of the effect tick, in milliseconds (20 FPS).
pub const TICK_MS: f64 = 50.0;

/// Lifetime of a burst, in milliseconds.
pub const BURST_TTL_MS: f64 = 5000.0;

/// Time for a target highlight to reach full urgency, in milliseconds.
pub const HIGHLIGHT_URGENCY_MS: f64 = 5000.0;

/// Lifetime of a user-visible notice, in milliseconds.
pub const NOTICE_TTL_MS: f64 = 3000.0;

// ── Reference overlay ───────────────────────────────────────────

/// Side length of the reference overlay, in cells.
pub const OVERLAY_SIZE_CELLS: u32 = 25;

/// Default opacity of the reference overlay.
pub const OVERLAY_DEFAULT_OPACITY: f32 = 0.4;

/// Default board position of the overlay's top-left corner.
pub const OVERLAY_DEFAULT_ORIGIN: f64 = 5.0;

// ── Export ──────────────────────────────────────────────────────

/// Output pixels per cell when rasterizing a sub-region.
pub const EXPORT_CELL_PX: u32 = 10;

// ── Reconciler ──────────────────────────────────────────────────

/// How many confirmed-event keys are remembered for duplicate suppression.
pub const SEEN_EVENT_CAPACITY: usize = 4096;
