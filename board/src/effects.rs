//! Transient visual effects tied to ledger actions.
//!
//! Two entity kinds live here. A target highlight marks the area a pending
//! area-effect request will clear, growing more urgent while the user confirms
//! the transaction in their wallet. A burst plays once an area effect is
//! confirmed, either locally or by another participant.
//!
//! The manager keeps its own clock, advanced only by [`EffectOverlayManager::tick`].
//! It never touches the grid or the viewport; [`EffectOverlayManager::placements`]
//! reads the viewport to project entities onto the screen.

#[cfg(test)]
#[path = "effects_test.rs"]
mod effects_test;

use tracing::debug;

use crate::consts::{BURST_TTL_MS, HIGHLIGHT_URGENCY_MS};
use crate::grid::BoardCoordinate;
use crate::viewport::{Point, Viewport};

/// Monotonic id assigned to every pending ledger action.
pub type ActionId = u64;

/// Center cell of an effect. Unlike [`BoardCoordinate`] it may lie off the
/// board, since confirmed events can name any center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectCenter {
    pub x: i64,
    pub y: i64,
}

impl EffectCenter {
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// World-space center of the cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_point(self) -> Point {
        Point::new(self.x as f64 + 0.5, self.y as f64 + 0.5)
    }
}

impl From<BoardCoordinate> for EffectCenter {
    fn from(coord: BoardCoordinate) -> Self {
        Self { x: i64::from(coord.x), y: i64::from(coord.y) }
    }
}

/// How far along a target highlight is, as shown in its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStage {
    Targeting,
    Confirm,
    Urgent,
}

impl HighlightStage {
    #[must_use]
    pub fn for_urgency(urgency: f64) -> Self {
        if urgency < 0.3 {
            Self::Targeting
        } else if urgency < 0.7 {
            Self::Confirm
        } else {
            Self::Urgent
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Targeting => "TARGETING",
            Self::Confirm => "CONFIRM",
            Self::Urgent => "PLEASE CONFIRM",
        }
    }
}

/// A live effect.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectEntity {
    /// Marks the target of an in-flight area-effect request.
    TargetHighlight { pending_id: ActionId, center: EffectCenter, radius: u32, started_at: f64 },
    /// Plays after an area effect is confirmed; removed once `ttl` elapses.
    Burst { center: EffectCenter, radius: u32, spawned_at: f64, ttl: f64 },
}

impl EffectEntity {
    #[must_use]
    pub fn center(&self) -> EffectCenter {
        match self {
            Self::TargetHighlight { center, .. } | Self::Burst { center, .. } => *center,
        }
    }

    #[must_use]
    pub fn radius(&self) -> u32 {
        match self {
            Self::TargetHighlight { radius, .. } | Self::Burst { radius, .. } => *radius,
        }
    }

    /// Highlight urgency in `[0, 1]`, or burst progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, now_ms: f64) -> f64 {
        let (start, span) = match self {
            Self::TargetHighlight { started_at, .. } => (*started_at, HIGHLIGHT_URGENCY_MS),
            Self::Burst { spawned_at, ttl, .. } => (*spawned_at, *ttl),
        };
        if span <= 0.0 {
            return 1.0;
        }
        ((now_ms - start) / span).clamp(0.0, 1.0)
    }

    fn is_expired(&self, now_ms: f64) -> bool {
        match self {
            Self::TargetHighlight { .. } => false,
            Self::Burst { spawned_at, ttl, .. } => now_ms - spawned_at >= *ttl,
        }
    }
}

/// What kind of entity a placement draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Highlight(HighlightStage),
    Burst,
}

/// An entity projected onto the screen for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectPlacement {
    pub kind: PlacementKind,
    /// Screen position of the center cell's midpoint.
    pub center: Point,
    /// Radius in screen pixels, reaching the outer edge of the ring of cells.
    pub radius_px: f64,
    /// Urgency for highlights, progress for bursts.
    pub progress: f64,
}

/// Owns every live effect entity and the clock they age against.
#[derive(Debug, Clone, Default)]
pub struct EffectOverlayManager {
    now_ms: f64,
    entities: Vec<EffectEntity>,
}

impl EffectOverlayManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager clock in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    #[must_use]
    pub fn entities(&self) -> &[EffectEntity] {
        &self.entities
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether a highlight for `id` is live.
    #[must_use]
    pub fn has_pending(&self, id: ActionId) -> bool {
        self.highlight_index(id).is_some()
    }

    /// Start highlighting the target of a pending action. A highlight already
    /// registered under `id` is replaced.
    pub fn begin_pending(&mut self, id: ActionId, center: EffectCenter, radius: u32) -> EffectEntity {
        if let Some(idx) = self.highlight_index(id) {
            self.entities.remove(idx);
        }
        let entity = EffectEntity::TargetHighlight { pending_id: id, center, radius, started_at: self.now_ms };
        self.entities.push(entity.clone());
        entity
    }

    /// Turn the highlight for `id` into a burst at the same place.
    ///
    /// Returns `false` when no highlight is registered under `id`.
    pub fn resolve_success(&mut self, id: ActionId) -> bool {
        let Some(idx) = self.highlight_index(id) else {
            return false;
        };
        let center = self.entities[idx].center();
        let radius = self.entities[idx].radius();
        self.entities[idx] = EffectEntity::Burst { center, radius, spawned_at: self.now_ms, ttl: BURST_TTL_MS };
        debug!(id, "effects: highlight resolved into burst");
        true
    }

    /// Drop the highlight for `id` without a burst.
    pub fn resolve_failure(&mut self, id: ActionId) -> bool {
        let Some(idx) = self.highlight_index(id) else {
            return false;
        };
        self.entities.remove(idx);
        debug!(id, "effects: highlight cancelled");
        true
    }

    /// Start a burst with the default lifetime.
    pub fn spawn_burst(&mut self, center: EffectCenter, radius: u32) {
        self.spawn_burst_with_ttl(center, radius, BURST_TTL_MS);
    }

    pub fn spawn_burst_with_ttl(&mut self, center: EffectCenter, radius: u32, ttl: f64) {
        self.entities.push(EffectEntity::Burst { center, radius, spawned_at: self.now_ms, ttl });
    }

    /// Advance the clock and drop bursts whose age has reached their TTL.
    ///
    /// Returns `true` when anything is live or was removed, i.e. a redraw is
    /// due. Negative and non-finite steps leave the clock where it is.
    pub fn tick(&mut self, dt_ms: f64) -> bool {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.now_ms += dt_ms;
        }
        let before = self.entities.len();
        let now = self.now_ms;
        self.entities.retain(|e| !e.is_expired(now));
        before > 0
    }

    /// Project every live entity onto the screen.
    #[must_use]
    pub fn placements(&self, viewport: &Viewport) -> Vec<EffectPlacement> {
        self.entities
            .iter()
            .map(|entity| {
                let progress = entity.progress(self.now_ms);
                let kind = match entity {
                    EffectEntity::TargetHighlight { .. } => {
                        PlacementKind::Highlight(HighlightStage::for_urgency(progress))
                    }
                    EffectEntity::Burst { .. } => PlacementKind::Burst,
                };
                EffectPlacement {
                    kind,
                    center: viewport.to_screen(entity.center().world_point()),
                    radius_px: (f64::from(entity.radius()) + 0.5) * viewport.scale(),
                    progress,
                }
            })
            .collect()
    }

    fn highlight_index(&self, id: ActionId) -> Option<usize> {
        self.entities
            .iter()
            .position(|e| matches!(e, EffectEntity::TargetHighlight { pending_id, .. } if *pending_id == id))
    }
}
