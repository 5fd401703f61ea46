//! Engine core: the single handler surface the host event loop calls.
//!
//! Every entry point takes `&mut self`, updates the owned components, and
//! returns [`Action`]s for the host to carry out. While a ledger action is in
//! flight the input machine is locked and new paints or submissions fail
//! with [`SubmitError::Busy`].

use std::collections::BTreeMap;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::consts::{AREA_EFFECT_RADIUS, EXPORT_CELL_PX};
use crate::effects::{ActionId, EffectCenter, EffectOverlayManager};
use crate::export::{self, ExportError};
use crate::gateway::{GatewayFailure, GatewayRequest, TxReceipt};
use crate::grid::{BoardCoordinate, CellColor, GridStore, PixelPatch, area_cells};
use crate::input::{Button, InteractionFsm, Intent, SelectionRect, WheelDelta};
use crate::notice::{Notice, NoticeBoard, short_hash};
use crate::overlay::ReferenceOverlay;
use crate::palette::DEFAULT_SELECTED_COLOR;
use crate::reconcile::{
    ChainEventReconciler, ConfirmedEffectEvent, EventSource, Identity, Reconciled, SubscriptionToken,
};
use crate::session::ServerMessage;
use crate::viewport::{Point, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from handlers for the host to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send these cell writes to the relay as `set_pixels`.
    PublishPixels(PixelPatch),
    /// Send the selected color to the relay as `set_selected_color`.
    PublishSelectedColor(CellColor),
    /// Run [`crate::gateway::submit`] and report back through
    /// [`EngineCore::on_gateway_result`] with the same id.
    Submit { id: ActionId, request: GatewayRequest },
    /// The in-progress area selection changed.
    SelectionChanged(SelectionRect),
    /// The user released an area selection.
    AreaSelected(SelectionRect),
    ShowNotice(Notice),
    RenderNeeded,
}

/// Why a ledger action could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("another ledger action is in flight")]
    Busy,
    #[error("no cell selected")]
    NoSelection,
    #[error("no wallet connected")]
    Unauthenticated,
}

/// Whether paints go through the ledger or only through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerMode {
    #[default]
    Onchain,
    Offchain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Paint,
    AreaEffect,
    Purchase,
}

/// A ledger action submitted and not yet answered by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub id: ActionId,
    pub kind: PendingKind,
    pub target: Option<BoardCoordinate>,
    /// Zero for anything but area effects.
    pub radius: u32,
    /// Effect clock time at submission.
    pub created_at: f64,
}

/// Core engine state. Every entry point is a `&mut self` handler called from
/// the host's single event loop.
pub struct EngineCore {
    pub grid: GridStore,
    pub viewport: Viewport,
    pub input: InteractionFsm,
    pub effects: EffectOverlayManager,
    pub reconciler: ChainEventReconciler,
    pub notices: NoticeBoard,
    pub overlay: Option<ReferenceOverlay>,
    pub selected_color: CellColor,
    pub selected_cell: Option<BoardCoordinate>,
    pub ledger_mode: LedgerMode,
    pending: BTreeMap<ActionId, PendingAction>,
    next_action_id: ActionId,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            grid: GridStore::new(),
            viewport: Viewport::default(),
            input: InteractionFsm::new(),
            effects: EffectOverlayManager::new(),
            reconciler: ChainEventReconciler::new(),
            notices: NoticeBoard::new(),
            overlay: None,
            selected_color: CellColor::new(DEFAULT_SELECTED_COLOR),
            selected_cell: None,
            ledger_mode: LedgerMode::default(),
            pending: BTreeMap::new(),
            next_action_id: 1,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button) -> Vec<Action> {
        let intents = self.input.on_pointer_down(screen, button, &self.viewport, self.overlay.as_ref());
        self.apply_intents(intents)
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        let intents = self.input.on_pointer_move(screen, &self.viewport);
        self.apply_intents(intents)
    }

    pub fn on_pointer_up(&mut self, screen: Point, button: Button) -> Vec<Action> {
        let intents = self.input.on_pointer_up(screen, button, &self.viewport);
        self.apply_intents(intents)
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        let intents = self.input.on_pointer_leave();
        self.apply_intents(intents)
    }

    /// Zoom one step about the cursor. Ignored while locked.
    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta) -> Vec<Action> {
        if self.input.is_locked() {
            return Vec::new();
        }
        self.viewport.zoom_at(screen, delta.zoom_direction());
        vec![Action::RenderNeeded]
    }

    // --- Viewport ---

    pub fn set_viewport(&mut self, width_px: f64, height_px: f64) -> Vec<Action> {
        self.viewport.resize(width_px, height_px);
        vec![Action::RenderNeeded]
    }

    /// Zoom slider. Ignored while an action is in flight.
    pub fn set_scale(&mut self, scale: f64) -> Vec<Action> {
        if self.input.is_locked() {
            return Vec::new();
        }
        self.viewport.set_scale(scale);
        vec![Action::RenderNeeded]
    }

    // --- Tools ---

    /// Make the next pointer-down on the board start an area selection.
    /// Ignored while locked.
    pub fn arm_area_select(&mut self) {
        if self.input.is_locked() {
            return;
        }
        self.input.arm_area_select();
    }

    pub fn set_ledger_mode(&mut self, mode: LedgerMode) {
        self.ledger_mode = mode;
    }

    /// Install or clear the reference overlay.
    pub fn set_overlay(&mut self, overlay: Option<ReferenceOverlay>) -> Vec<Action> {
        self.overlay = overlay;
        vec![Action::RenderNeeded]
    }

    // --- Ledger actions ---

    /// Pick a color, and paint the selected cell with it if there is one.
    ///
    /// Offchain, the paint is only published to the relay. Onchain, it is also
    /// written optimistically and submitted as a pending paint, which locks
    /// input until the gateway answers.
    ///
    /// # Errors
    ///
    /// Painting fails with [`SubmitError::Busy`] while another action is in
    /// flight, in either ledger mode. Onchain paints also fail with
    /// [`SubmitError::Unauthenticated`] without an identity. Nothing changes
    /// on error.
    pub fn choose_color(&mut self, color: CellColor) -> Result<Vec<Action>, SubmitError> {
        if self.selected_cell.is_some() && self.input.is_locked() {
            return Err(SubmitError::Busy);
        }
        let onchain_paint = self.ledger_mode == LedgerMode::Onchain && self.selected_cell.is_some();
        if onchain_paint {
            self.ensure_can_submit()?;
        }

        self.selected_color = color.clone();
        let mut actions = vec![Action::PublishSelectedColor(color.clone())];

        if let Some(cell) = self.selected_cell {
            let patch = self.grid.apply_optimistic([cell], &color);
            actions.push(Action::PublishPixels(patch));
            if onchain_paint {
                let id = self.begin_pending(PendingKind::Paint, Some(cell), 0);
                let request = GatewayRequest::PlacePixel { x: cell.x, y: cell.y, color: color.as_str().to_string() };
                actions.push(Action::Submit { id, request });
            }
        }
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    /// Target the selected cell with an area effect.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Busy`] while another action is in flight,
    /// [`SubmitError::NoSelection`] with no selected cell, and
    /// [`SubmitError::Unauthenticated`] without an identity.
    pub fn request_area_effect(&mut self) -> Result<Vec<Action>, SubmitError> {
        if self.input.is_locked() {
            return Err(SubmitError::Busy);
        }
        let cell = self.selected_cell.ok_or(SubmitError::NoSelection)?;
        self.ensure_can_submit()?;

        let id = self.begin_pending(PendingKind::AreaEffect, Some(cell), AREA_EFFECT_RADIUS);
        self.effects.begin_pending(id, EffectCenter::from(cell), AREA_EFFECT_RADIUS);
        let request = GatewayRequest::AreaEffect { center_x: cell.x, center_y: cell.y, radius: AREA_EFFECT_RADIUS };
        Ok(vec![Action::Submit { id, request }, Action::RenderNeeded])
    }

    /// Buy one area effect.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Busy`] or [`SubmitError::Unauthenticated`].
    pub fn request_purchase(&mut self) -> Result<Vec<Action>, SubmitError> {
        self.ensure_can_submit()?;
        let id = self.begin_pending(PendingKind::Purchase, None, 0);
        Ok(vec![Action::Submit { id, request: GatewayRequest::PurchaseAreaEffect }, Action::RenderNeeded])
    }

    /// Settle a pending action with the gateway's answer.
    ///
    /// Failures cancel the action and its highlight without touching the grid.
    /// A confirmed area effect turns its highlight into a burst and clears its
    /// area optimistically ahead of the ledger event.
    pub fn on_gateway_result(&mut self, id: ActionId, result: Result<TxReceipt, GatewayFailure>) -> Vec<Action> {
        let Some(pending) = self.pending.remove(&id) else {
            debug!(id, "engine: result for unknown action ignored");
            return Vec::new();
        };

        let mut actions = Vec::new();
        match result {
            Ok(receipt) => {
                info!(id, kind = ?pending.kind, hash = %receipt.hash, "engine: action confirmed by gateway");
                let short = short_hash(&receipt.hash);
                let message = match pending.kind {
                    PendingKind::Paint => format!("Pixel placed tx: {short}"),
                    PendingKind::AreaEffect => format!("Area effect tx: {short}"),
                    PendingKind::Purchase => format!("Area effect purchased tx: {short}"),
                };
                if let (PendingKind::AreaEffect, Some(target)) = (pending.kind, pending.target) {
                    self.effects.resolve_success(id);
                    let cells = area_cells(i64::from(target.x), i64::from(target.y), pending.radius);
                    let patch = self.grid.apply_optimistic(cells, &CellColor::background());
                    actions.push(Action::PublishPixels(patch));
                }
                actions.push(self.notify(Notice::success(message)));
            }
            Err(failure) => {
                warn!(id, kind = ?pending.kind, error = %failure, "engine: action failed");
                self.effects.resolve_failure(id);
                actions.push(self.notify(Notice::error(failure.notice_message())));
            }
        }

        if self.pending.is_empty() {
            self.input.unlock();
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Actions awaiting a gateway answer, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingAction> {
        self.pending.values()
    }

    // --- Relay ---

    /// Apply a message from the realtime relay.
    pub fn on_session_message(&mut self, message: ServerMessage) -> Vec<Action> {
        match message {
            ServerMessage::Snapshot { pixels, selected_color } => {
                self.grid.load_snapshot(&pixels);
                if let Some(color) = selected_color {
                    self.selected_color = color;
                }
            }
            ServerMessage::PixelsUpdated { pixels, .. } => self.grid.apply_remote(&pixels),
            ServerMessage::SelectedColorChanged { color, .. } => self.selected_color = color,
            ServerMessage::Error { message } => {
                warn!(%message, "engine: relay reported an error");
                return Vec::new();
            }
        }
        vec![Action::RenderNeeded]
    }

    // --- Ledger events ---

    /// Switch the local identity, resubscribing to confirmed events.
    pub fn set_identity(&mut self, identity: Option<Identity>, source: &mut dyn EventSource) {
        self.reconciler.set_identity(identity, source);
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.reconciler.identity()
    }

    /// Apply a confirmed area effect delivered on subscription `token`.
    pub fn on_chain_event(&mut self, token: SubscriptionToken, event: &ConfirmedEffectEvent) -> Vec<Action> {
        match self.reconciler.apply(token, event, &mut self.grid, &mut self.effects) {
            Reconciled::Applied { patch, .. } => {
                let mut actions = Vec::new();
                if !patch.is_empty() {
                    actions.push(Action::PublishPixels(patch));
                }
                actions.push(Action::RenderNeeded);
                actions
            }
            Reconciled::Discarded(_) => Vec::new(),
        }
    }

    // --- Time ---

    /// Advance effects and notices by `dt_ms`.
    pub fn tick(&mut self, dt_ms: f64) -> Vec<Action> {
        let effects_live = self.effects.tick(dt_ms);
        let notice_expired = self.notices.tick(dt_ms);
        if effects_live || notice_expired { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Export ---

    /// Rasterize a region of the board for minting.
    ///
    /// # Errors
    ///
    /// See [`export::rasterize`].
    pub fn export_region(&self, rect: SelectionRect) -> Result<RgbaImage, ExportError> {
        export::rasterize(&self.grid, rect, EXPORT_CELL_PX)
    }

    // --- Internals ---

    fn apply_intents(&mut self, intents: Vec<Intent>) -> Vec<Action> {
        if intents.is_empty() {
            return Vec::new();
        }
        let mut actions = Vec::new();
        for intent in intents {
            match intent {
                Intent::Hover(_) => {}
                Intent::PanBy(delta) => self.viewport.pan_by(delta),
                Intent::MoveOverlay(delta) => {
                    if let Some(overlay) = self.overlay.as_mut() {
                        overlay.move_by(delta);
                    }
                }
                Intent::PaintSelect(cell) => self.selected_cell = Some(cell),
                Intent::SelectionChanged(rect) => actions.push(Action::SelectionChanged(rect)),
                Intent::AreaSelected(rect) => actions.push(Action::AreaSelected(rect)),
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    fn ensure_can_submit(&self) -> Result<(), SubmitError> {
        if self.input.is_locked() {
            return Err(SubmitError::Busy);
        }
        if self.reconciler.identity().is_none() {
            return Err(SubmitError::Unauthenticated);
        }
        Ok(())
    }

    /// Register a pending action and lock input until it is answered.
    fn begin_pending(&mut self, kind: PendingKind, target: Option<BoardCoordinate>, radius: u32) -> ActionId {
        let id = self.next_action_id;
        self.next_action_id += 1;
        self.pending.insert(id, PendingAction { id, kind, target, radius, created_at: self.effects.now_ms() });
        self.input.lock();
        debug!(id, ?kind, "engine: action submitted");
        id
    }

    fn notify(&mut self, notice: Notice) -> Action {
        self.notices.show(notice.clone());
        Action::ShowNotice(notice)
    }
}
