#![allow(clippy::float_cmp)]

use image::DynamicImage;

use super::*;
use crate::consts::TICK_MS;
use crate::effects::EffectEntity;
use crate::input::InteractionMode;

// =============================================================
// Helpers
// =============================================================

#[derive(Default)]
struct NullSource;

impl EventSource for NullSource {
    fn subscribe(&mut self, _identity: &Identity, _token: SubscriptionToken) {}
    fn unsubscribe(&mut self, _token: SubscriptionToken) {}
}

const ALICE: &str = "0xa11ce00000000000000000000000000000000000";
const BOB: &str = "0xb0b0000000000000000000000000000000000000";
const HASH: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcd";

/// 10 px per cell with the board origin at the screen origin.
fn engine() -> EngineCore {
    let mut core = EngineCore::new();
    core.viewport = Viewport::with_state(550.0, 550.0, 10.0, Point::new(0.0, 0.0));
    core
}

fn signed_in() -> EngineCore {
    let mut core = engine();
    core.set_identity(Some(Identity::new(ALICE)), &mut NullSource);
    core
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn cell(x: i32, y: i32) -> BoardCoordinate {
    BoardCoordinate::new(x, y).unwrap()
}

fn click(core: &mut EngineCore, x: f64, y: f64) {
    core.on_pointer_down(pt(x, y), Button::Primary);
    core.on_pointer_up(pt(x, y), Button::Primary);
}

fn submitted_id(actions: &[Action]) -> ActionId {
    actions
        .iter()
        .find_map(|a| match a {
            Action::Submit { id, .. } => Some(*id),
            _ => None,
        })
        .unwrap()
}

fn receipt() -> TxReceipt {
    TxReceipt { hash: HASH.into() }
}

fn has_highlight(core: &EngineCore) -> bool {
    core.effects.entities().iter().any(|e| matches!(e, EffectEntity::TargetHighlight { .. }))
}

fn bursts(core: &EngineCore) -> usize {
    core.effects.entities().iter().filter(|e| matches!(e, EffectEntity::Burst { .. })).count()
}

// =============================================================
// Pointer handling
// =============================================================

#[test]
fn click_selects_cell() {
    let mut core = engine();
    click(&mut core, 105.0, 107.0);
    assert_eq!(core.selected_cell, Some(cell(10, 10)));
}

#[test]
fn drag_pans_viewport_without_selecting() {
    let mut core = engine();
    core.viewport = Viewport::with_state(550.0, 550.0, 10.0, Point::new(100.0, 100.0));
    core.on_pointer_down(pt(200.0, 200.0), Button::Primary);
    core.on_pointer_move(pt(150.0, 180.0));
    core.on_pointer_up(pt(150.0, 180.0), Button::Primary);
    assert_eq!(core.viewport.offset(), Point::new(105.0, 102.0));
    assert!(core.selected_cell.is_none());
}

#[test]
fn wheel_zooms_about_cursor() {
    let mut core = engine();
    core.viewport = Viewport::with_state(550.0, 550.0, 16.0, Point::new(0.0, 0.0));
    let actions = core.on_wheel(pt(100.0, 100.0), WheelDelta { dx: 0.0, dy: -1.0 });
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert_eq!(core.viewport.scale(), 17.0);
    assert!((core.viewport.offset().x - (6.25 - 100.0 / 17.0)).abs() < 1e-9);
}

#[test]
fn overlay_drag_moves_overlay() {
    let mut core = engine();
    core.set_overlay(Some(ReferenceOverlay::from_image(&DynamicImage::new_rgba8(8, 8))));
    core.on_pointer_down(pt(60.0, 60.0), Button::Primary);
    core.on_pointer_move(pt(90.0, 60.0));
    core.on_pointer_up(pt(90.0, 60.0), Button::Primary);
    assert_eq!(core.overlay.as_ref().unwrap().origin(), Point::new(8.0, 5.0));
    assert_eq!(core.viewport.offset(), Point::new(0.0, 0.0));
    assert!(core.selected_cell.is_none());
}

#[test]
fn area_select_reports_rect_and_exports() {
    let mut core = engine();
    core.arm_area_select();
    core.on_pointer_down(pt(20.0, 30.0), Button::Primary);
    let moved = core.on_pointer_move(pt(45.0, 55.0));
    assert!(moved.contains(&Action::SelectionChanged(SelectionRect { x: 2, y: 3, width: 3, height: 3 })));
    let released = core.on_pointer_up(pt(45.0, 55.0), Button::Primary);
    let rect = SelectionRect { x: 2, y: 3, width: 3, height: 3 };
    assert!(released.contains(&Action::AreaSelected(rect)));

    let img = core.export_region(rect).unwrap();
    assert_eq!(img.dimensions(), (30, 30));
}

// =============================================================
// Painting
// =============================================================

#[test]
fn offchain_paint_publishes_without_submitting() {
    let mut core = engine();
    core.set_ledger_mode(LedgerMode::Offchain);
    click(&mut core, 105.0, 105.0);

    let actions = core.choose_color(CellColor::new("#FFD635")).unwrap();

    assert!(actions.contains(&Action::PublishSelectedColor(CellColor::new("#FFD635"))));
    let expected: PixelPatch = [(cell(10, 10), CellColor::new("#FFD635"))].into_iter().collect();
    assert!(actions.contains(&Action::PublishPixels(expected)));
    assert!(!actions.iter().any(|a| matches!(a, Action::Submit { .. })));
    assert_eq!(core.input.mode(), InteractionMode::Idle);
}

#[test]
fn choose_color_without_selection_only_publishes_color() {
    let mut core = engine();
    let actions = core.choose_color(CellColor::new("#000000")).unwrap();
    assert_eq!(actions, vec![Action::PublishSelectedColor(CellColor::new("#000000")), Action::RenderNeeded]);
    assert!(core.grid.is_empty());
}

#[test]
fn onchain_paint_requires_identity_and_changes_nothing() {
    let mut core = engine();
    click(&mut core, 105.0, 105.0);
    let err = core.choose_color(CellColor::new("#FFD635")).unwrap_err();
    assert_eq!(err, SubmitError::Unauthenticated);
    assert_eq!(core.selected_color.as_str(), DEFAULT_SELECTED_COLOR);
    assert!(core.grid.is_empty());
}

#[test]
fn onchain_paint_writes_optimistically_and_locks() {
    let mut core = signed_in();
    click(&mut core, 105.0, 105.0);

    let actions = core.choose_color(CellColor::new("#FFD635")).unwrap();

    assert_eq!(core.grid.read(cell(10, 10)).as_str(), "#FFD635");
    assert!(actions.contains(&Action::Submit {
        id: 1,
        request: GatewayRequest::PlacePixel { x: 10, y: 10, color: "#FFD635".into() },
    }));
    assert!(core.input.is_locked());
    assert_eq!(core.pending().count(), 1);
}

#[test]
fn paint_success_notifies_and_unlocks() {
    let mut core = signed_in();
    click(&mut core, 105.0, 105.0);
    let id = submitted_id(&core.choose_color(CellColor::new("#FFD635")).unwrap());

    let actions = core.on_gateway_result(id, Ok(receipt()));

    assert!(actions.contains(&Action::ShowNotice(Notice::success("Pixel placed tx: 0x1234...abcd"))));
    assert!(!core.input.is_locked());
    assert_eq!(core.pending().count(), 0);
    assert_eq!(core.grid.read(cell(10, 10)).as_str(), "#FFD635");
}

#[test]
fn paint_failure_keeps_optimistic_cell() {
    let mut core = signed_in();
    click(&mut core, 105.0, 105.0);
    let id = submitted_id(&core.choose_color(CellColor::new("#FFD635")).unwrap());

    core.on_gateway_result(id, Err(GatewayFailure::Rejected("denied".into())));

    assert_eq!(core.grid.read(cell(10, 10)).as_str(), "#FFD635");
    assert_eq!(core.notices.current(), Some(&Notice::error("Transaction failed!")));
    assert!(!core.input.is_locked());
}

// =============================================================
// Locked mode
// =============================================================

#[test]
fn locked_blocks_new_pending_actions() {
    let mut core = signed_in();
    click(&mut core, 105.0, 105.0);
    core.request_area_effect().unwrap();

    assert_eq!(core.request_area_effect().unwrap_err(), SubmitError::Busy);
    assert_eq!(core.choose_color(CellColor::new("#000000")).unwrap_err(), SubmitError::Busy);
    assert_eq!(core.request_purchase().unwrap_err(), SubmitError::Busy);
    assert_eq!(core.pending().count(), 1);

    core.set_ledger_mode(LedgerMode::Offchain);
    assert_eq!(core.choose_color(CellColor::new("#000000")).unwrap_err(), SubmitError::Busy);
    assert!(core.grid.get(cell(10, 10)).is_none());
    assert_eq!(core.pending().count(), 1);
}

#[test]
fn locked_ignores_gestures_and_wheel() {
    let mut core = signed_in();
    core.viewport = Viewport::with_state(550.0, 550.0, 10.0, Point::new(100.0, 100.0));
    click(&mut core, 105.0, 105.0);
    core.request_area_effect().unwrap();

    core.on_pointer_down(pt(200.0, 200.0), Button::Primary);
    core.on_pointer_move(pt(100.0, 100.0));
    core.on_pointer_up(pt(100.0, 100.0), Button::Primary);
    assert!(core.on_wheel(pt(10.0, 10.0), WheelDelta { dx: 0.0, dy: -1.0 }).is_empty());
    assert!(core.set_scale(30.0).is_empty());
    core.arm_area_select();
    assert!(!core.input.is_area_select_armed());

    assert_eq!(core.viewport.offset(), Point::new(100.0, 100.0));
    assert_eq!(core.viewport.scale(), 10.0);
    assert_eq!(core.selected_cell, Some(cell(110, 110)));
    assert_eq!(core.input.hover(), Some(cell(110, 110)));
}

// =============================================================
// Area effects
// =============================================================

#[test]
fn area_effect_requires_selection() {
    let mut core = signed_in();
    assert_eq!(core.request_area_effect().unwrap_err(), SubmitError::NoSelection);
    assert!(!core.input.is_locked());
}

#[test]
fn area_effect_begins_highlight() {
    let mut core = signed_in();
    click(&mut core, 105.0, 105.0);
    let actions = core.request_area_effect().unwrap();
    let id = submitted_id(&actions);
    assert!(core.effects.has_pending(id));
    assert!(actions.contains(&Action::Submit {
        id,
        request: GatewayRequest::AreaEffect { center_x: 10, center_y: 10, radius: AREA_EFFECT_RADIUS },
    }));
}

#[test]
fn area_effect_failure_removes_highlight_and_leaves_grid() {
    let mut core = signed_in();
    core.set_ledger_mode(LedgerMode::Offchain);
    click(&mut core, 105.0, 105.0);
    core.choose_color(CellColor::new("#FF4500")).unwrap();
    core.set_ledger_mode(LedgerMode::Onchain);
    let before = core.grid.snapshot();

    let id = submitted_id(&core.request_area_effect().unwrap());
    let actions = core.on_gateway_result(id, Err(GatewayFailure::NoAreaEffects));
    core.tick(TICK_MS);

    assert!(!has_highlight(&core));
    assert_eq!(bursts(&core), 0);
    assert_eq!(core.grid.snapshot(), before);
    assert!(!actions.iter().any(|a| matches!(a, Action::PublishPixels(_))));
    assert_eq!(core.notices.current(), Some(&Notice::error("You don't have any area effects")));
    assert!(!core.input.is_locked());
}

#[test]
fn area_effect_success_bursts_and_clears_area() {
    let mut core = signed_in();
    core.set_ledger_mode(LedgerMode::Offchain);
    for (x, y) in [(105.0, 105.0), (135.0, 105.0), (145.0, 105.0)] {
        click(&mut core, x, y);
        core.choose_color(CellColor::new("#FF4500")).unwrap();
    }
    core.set_ledger_mode(LedgerMode::Onchain);
    click(&mut core, 105.0, 105.0);

    let id = submitted_id(&core.request_area_effect().unwrap());
    let actions = core.on_gateway_result(id, Ok(receipt()));

    assert!(!has_highlight(&core));
    assert_eq!(bursts(&core), 1);
    assert!(core.grid.read(cell(10, 10)).is_background());
    assert!(core.grid.read(cell(13, 10)).is_background());
    assert_eq!(core.grid.read(cell(14, 10)).as_str(), "#FF4500");
    let published = actions.iter().find_map(|a| match a {
        Action::PublishPixels(p) => Some(p.len()),
        _ => None,
    });
    assert_eq!(published, Some(29));
}

#[test]
fn unknown_gateway_result_is_ignored() {
    let mut core = signed_in();
    assert!(core.on_gateway_result(99, Ok(receipt())).is_empty());
    assert!(core.notices.current().is_none());
}

#[test]
fn purchase_round_trip() {
    let mut core = signed_in();
    let id = submitted_id(&core.request_purchase().unwrap());
    assert!(core.input.is_locked());
    let actions = core.on_gateway_result(id, Ok(receipt()));
    assert!(actions.contains(&Action::ShowNotice(Notice::success("Area effect purchased tx: 0x1234...abcd"))));
    assert!(!core.input.is_locked());
}

// =============================================================
// Confirmed events
// =============================================================

#[test]
fn authoritative_background_overrides_optimistic_paint() {
    let mut core = signed_in();
    click(&mut core, 105.0, 105.0);
    let id = submitted_id(&core.choose_color(CellColor::new("#FFD635")).unwrap());
    core.on_gateway_result(id, Ok(receipt()));
    let token = core.reconciler.active_token().unwrap();
    let event = ConfirmedEffectEvent { originator: Identity::new(BOB), x: 11, y: 10, radius: 3, sequence: 1 };

    let actions = core.on_chain_event(token, &event);

    assert!(core.grid.read(cell(10, 10)).is_background());
    assert!(actions.iter().any(|a| matches!(a, Action::PublishPixels(p) if p.contains_key(&cell(10, 10)))));
    assert_eq!(bursts(&core), 1);
}

#[test]
fn own_confirmed_event_does_not_burst_again() {
    let mut core = signed_in();
    click(&mut core, 105.0, 105.0);
    let id = submitted_id(&core.request_area_effect().unwrap());
    core.on_gateway_result(id, Ok(receipt()));
    let token = core.reconciler.active_token().unwrap();
    let event = ConfirmedEffectEvent { originator: Identity::new(ALICE), x: 10, y: 10, radius: 3, sequence: 7 };

    core.on_chain_event(token, &event);
    core.on_chain_event(token, &event);

    assert_eq!(bursts(&core), 1);
}

#[test]
fn events_after_sign_out_are_dropped() {
    let mut core = signed_in();
    let token = core.reconciler.active_token().unwrap();
    core.set_identity(None, &mut NullSource);
    let event = ConfirmedEffectEvent { originator: Identity::new(BOB), x: 10, y: 10, radius: 3, sequence: 1 };
    assert!(core.on_chain_event(token, &event).is_empty());
    assert!(core.identity().is_none());
}

// =============================================================
// Relay and time
// =============================================================

#[test]
fn session_snapshot_and_updates_apply() {
    let mut core = engine();
    let pixels: PixelPatch = [(cell(1, 1), CellColor::new("#000000"))].into_iter().collect();
    core.on_session_message(ServerMessage::Snapshot { pixels, selected_color: Some(CellColor::new("#E46E6E")) });
    assert_eq!(core.grid.read(cell(1, 1)).as_str(), "#000000");
    assert_eq!(core.selected_color.as_str(), "#E46E6E");

    let clear: PixelPatch = [(cell(1, 1), CellColor::background())].into_iter().collect();
    core.on_session_message(ServerMessage::PixelsUpdated { from: uuid::Uuid::new_v4(), pixels: clear });
    assert!(core.grid.is_empty());

    let actions = core.on_session_message(ServerMessage::Error { message: "bad frame".into() });
    assert!(actions.is_empty());
}

#[test]
fn tick_expires_notice_and_bursts() {
    let mut core = signed_in();
    let id = submitted_id(&core.request_purchase().unwrap());
    core.on_gateway_result(id, Ok(receipt()));
    core.effects.spawn_burst(EffectCenter::new(1, 1), 3);

    for _ in 0..100 {
        core.tick(TICK_MS);
    }

    assert!(core.notices.current().is_none());
    assert!(core.effects.is_empty());
    assert!(core.tick(TICK_MS).is_empty());
}
