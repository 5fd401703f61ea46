#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::TICK_MS;

fn center() -> EffectCenter {
    EffectCenter::new(10, 10)
}

// --- Highlights ---

#[test]
fn begin_pending_registers_highlight_at_current_time() {
    let mut fx = EffectOverlayManager::new();
    fx.tick(120.0);
    let entity = fx.begin_pending(1, center(), 3);
    assert_eq!(entity, EffectEntity::TargetHighlight { pending_id: 1, center: center(), radius: 3, started_at: 120.0 });
    assert!(fx.has_pending(1));
    assert_eq!(fx.entities().len(), 1);
}

#[test]
fn begin_pending_twice_replaces_highlight() {
    let mut fx = EffectOverlayManager::new();
    fx.begin_pending(1, center(), 3);
    fx.begin_pending(1, EffectCenter::new(4, 4), 3);
    assert_eq!(fx.entities().len(), 1);
    assert_eq!(fx.entities()[0].center(), EffectCenter::new(4, 4));
}

#[test]
fn highlights_do_not_expire() {
    let mut fx = EffectOverlayManager::new();
    fx.begin_pending(7, center(), 3);
    for _ in 0..1000 {
        fx.tick(TICK_MS);
    }
    assert!(fx.has_pending(7));
    assert_eq!(fx.entities()[0].progress(fx.now_ms()), 1.0);
}

#[test]
fn urgency_stages_follow_elapsed_time() {
    assert_eq!(HighlightStage::for_urgency(0.0), HighlightStage::Targeting);
    assert_eq!(HighlightStage::for_urgency(0.29), HighlightStage::Targeting);
    assert_eq!(HighlightStage::for_urgency(0.3), HighlightStage::Confirm);
    assert_eq!(HighlightStage::for_urgency(0.69), HighlightStage::Confirm);
    assert_eq!(HighlightStage::for_urgency(0.7), HighlightStage::Urgent);
    assert_eq!(HighlightStage::Urgent.label(), "PLEASE CONFIRM");
}

// --- Resolution ---

#[test]
fn resolve_success_converts_highlight_to_burst() {
    let mut fx = EffectOverlayManager::new();
    fx.begin_pending(1, center(), 3);
    fx.tick(1000.0);
    assert!(fx.resolve_success(1));
    assert!(!fx.has_pending(1));
    assert_eq!(
        fx.entities(),
        &[EffectEntity::Burst { center: center(), radius: 3, spawned_at: 1000.0, ttl: BURST_TTL_MS }]
    );
}

#[test]
fn resolve_failure_removes_highlight_without_burst() {
    let mut fx = EffectOverlayManager::new();
    fx.begin_pending(1, center(), 3);
    assert!(fx.resolve_failure(1));
    assert!(fx.is_empty());
}

#[test]
fn resolving_unknown_id_is_noop() {
    let mut fx = EffectOverlayManager::new();
    fx.begin_pending(1, center(), 3);
    assert!(!fx.resolve_success(2));
    assert!(!fx.resolve_failure(2));
    assert!(fx.has_pending(1));
}

#[test]
fn resolve_only_touches_matching_highlight() {
    let mut fx = EffectOverlayManager::new();
    fx.begin_pending(1, center(), 3);
    fx.begin_pending(2, EffectCenter::new(50, 50), 3);
    fx.resolve_failure(1);
    assert!(!fx.has_pending(1));
    assert!(fx.has_pending(2));
}

// --- Bursts ---

#[test]
fn burst_expires_when_age_reaches_ttl() {
    let mut fx = EffectOverlayManager::new();
    fx.spawn_burst(center(), 3);
    // 99 ticks of 50 ms leaves the burst 50 ms short of its 5 s lifetime.
    for _ in 0..99 {
        fx.tick(TICK_MS);
    }
    assert_eq!(fx.entities().len(), 1);
    fx.tick(TICK_MS);
    assert!(fx.is_empty());
}

#[test]
fn custom_ttl_bursts_expire_independently() {
    let mut fx = EffectOverlayManager::new();
    fx.spawn_burst_with_ttl(center(), 3, 100.0);
    fx.spawn_burst(center(), 3);
    fx.tick(100.0);
    assert_eq!(fx.entities().len(), 1);
}

#[test]
fn burst_progress_runs_from_zero_to_one() {
    let mut fx = EffectOverlayManager::new();
    fx.spawn_burst(center(), 3);
    assert_eq!(fx.entities()[0].progress(fx.now_ms()), 0.0);
    fx.tick(2500.0);
    assert_eq!(fx.entities()[0].progress(fx.now_ms()), 0.5);
}

#[test]
fn tick_ignores_bad_steps() {
    let mut fx = EffectOverlayManager::new();
    fx.tick(-10.0);
    fx.tick(f64::NAN);
    fx.tick(f64::INFINITY);
    assert_eq!(fx.now_ms(), 0.0);
}

#[test]
fn tick_reports_redraw_only_when_something_was_live() {
    let mut fx = EffectOverlayManager::new();
    assert!(!fx.tick(TICK_MS));
    fx.spawn_burst_with_ttl(center(), 1, TICK_MS);
    assert!(fx.tick(TICK_MS));
    assert!(!fx.tick(TICK_MS));
}

// --- Placement ---

#[test]
fn placements_project_through_viewport() {
    let mut fx = EffectOverlayManager::new();
    fx.begin_pending(1, center(), 3);
    let vp = Viewport::with_state(550.0, 550.0, 10.0, Point::new(5.0, 5.0));
    let placed = fx.placements(&vp);
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].kind, PlacementKind::Highlight(HighlightStage::Targeting));
    assert_eq!(placed[0].center, Point::new(55.0, 55.0));
    assert_eq!(placed[0].radius_px, 35.0);
}

#[test]
fn placements_leave_manager_untouched() {
    let mut fx = EffectOverlayManager::new();
    fx.spawn_burst(EffectCenter::new(-3, 600), 3);
    let before = fx.entities().to_vec();
    let placed = fx.placements(&Viewport::default());
    assert_eq!(placed[0].kind, PlacementKind::Burst);
    assert_eq!(fx.entities(), before.as_slice());
}
