//! Reconciliation of confirmed ledger events into the shared grid.
//!
//! The ledger reports each confirmed area effect some time after it happens,
//! possibly more than once and out of order. The reconciler holds one
//! subscription to that stream, keyed by the local identity, and turns each
//! event into an authoritative background write over the event's area.
//!
//! Subscriptions are replaced, never stacked: switching identity tears the old
//! subscription down before opening the next, and every delivered event carries
//! the token of the subscription it arrived on so late deliveries from a torn
//! down subscription can be recognized and dropped.

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod reconcile_test;

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::consts::SEEN_EVENT_CAPACITY;
use crate::effects::{EffectCenter, EffectOverlayManager};
use crate::grid::{CellColor, GridStore, PixelPatch, area_cells};

/// A ledger account address. Compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    #[must_use]
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(address.as_ref().trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

/// Handle for one subscription. Tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub u64);

/// A confirmed area effect as reported by the ledger event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedEffectEvent {
    pub originator: Identity,
    pub x: i64,
    pub y: i64,
    pub radius: u32,
    /// Per-originator sequence number. `(originator, sequence)` identifies the event.
    pub sequence: u64,
}

impl ConfirmedEffectEvent {
    #[must_use]
    pub fn center(&self) -> EffectCenter {
        EffectCenter::new(self.x, self.y)
    }
}

/// The host side of the confirmed-event stream.
///
/// `subscribe` starts delivering events for `identity` tagged with `token`;
/// `unsubscribe` stops them. Events already queued under an old token may
/// still arrive and are discarded by the reconciler.
pub trait EventSource {
    fn subscribe(&mut self, identity: &Identity, token: SubscriptionToken);
    fn unsubscribe(&mut self, token: SubscriptionToken);
}

/// Why an event produced no grid write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// Delivered on a subscription that has since been torn down.
    StaleSubscription,
    /// No subscription is active.
    NotSubscribed,
}

/// What applying one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The area was written. `burst` says whether a burst was spawned;
    /// `duplicate` marks a re-delivery of an event already seen.
    Applied { patch: PixelPatch, burst: bool, duplicate: bool },
    Discarded(Discard),
}

/// Owns the event subscription and the record of events already applied.
#[derive(Debug, Default)]
pub struct ChainEventReconciler {
    identity: Option<Identity>,
    active: Option<SubscriptionToken>,
    next_token: u64,
    seen: HashSet<(Identity, u64)>,
    seen_order: VecDeque<(Identity, u64)>,
}

impl ChainEventReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The token of the live subscription, if any.
    #[must_use]
    pub fn active_token(&self) -> Option<SubscriptionToken> {
        self.active
    }

    /// Point the subscription at a new identity.
    ///
    /// No effect when `identity` equals the current one. Otherwise the current
    /// subscription is released first and, for `Some`, a fresh one is opened.
    pub fn set_identity(&mut self, identity: Option<Identity>, source: &mut dyn EventSource) {
        if identity == self.identity {
            return;
        }
        self.teardown(source);
        if let Some(id) = identity {
            self.next_token += 1;
            let token = SubscriptionToken(self.next_token);
            source.subscribe(&id, token);
            info!(identity = %id, token = token.0, "reconcile: subscribed");
            self.active = Some(token);
            self.identity = Some(id);
        }
    }

    /// Release the live subscription and forget the identity.
    pub fn teardown(&mut self, source: &mut dyn EventSource) {
        if let Some(token) = self.active.take() {
            source.unsubscribe(token);
            info!(token = token.0, "reconcile: unsubscribed");
        }
        self.identity = None;
    }

    /// Apply one delivered event.
    ///
    /// Every accepted delivery rewrites the event's area to background, so a
    /// re-delivery repairs any optimistic write that landed in between. Only
    /// the first delivery of a foreign event spawns a burst.
    pub fn apply(
        &mut self,
        token: SubscriptionToken,
        event: &ConfirmedEffectEvent,
        grid: &mut GridStore,
        effects: &mut EffectOverlayManager,
    ) -> Reconciled {
        let Some(active) = self.active else {
            debug!(sequence = event.sequence, "reconcile: event with no subscription dropped");
            return Reconciled::Discarded(Discard::NotSubscribed);
        };
        if token != active {
            warn!(token = token.0, active = active.0, "reconcile: stale subscription event dropped");
            return Reconciled::Discarded(Discard::StaleSubscription);
        }

        let cells = area_cells(event.x, event.y, event.radius);
        let patch = grid.apply_authoritative(cells, &CellColor::background());

        let duplicate = !self.remember(&event.originator, event.sequence);
        let local = self.identity.as_ref() == Some(&event.originator);
        let burst = !duplicate && !local;
        if burst {
            effects.spawn_burst(event.center(), event.radius);
        }
        debug!(
            originator = %event.originator,
            sequence = event.sequence,
            cells = patch.len(),
            duplicate,
            burst,
            "reconcile: event applied"
        );
        Reconciled::Applied { patch, burst, duplicate }
    }

    /// Record an event key. Returns `false` if it was already recorded.
    fn remember(&mut self, originator: &Identity, sequence: u64) -> bool {
        let key = (originator.clone(), sequence);
        if self.seen.contains(&key) {
            return false;
        }
        if self.seen_order.len() >= SEEN_EVENT_CAPACITY {
            if let Some(evicted) = self.seen_order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        self.seen.insert(key.clone());
        self.seen_order.push_back(key);
        true
    }
}
