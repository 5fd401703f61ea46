//! Engine for the shared pixel board.
//!
//! This crate holds everything a client needs to take part in a shared
//! 500×500 pixel board, with no I/O of its own: the pan/zoom viewport, the
//! replicated cell store, the pointer gesture state machine, the reconciler for
//! confirmed ledger events, and the transient effect overlay. The host (a
//! browser shell, a native window, a headless bot) wires input events and
//! network messages into [`engine::EngineCore`] and performs the
//! [`engine::Action`]s it returns: publishing patches to the realtime relay,
//! submitting transactions through a [`gateway::TransactionGateway`], and
//! showing notices.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Host-facing handler surface that ties every component together |
//! | [`grid`] | Sparse cell store, coordinates, colors, and the area cell rule |
//! | [`viewport`] | Pan/zoom transform between board cells and screen pixels |
//! | [`input`] | Pointer types and the interaction mode state machine |
//! | [`reconcile`] | Identity-keyed subscription to confirmed ledger events |
//! | [`effects`] | Target highlights and bursts, advanced by a fixed tick |
//! | [`notice`] | Transient user-visible notices |
//! | [`overlay`] | Draggable reference image drawn over the board |
//! | [`palette`] | The fixed color palette |
//! | [`export`] | Sub-region rasterization and metadata for minting |
//! | [`gateway`] | Transaction gateway seam and submission helpers |
//! | [`session`] | Wire messages exchanged with the realtime relay |
//! | [`config`] | Ledger configuration |
//! | [`consts`] | Shared numeric constants |

pub mod config;
pub mod consts;
pub mod effects;
pub mod engine;
pub mod export;
pub mod gateway;
pub mod grid;
pub mod input;
pub mod notice;
pub mod overlay;
pub mod palette;
pub mod reconcile;
pub mod session;
pub mod viewport;
