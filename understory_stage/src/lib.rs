// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_stage --heading-base-level=0

//! Understory Stage: one presentable surface, painted only where it changed.
//!
//! A [`Stage`] ties a retained scene to a display backend and keeps the state that
//! decides when and where to paint:
//!
//! - Damage reported through [`Stage::mark_damaged`] accumulates in a damage tracker
//!   (see `understory_damage`) and clips the next paint, widened by the damage of
//!   every frame the back buffer missed.
//! - Redraw requests fold into one scheduled dispatch per surface (see
//!   `understory_redraw`). The host's event loop fires the source and calls
//!   [`Stage::dispatch_redraw`].
//! - [`Stage::pick`] resolves a point to the topmost scene element with a pick pass
//!   (see `understory_pick`), rendered through the same backend.
//!
//! The stage composes two capabilities instead of inheriting behavior:
//! [`Scene`] paints and pick-paints the content, [`SurfaceBackend`] provides the
//! surface, its buffer age, presentation and readback. Failures inside either one
//! never escape public operations: paints report `false`, picks report `None`, and
//! a [`StageEvent`] records what happened.
//!
//! [`StageRegistry`] holds several stages, tracks a default stage and routes fired
//! event-loop sources back to the stage that scheduled them.
//!
//! ## Lifecycle
//!
//! ```text
//! mark_damaged ──▶ queue_redraw ──▶ (event loop fires) ──▶ dispatch_redraw ──▶ paint
//!                                                                         │
//!                         clear + Scene::paint within the repaint clip ◀──┘
//!                         SurfaceBackend::present, damage cleared
//! ```
//!
//! Everything runs on the thread that drives the event loop.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod backend;
mod registry;
mod stage;
mod types;

#[cfg(test)]
mod testing;

pub use backend::{Scene, StageError, SurfaceBackend};
pub use registry::{StageId, StageRegistry};
pub use stage::Stage;
pub use types::{SkipReason, Snapshot, StageConfig, StageEvent, StageFlags};
