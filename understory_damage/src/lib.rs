// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_damage --heading-base-level=0

//! Understory Damage: pending damage and buffer-age aware repaint regions.
//!
//! Understory Damage decides *which* part of a surface a frame has to repaint.
//!
//! - Accumulates damage rectangles into a single pending rectangle, clipped to the surface.
//! - Keeps a fixed-depth history of the damage each past frame painted.
//! - Reconciles pending damage with the buffer age reported by a swap chain, adding the
//!   damage of every frame the back buffer missed.
//!
//! Damage is tracked as a single axis-aligned rectangle. Merging two rectangles yields
//! their bounding box, which over-approximates the changed region but keeps clipping
//! and scissoring trivial for GPU backends.
//!
//! ## Pending states
//!
//! Pending damage is a [`Dirty`] value with three explicit states: nothing changed,
//! a partial rectangle changed, or the whole surface must be repainted. A freshly
//! created or reset tracker is fully dirty.
//!
//! ## Buffer age
//!
//! Swap chains rotate among two or three physical buffers. A buffer that was last
//! presented `n` frames ago is missing the changes of those `n` frames.
//! [`DamageTracker::reconcile_for_paint`] takes the reported [`BufferAge`] and returns
//! a [`Repaint`] covering the current damage plus the damage of the missed frames.
//! When the pipeline cannot report buffer age, the previous frame's damage is added
//! unconditionally.
//!
//! ```rust
//! use understory_damage::{BufferAge, DamageTracker, DeviceRect};
//!
//! let mut tracker: DamageTracker = DamageTracker::new(640, 480);
//! let first = tracker.reconcile_for_paint(BufferAge::Frames(0));
//! assert!(first.full);
//! tracker.finish_paint();
//!
//! tracker.mark_damaged(DeviceRect::new(0, 0, 16, 16));
//! let second = tracker.reconcile_for_paint(BufferAge::Frames(1));
//! tracker.finish_paint();
//! // The buffer missed the first (full) frame.
//! assert!(second.full);
//!
//! tracker.mark_damaged(DeviceRect::new(32, 0, 16, 16));
//! let third = tracker.reconcile_for_paint(BufferAge::Frames(1));
//! assert_eq!(third.region, DeviceRect::new(0, 0, 48, 16));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod history;
mod rect;
mod tracker;

pub use history::{DEFAULT_MAX_BUFFER_AGE, DamageHistory};
pub use rect::DeviceRect;
pub use tracker::{BufferAge, DamageTracker, Dirty, Repaint};
