// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_pick --heading-base-level=0

//! Understory Pick: resolve a screen point to the topmost scene element.
//!
//! Picking renders the scene a second time into an offscreen buffer that is never shown.
//! Every pickable element paints its footprint in a flat color that encodes a per-pass
//! identity; reading back the pixel under the pointer and decoding it yields the element.
//! Because the pick pass reuses the real paint order, overlap, clipping and non-rectangular
//! shapes resolve exactly as they appear on screen.
//!
//! - [`PickCodec`] packs identities into the color channels, tolerating framebuffers with
//!   fewer than 8 bits per channel.
//! - [`PickScene`] is implemented by the host scene; it paints through a [`PickAssigner`].
//! - [`PickRenderer`] is the render target side: begin, fill, read back, end.
//! - [`PickEngine`] runs one pass per query and decodes the result.
//!
//! Identities are assigned fresh for every pass and discarded afterwards, so there is no
//! table to keep in sync with the scene. A pick pass always ends, even on error, and leaves
//! the renderer in its normal state.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Circle, Rect};
//! use understory_damage::DeviceRect;
//! use understory_pick::{CpuPickTarget, PickAssigner, PickEngine, PickScene};
//!
//! struct Scene;
//!
//! impl PickScene for Scene {
//!     type Element = &'static str;
//!
//!     fn paint_for_pick(&self, assigner: &mut PickAssigner<'_, &'static str>) {
//!         assigner.paint_rect("panel", Rect::new(0.0, 0.0, 200.0, 200.0));
//!         assigner.paint_shape("knob", &Circle::new((100.0, 100.0), 10.0));
//!     }
//! }
//!
//! let surface = DeviceRect::from_size(200, 200);
//! let engine = PickEngine::default();
//! let mut target = CpuPickTarget::new();
//! assert_eq!(engine.pick(&Scene, &mut target, surface, 100, 100), Some("knob"));
//! assert_eq!(engine.pick(&Scene, &mut target, surface, 10, 10), Some("panel"));
//! assert_eq!(engine.pick(&Scene, &mut target, surface, 250, 10), None);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod codec;
mod cpu;
mod engine;
mod pass;

pub use codec::{PickCodec, PickId, Rgba8};
pub use cpu::CpuPickTarget;
pub use engine::{PickConfig, PickEngine, PickError};
pub use pass::{PickAssigner, PickRenderer, PickScene};
