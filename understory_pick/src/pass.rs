// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pick pass: capability traits and per-pass identity assignment.

use alloc::vec::Vec;

use kurbo::{Rect, Shape};
use tracing::warn;
use understory_damage::DeviceRect;

use crate::PickError;
use crate::codec::{PickCodec, PickId, Rgba8};

/// Tolerance used when flattening arbitrary shapes for the pick pass.
const PICK_TOLERANCE: f64 = 0.1;

/// The render target side of a pick pass.
///
/// A pick pass renders into an offscreen buffer that never reaches the
/// screen. Implementations only need to produce correct pixels inside the
/// `sample` rectangle given to [`begin_pick`](Self::begin_pick), which is what
/// a pick matrix restricts rendering to on GPU backends.
pub trait PickRenderer {
    /// Prepare an offscreen pick buffer for a `surface`-sized viewport, cleared to the
    /// all-zero background.
    fn begin_pick(&mut self, surface: DeviceRect, sample: DeviceRect) -> Result<(), PickError>;

    /// Fill a device-space rectangle with a flat color.
    fn fill_rect(&mut self, rect: Rect, color: Rgba8);

    /// Fill a device-space path (non-zero winding) with a flat color.
    fn fill_path(&mut self, path: &kurbo::BezPath, color: Rgba8);

    /// Read back `rect` (inside the sample) into `out`, row-major, top row first.
    ///
    /// `out` holds exactly `rect.width * rect.height` pixels.
    fn read_pixels(&mut self, rect: DeviceRect, out: &mut [Rgba8]) -> Result<(), PickError>;

    /// Discard the pick buffer and restore normal rendering state.
    ///
    /// Called exactly once for every successful [`begin_pick`](Self::begin_pick),
    /// whether or not the pass completed.
    fn end_pick(&mut self);
}

/// A scene that can render itself for picking.
pub trait PickScene {
    /// Handle returned for a hit.
    type Element;

    /// Paint every pickable element through `assigner`, in real paint order (back to front).
    ///
    /// Each element paints its full footprint; later elements cover earlier
    /// ones exactly as they do on screen.
    fn paint_for_pick(&self, assigner: &mut PickAssigner<'_, Self::Element>);
}

/// Hands out identities for one pick pass and forwards flat-color fills to the renderer.
///
/// The assignment table lives only as long as the pass.
pub struct PickAssigner<'a, E> {
    codec: PickCodec,
    renderer: &'a mut dyn PickRenderer,
    table: Vec<E>,
    exhausted: bool,
}

impl<E> core::fmt::Debug for PickAssigner<'_, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PickAssigner")
            .field("codec", &self.codec)
            .field("assigned", &self.table.len())
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl<'a, E> PickAssigner<'a, E> {
    pub(crate) fn new(codec: PickCodec, renderer: &'a mut dyn PickRenderer) -> Self {
        Self {
            codec,
            renderer,
            table: Vec::new(),
            exhausted: false,
        }
    }

    /// Assign the next identity to `element` and return its pick color.
    ///
    /// Returns `None` once the codec has no identities left; such elements are
    /// not pickable in this pass.
    pub fn assign(&mut self, element: E) -> Option<Rgba8> {
        let color = u32::try_from(self.table.len() + 1)
            .ok()
            .and_then(PickId::new)
            .and_then(|id| self.codec.encode(id));
        let Some(color) = color else {
            if !self.exhausted {
                warn!(
                    max = self.codec.max_id(),
                    "pick identities exhausted, remaining elements are not pickable"
                );
                self.exhausted = true;
            }
            return None;
        };
        self.table.push(element);
        Some(color)
    }

    /// Assign an identity to `element` and paint its rectangular footprint.
    pub fn paint_rect(&mut self, element: E, footprint: Rect) {
        if let Some(color) = self.assign(element) {
            self.renderer.fill_rect(footprint, color);
        }
    }

    /// Assign an identity to `element` and paint an arbitrary footprint.
    pub fn paint_shape(&mut self, element: E, footprint: &impl Shape) {
        if let Some(color) = self.assign(element) {
            let path = footprint.to_path(PICK_TOLERANCE);
            self.renderer.fill_path(&path, color);
        }
    }

    /// Number of identities handed out so far.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no identity has been handed out.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub(crate) fn into_table(self) -> PickTable<E> {
        PickTable {
            codec: self.codec,
            elements: self.table,
        }
    }
}

/// Identity assignments of a finished pass.
#[derive(Clone, Debug)]
pub(crate) struct PickTable<E> {
    codec: PickCodec,
    elements: Vec<E>,
}

impl<E> PickTable<E> {
    /// Decode a pixel to an identity assigned during this pass.
    pub(crate) fn lookup(&self, pixel: Rgba8) -> Lookup {
        match self.codec.decode(pixel) {
            None => Lookup::Background,
            Some(id) if id.slot() < self.elements.len() => Lookup::Hit(id),
            Some(_) => Lookup::Garbage,
        }
    }

    pub(crate) fn take(mut self, id: PickId) -> Option<E> {
        let slot = id.slot();
        if slot < self.elements.len() {
            Some(self.elements.swap_remove(slot))
        } else {
            None
        }
    }
}

/// Result of decoding one sampled pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Lookup {
    Background,
    Hit(PickId),
    /// Decodes to an identity nobody was assigned, e.g. a blended edge pixel.
    Garbage,
}

/// Ends a pick pass when dropped, including on early error returns.
pub(crate) struct PassGuard<'r, R: PickRenderer> {
    renderer: &'r mut R,
}

impl<'r, R: PickRenderer> PassGuard<'r, R> {
    pub(crate) fn begin(
        renderer: &'r mut R,
        surface: DeviceRect,
        sample: DeviceRect,
    ) -> Result<Self, PickError> {
        renderer.begin_pick(surface, sample)?;
        Ok(Self { renderer })
    }

    pub(crate) fn renderer(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: PickRenderer> Drop for PassGuard<'_, R> {
    fn drop(&mut self) {
        self.renderer.end_pick();
    }
}
