// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending damage and its reconciliation against buffer age.

use tracing::{debug, trace};

use crate::history::{DEFAULT_MAX_BUFFER_AGE, DamageHistory};
use crate::rect::DeviceRect;

/// Changes accumulated since the last paint.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Dirty {
    /// Nothing has changed.
    #[default]
    Clean,
    /// Only this rectangle (already clipped to the surface) has changed.
    Partial(DeviceRect),
    /// The whole surface must be repainted.
    Full,
}

impl Dirty {
    /// Whether anything is pending.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        !matches!(self, Self::Clean)
    }
}

/// How stale the back buffer about to be painted is, as reported by the display pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferAge {
    /// The pipeline cannot report buffer age.
    Unsupported,
    /// `0`: contents are undefined. `n > 0`: the buffer was last presented `n` frames ago.
    Frames(u32),
}

impl From<Option<u32>> for BufferAge {
    fn from(age: Option<u32>) -> Self {
        age.map_or(Self::Unsupported, Self::Frames)
    }
}

/// The region a paint must cover, as computed by [`DamageTracker::reconcile_for_paint`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Repaint {
    /// Region to repaint. Equals the surface bounds when `full` is set.
    pub region: DeviceRect,
    /// Paint unclipped.
    pub full: bool,
}

impl Repaint {
    /// Whether this paint touches no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.full && self.region.is_empty()
    }

    /// The clip to paint with, or `None` for an unclipped paint.
    #[inline]
    pub fn clip(&self) -> Option<DeviceRect> {
        (!self.full).then_some(self.region)
    }
}

/// Pending damage for one surface plus the damage history of its past frames.
///
/// `N` bounds the history and therefore the deepest buffer age that can be
/// reconstructed; older buffers are repainted in full.
///
/// ## Example
///
/// ```rust
/// use understory_damage::{BufferAge, DamageTracker, DeviceRect, Dirty};
///
/// let mut tracker: DamageTracker = DamageTracker::new(800, 600);
/// // A fresh surface has never been painted.
/// assert_eq!(tracker.pending(), Dirty::Full);
/// tracker.reconcile_for_paint(BufferAge::Frames(0));
/// tracker.finish_paint();
///
/// tracker.mark_damaged(DeviceRect::new(10, 10, 50, 50));
/// tracker.mark_damaged(DeviceRect::new(600, 500, 50, 50));
/// assert_eq!(tracker.pending(), Dirty::Partial(DeviceRect::new(10, 10, 640, 540)));
/// ```
#[derive(Clone, Debug)]
pub struct DamageTracker<const N: usize = DEFAULT_MAX_BUFFER_AGE> {
    surface: DeviceRect,
    pending: Dirty,
    history: DamageHistory<N>,
}

impl<const N: usize> DamageTracker<N> {
    /// Create a tracker for a `width` x `height` surface.
    ///
    /// The surface starts fully dirty since nothing has been presented yet.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: DeviceRect::from_size(width, height),
            pending: Dirty::Full,
            history: DamageHistory::new(),
        }
    }

    /// Surface bounds `[0, 0, width, height]`.
    #[inline]
    pub fn surface(&self) -> DeviceRect {
        self.surface
    }

    /// Changes not yet painted.
    #[inline]
    pub fn pending(&self) -> Dirty {
        self.pending
    }

    /// Whether a paint would have anything new to show.
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.is_dirty()
    }

    /// Damage recorded for previous frames.
    #[inline]
    pub fn history(&self) -> &DamageHistory<N> {
        &self.history
    }

    /// Merge `rect` into the pending damage.
    ///
    /// The rectangle is clipped to the surface first. Empty rectangles and
    /// rectangles entirely off the surface are ignored. Returns whether the
    /// pending damage changed.
    pub fn mark_damaged(&mut self, rect: DeviceRect) -> bool {
        let clipped = rect.intersect(&self.surface);
        if clipped.is_empty() {
            trace!(?rect, "damage outside surface ignored");
            return false;
        }
        let next = match self.pending {
            Dirty::Clean => Dirty::Partial(clipped),
            Dirty::Partial(prev) => Dirty::Partial(prev.union(&clipped)),
            Dirty::Full => Dirty::Full,
        };
        let changed = next != self.pending;
        self.pending = next;
        trace!(?rect, pending = ?self.pending, "damage merged");
        changed
    }

    /// Mark the whole surface dirty.
    pub fn mark_all_damaged(&mut self) {
        self.pending = Dirty::Full;
    }

    /// Adopt a new surface size. Returns whether the size changed.
    ///
    /// A resize invalidates every buffer, so history is reset.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let surface = DeviceRect::from_size(width, height);
        if surface == self.surface {
            return false;
        }
        self.surface = surface;
        self.reset();
        true
    }

    /// Forget all history and require a full repaint.
    ///
    /// Call when the backing buffers become semantically invalid, for example
    /// after reallocation or when buffer-age reporting is lost.
    pub fn reset(&mut self) {
        debug!(surface = ?self.surface, "damage history reset");
        self.history.clear();
        self.pending = Dirty::Full;
    }

    /// Compute the region the next paint must cover and record this frame in the history.
    ///
    /// Call once per actual paint, before the scene is rendered, and call
    /// [`finish_paint`](Self::finish_paint) once the frame is done.
    ///
    /// - [`BufferAge::Unsupported`]: the previous frame's damage is added, since a
    ///   swapped-out buffer missed it.
    /// - `Frames(0)`: history is discarded and the whole surface is repainted.
    /// - `Frames(n)`: damage of the `n` previous frames is added. If fewer than `n`
    ///   frames are recorded, the whole surface is repainted.
    pub fn reconcile_for_paint(&mut self, age: BufferAge) -> Repaint {
        let current = match self.pending {
            Dirty::Clean => DeviceRect::EMPTY,
            Dirty::Partial(rect) => rect,
            Dirty::Full => self.surface,
        };
        let mut full = self.pending == Dirty::Full;
        let mut region = current;

        match age {
            BufferAge::Unsupported => {
                if let Some(prev) = self.history.get(0) {
                    region = region.union(&prev);
                }
            }
            BufferAge::Frames(0) => {
                debug!("buffer contents undefined, repainting everything");
                self.history.clear();
                full = true;
            }
            BufferAge::Frames(age) => {
                let age = usize::try_from(age).unwrap_or(usize::MAX);
                if age > self.history.len() {
                    debug!(
                        age,
                        recorded = self.history.len(),
                        "buffer older than damage history, repainting everything"
                    );
                    full = true;
                } else {
                    region = self
                        .history
                        .iter()
                        .take(age)
                        .fold(region, |acc, prev| acc.union(&prev));
                }
            }
        }

        if !full && region.contains_rect(&self.surface) {
            full = true;
        }
        if full {
            region = self.surface;
        }

        self.history.push(current);
        trace!(?age, ?region, full, "damage reconciled for paint");
        Repaint { region, full }
    }

    /// Clear pending damage once a paint has consumed it.
    pub fn finish_paint(&mut self) {
        self.pending = Dirty::Clean;
    }
}
