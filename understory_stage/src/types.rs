// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage configuration, flags and events.

use alloc::vec::Vec;
use core::time::Duration;

use understory_damage::DeviceRect;
use understory_pick::{PickConfig, Rgba8};

/// Stage configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StageConfig {
    /// Color the surface is cleared to before the scene paints.
    pub background: Rgba8,
    /// Clip paints to damage. When `false`, every paint repaints the whole surface.
    pub clipped_redraws: bool,
    /// Minimum spacing between paints triggered by external damage notifications.
    pub min_damage_interval: Duration,
    /// Pick pass configuration.
    pub pick: PickConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            background: [0, 0, 0, 0xff],
            clipped_redraws: true,
            min_damage_interval: Duration::from_millis(16),
            pick: PickConfig::default(),
        }
    }
}

impl StageConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `background` as the clear color.
    pub fn with_background(mut self, background: Rgba8) -> Self {
        self.background = background;
        self
    }

    /// Enable or disable damage-clipped paints.
    pub fn with_clipped_redraws(mut self, clipped: bool) -> Self {
        self.clipped_redraws = clipped;
        self
    }

    /// Space external-damage paints at least `interval` apart.
    pub fn with_min_damage_interval(mut self, interval: Duration) -> Self {
        self.min_damage_interval = interval;
        self
    }

    /// Use `pick` for pick passes.
    pub fn with_pick(mut self, pick: PickConfig) -> Self {
        self.pick = pick;
        self
    }
}

bitflags::bitflags! {
    /// Stage flags controlling whether painting happens at all.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct StageFlags: u8 {
        /// The surface is shown.
        const MAPPED    = 0b0000_0001;
        /// Painting is temporarily disabled; dispatched redraws are skipped.
        const SUSPENDED = 0b0000_0010;
    }
}

impl Default for StageFlags {
    fn default() -> Self {
        Self::MAPPED
    }
}

impl StageFlags {
    /// Whether a paint may run.
    #[inline]
    pub fn can_paint(self) -> bool {
        self.contains(Self::MAPPED) && !self.contains(Self::SUSPENDED)
    }
}

/// Why a requested paint did not happen.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The stage is not mapped.
    Unmapped,
    /// The stage is suspended.
    Suspended,
    /// The backend failed; damage is kept for the next attempt.
    Failed,
}

/// Something observable that happened to a stage.
///
/// Events queue up on the stage until [`Stage::drain_events`](crate::Stage::drain_events).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StageEvent {
    /// A frame was presented.
    Painted {
        /// Region that was repainted.
        region: DeviceRect,
        /// Whether the paint was unclipped.
        full: bool,
    },
    /// The surface changed size.
    Resized {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
    /// The background color changed.
    BackgroundChanged(Rgba8),
    /// A paint was requested but did not run.
    PaintSkipped(SkipReason),
}

/// Pixels read back from a painted frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Area covered, clipped to the surface.
    pub rect: DeviceRect,
    /// Row-major RGBA pixels, top row first.
    pub pixels: Vec<Rgba8>,
}

impl Snapshot {
    /// Pixel at surface coordinates `(x, y)`, if inside the snapshot.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba8> {
        if !self.rect.contains_point(x, y) {
            return None;
        }
        let row = (y - self.rect.y) as usize;
        let col = (x - self.rect.x) as usize;
        self.pixels.get(row * self.rect.width as usize + col).copied()
    }
}
