// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity ring of past per-frame damage.

use crate::rect::DeviceRect;

/// Default history depth: the deepest buffer age a double-buffered swap chain reports.
pub const DEFAULT_MAX_BUFFER_AGE: usize = 2;

/// Damage painted by previous frames, most recent first.
///
/// Holds at most `N` entries; pushing onto a full history drops the oldest
/// entry. Storage is inline, so recording a frame never allocates.
#[derive(Clone, Debug)]
pub struct DamageHistory<const N: usize = DEFAULT_MAX_BUFFER_AGE> {
    frames: [DeviceRect; N],
    /// Slot of the most recent entry.
    head: usize,
    len: usize,
}

impl<const N: usize> Default for DamageHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DamageHistory<N> {
    /// Create an empty history.
    pub const fn new() -> Self {
        Self {
            frames: [DeviceRect::EMPTY; N],
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of frames retained.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of frames currently recorded.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no frames are recorded.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Record the damage of the frame just painted.
    pub fn push(&mut self, damage: DeviceRect) {
        if N == 0 {
            return;
        }
        self.head = (self.head + 1) % N;
        self.frames[self.head] = damage;
        self.len = (self.len + 1).min(N);
    }

    /// Damage of the frame painted `frames_ago + 1` frames before the current one.
    ///
    /// `get(0)` is the most recently recorded frame.
    pub fn get(&self, frames_ago: usize) -> Option<DeviceRect> {
        if frames_ago >= self.len {
            return None;
        }
        Some(self.frames[(self.head + N - frames_ago) % N])
    }

    /// Iterate recorded frames, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = DeviceRect> + '_ {
        (0..self.len).filter_map(|i| self.get(i))
    }

    /// Forget every recorded frame.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}
