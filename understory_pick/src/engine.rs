// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point → element resolution through a throwaway pick pass.

use smallvec::SmallVec;
use tracing::{debug, trace};
use understory_damage::DeviceRect;

use crate::codec::{PickCodec, PickId, Rgba8};
use crate::pass::{Lookup, PassGuard, PickAssigner, PickRenderer, PickScene};

/// Why a pick pass could not run.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PickError {
    /// No rendering context is available.
    #[error("no rendering context available for the pick pass")]
    NoContext,
    /// The pick buffer could not be read back.
    #[error("pick readback failed: {0}")]
    Readback(&'static str),
}

/// Pick pass configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PickConfig {
    /// Color depth of the pick buffer.
    pub codec: PickCodec,
    /// Pixels read around the target on each side. `0` reads a single pixel.
    ///
    /// A wider sample lets the engine recover from an edge pixel that was
    /// blended by antialiasing or dithering.
    pub sample_radius: u32,
}

impl PickConfig {
    /// Default configuration: 8-bit channels, single-pixel sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `codec` for identity colors.
    pub fn with_codec(mut self, codec: PickCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Read a `(2 * radius + 1)²` neighborhood around the target.
    pub fn with_sample_radius(mut self, radius: u32) -> Self {
        self.sample_radius = radius;
        self
    }
}

/// Resolves screen coordinates to scene elements.
///
/// The engine keeps no state between calls: identities and the assignment
/// table are built during [`pick`](Self::pick) and dropped before it returns.
#[derive(Clone, Debug, Default)]
pub struct PickEngine {
    config: PickConfig,
}

impl PickEngine {
    /// Create an engine with `config`.
    pub fn new(config: PickConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &PickConfig {
        &self.config
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: PickConfig) {
        self.config = config;
    }

    /// Return the element painted on top at `(x, y)`, if any.
    ///
    /// Coordinates outside `surface` yield `None`. A pass that cannot run
    /// (for example without a rendering context) also yields `None`; use
    /// [`try_pick`](Self::try_pick) to observe the error.
    pub fn pick<S, R>(
        &self,
        scene: &S,
        renderer: &mut R,
        surface: DeviceRect,
        x: i32,
        y: i32,
    ) -> Option<S::Element>
    where
        S: PickScene + ?Sized,
        R: PickRenderer,
    {
        match self.try_pick(scene, renderer, surface, x, y) {
            Ok(hit) => hit,
            Err(err) => {
                debug!(%err, x, y, "pick degraded to no hit");
                None
            }
        }
    }

    /// Like [`pick`](Self::pick), but reports why the pass could not run.
    pub fn try_pick<S, R>(
        &self,
        scene: &S,
        renderer: &mut R,
        surface: DeviceRect,
        x: i32,
        y: i32,
    ) -> Result<Option<S::Element>, PickError>
    where
        S: PickScene + ?Sized,
        R: PickRenderer,
    {
        if !surface.contains_point(x, y) {
            return Ok(None);
        }
        let radius = i32::try_from(self.config.sample_radius).unwrap_or(i32::MAX / 4);
        let sample = DeviceRect::new(
            x.saturating_sub(radius),
            y.saturating_sub(radius),
            radius.saturating_mul(2).saturating_add(1),
            radius.saturating_mul(2).saturating_add(1),
        )
        .intersect(&surface);

        let mut pass = PassGuard::begin(renderer, surface, sample)?;
        let mut assigner = PickAssigner::new(self.config.codec, pass.renderer());
        scene.paint_for_pick(&mut assigner);
        let table = assigner.into_table();

        let len = usize::try_from(sample.area())
            .map_err(|_| PickError::Readback("sample too large"))?;
        let mut pixels: SmallVec<[Rgba8; 9]> = SmallVec::from_elem([0; 4], len);
        pass.renderer().read_pixels(sample, &mut pixels)?;
        drop(pass);

        let width = sample.width as usize;
        let center = (y - sample.y) as usize * width + (x - sample.x) as usize;
        let id = match table.lookup(pixels[center]) {
            Lookup::Background => None,
            Lookup::Hit(id) => Some(id),
            Lookup::Garbage => {
                trace!(x, y, "center pixel undecodable, voting over the neighborhood");
                majority(pixels.iter().filter_map(|&px| match table.lookup(px) {
                    Lookup::Hit(id) => Some(id),
                    _ => None,
                }))
            }
        };
        trace!(x, y, ?id, "pick resolved");
        Ok(id.and_then(|id| table.take(id)))
    }
}

/// Most frequent identity; ties go to the one seen first.
fn majority(ids: impl Iterator<Item = PickId>) -> Option<PickId> {
    let mut counts: SmallVec<[(PickId, u32); 9]> = SmallVec::new();
    for id in ids {
        match counts.iter_mut().find(|(seen, _)| *seen == id) {
            Some((_, n)) => *n += 1,
            None => counts.push((id, 1)),
        }
    }
    let mut best: Option<(PickId, u32)> = None;
    for &(id, n) in &counts {
        if best.is_none_or(|(_, m)| n > m) {
            best = Some((id, n));
        }
    }
    best.map(|(id, _)| id)
}
