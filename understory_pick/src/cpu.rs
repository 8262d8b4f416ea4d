// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software pick target.

use alloc::vec::Vec;

use kurbo::{BezPath, Point, Rect, Shape};
use understory_damage::DeviceRect;

use crate::codec::Rgba8;
use crate::engine::PickError;
use crate::pass::PickRenderer;

/// A [`PickRenderer`] that rasterizes the pick pass on the CPU.
///
/// Only the sample window is stored, so a pass costs `O(elements × sample area)`
/// regardless of surface size. A pixel is covered when its center lies inside
/// the filled shape; there is no antialiasing, so every stored pixel decodes
/// exactly.
#[derive(Clone, Debug, Default)]
pub struct CpuPickTarget {
    sample: DeviceRect,
    pixels: Vec<Rgba8>,
    active: bool,
    passes: u64,
}

impl CpuPickTarget {
    /// Create an idle target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pick pass is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of pick passes started on this target.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    fn fill_where(&mut self, bounds: Rect, color: Rgba8, inside: impl Fn(Point) -> bool) {
        if !self.active {
            return;
        }
        let window = DeviceRect::from_kurbo(bounds).intersect(&self.sample);
        if window.is_empty() {
            return;
        }
        let stride = self.sample.width as usize;
        for y in window.y..(window.y + window.height) {
            for x in window.x..(window.x + window.width) {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if inside(center) {
                    let row = (y - self.sample.y) as usize;
                    let col = (x - self.sample.x) as usize;
                    self.pixels[row * stride + col] = color;
                }
            }
        }
    }
}

impl PickRenderer for CpuPickTarget {
    fn begin_pick(&mut self, _surface: DeviceRect, sample: DeviceRect) -> Result<(), PickError> {
        let len = usize::try_from(sample.area())
            .map_err(|_| PickError::Readback("sample too large"))?;
        self.sample = sample;
        self.pixels.clear();
        self.pixels.resize(len, [0; 4]);
        self.active = true;
        self.passes += 1;
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        let rect = rect.abs();
        self.fill_where(rect, color, |p| {
            rect.x0 <= p.x && p.x < rect.x1 && rect.y0 <= p.y && p.y < rect.y1
        });
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.fill_where(path.bounding_box(), color, |p| path.contains(p));
    }

    fn read_pixels(&mut self, rect: DeviceRect, out: &mut [Rgba8]) -> Result<(), PickError> {
        if !self.active {
            return Err(PickError::NoContext);
        }
        if out.len() != usize::try_from(rect.area()).unwrap_or(usize::MAX) {
            return Err(PickError::Readback("output length does not match rectangle"));
        }
        let stride = self.sample.width as usize;
        let coords = (rect.y..rect.y + rect.height)
            .flat_map(|y| (rect.x..rect.x + rect.width).map(move |x| (x, y)));
        for ((x, y), px) in coords.zip(out.iter_mut()) {
            *px = if self.sample.contains_point(x, y) {
                let row = (y - self.sample.y) as usize;
                let col = (x - self.sample.x) as usize;
                self.pixels[row * stride + col]
            } else {
                [0; 4]
            };
        }
        Ok(())
    }

    fn end_pick(&mut self) {
        self.active = false;
        self.pixels.clear();
        self.sample = DeviceRect::EMPTY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_only_inside_sample() {
        let mut t = CpuPickTarget::new();
        t.begin_pick(DeviceRect::from_size(10, 10), DeviceRect::new(4, 4, 2, 2))
            .unwrap();
        t.fill_rect(Rect::new(0.0, 0.0, 5.0, 10.0), [1, 2, 3, 255]);
        let mut out = [[0_u8; 4]; 4];
        t.read_pixels(DeviceRect::new(4, 4, 2, 2), &mut out).unwrap();
        assert_eq!(out, [[1, 2, 3, 255], [0; 4], [1, 2, 3, 255], [0; 4]]);
        t.end_pick();
        assert!(!t.is_active());
        assert!(t.read_pixels(DeviceRect::new(4, 4, 1, 1), &mut out[..1]).is_err());
    }

    #[test]
    fn later_fills_cover_earlier_ones() {
        let mut t = CpuPickTarget::new();
        let sample = DeviceRect::new(0, 0, 3, 1);
        t.begin_pick(DeviceRect::from_size(3, 1), sample).unwrap();
        t.fill_rect(Rect::new(0.0, 0.0, 3.0, 1.0), [1, 0, 0, 255]);
        t.fill_path(&Rect::new(1.0, 0.0, 2.0, 1.0).to_path(0.1), [2, 0, 0, 255]);
        let mut out = [[0_u8; 4]; 3];
        t.read_pixels(sample, &mut out).unwrap();
        assert_eq!(out.map(|p| p[0]), [1, 2, 1]);
    }
}
