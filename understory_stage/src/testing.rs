// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by the stage and registry tests.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{BezPath, Rect};
use understory_damage::{BufferAge, DeviceRect, Repaint};
use understory_pick::{CpuPickTarget, PickAssigner, PickError, PickRenderer, PickScene, Rgba8};

use crate::backend::{Scene, StageError, SurfaceBackend};

/// Software surface that records what the stage asked of it.
#[derive(Debug)]
pub(crate) struct TestSurface {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) frame: Vec<Rgba8>,
    pub(crate) age: BufferAge,
    pub(crate) context: bool,
    pub(crate) fail_present: bool,
    pub(crate) presented: Vec<Repaint>,
    pub(crate) clears: Vec<(Rgba8, Option<DeviceRect>)>,
    pub(crate) pick: CpuPickTarget,
}

impl TestSurface {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: vec![[0; 4]; (width * height) as usize],
            age: BufferAge::Frames(1),
            context: true,
            fail_present: false,
            presented: Vec::new(),
            clears: Vec::new(),
            pick: CpuPickTarget::new(),
        }
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.frame = vec![[0; 4]; (width * height) as usize];
    }

    pub(crate) fn fill(&mut self, rect: DeviceRect, color: Rgba8) {
        let rect = rect.intersect(&DeviceRect::from_size(self.width, self.height));
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                self.frame[y as usize * self.width as usize + x as usize] = color;
            }
        }
    }
}

impl PickRenderer for TestSurface {
    fn begin_pick(&mut self, surface: DeviceRect, sample: DeviceRect) -> Result<(), PickError> {
        self.pick.begin_pick(surface, sample)
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.pick.fill_rect(rect, color);
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.pick.fill_path(path, color);
    }

    fn read_pixels(&mut self, rect: DeviceRect, out: &mut [Rgba8]) -> Result<(), PickError> {
        self.pick.read_pixels(rect, out)
    }

    fn end_pick(&mut self) {
        self.pick.end_pick();
    }
}

impl SurfaceBackend for TestSurface {
    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn buffer_age(&mut self) -> BufferAge {
        self.age
    }

    fn make_current(&mut self) -> Result<(), StageError> {
        if self.context {
            Ok(())
        } else {
            Err(StageError::NoContext)
        }
    }

    fn clear(&mut self, color: Rgba8, clip: Option<DeviceRect>) {
        self.clears.push((color, clip));
        let rect = clip.unwrap_or(DeviceRect::from_size(self.width, self.height));
        self.fill(rect, color);
    }

    fn present(&mut self, repaint: &Repaint) -> Result<(), StageError> {
        if self.fail_present {
            return Err(StageError::Present("surface lost"));
        }
        self.presented.push(*repaint);
        Ok(())
    }

    fn read_frame(&mut self, rect: DeviceRect) -> Result<Vec<Rgba8>, StageError> {
        let mut out = Vec::new();
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let px = self
                    .frame
                    .get(y as usize * self.width as usize + x as usize)
                    .ok_or(StageError::Readback("outside the frame"))?;
                out.push(*px);
            }
        }
        Ok(out)
    }
}

/// Flat-colored rectangles painted in order.
#[derive(Debug)]
pub(crate) struct Tiles {
    pub(crate) tiles: Vec<(DeviceRect, Rgba8)>,
    /// Clip of every paint, in order.
    pub(crate) paints: Vec<Option<DeviceRect>>,
}

impl Tiles {
    /// `cols` x `rows` tiles evenly covering a `width` x `height` surface.
    pub(crate) fn grid(width: i32, height: i32, cols: i32, rows: i32, color: Rgba8) -> Self {
        let (tw, th) = (width / cols, height / rows);
        let mut tiles = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                tiles.push((DeviceRect::new(col * tw, row * th, tw, th), color));
            }
        }
        Self {
            tiles,
            paints: Vec::new(),
        }
    }
}

impl PickScene for Tiles {
    type Element = usize;

    fn paint_for_pick(&self, assigner: &mut PickAssigner<'_, usize>) {
        for (i, (tile, _)) in self.tiles.iter().enumerate() {
            assigner.paint_rect(i, tile.to_kurbo());
        }
    }
}

impl Scene<TestSurface> for Tiles {
    fn paint(&mut self, target: &mut TestSurface, clip: Option<DeviceRect>) {
        self.paints.push(clip);
        for &(tile, color) in &self.tiles {
            let visible = clip.map_or(tile, |clip| tile.intersect(&clip));
            target.fill(visible, color);
        }
    }
}
