// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage-clipped redraws on a software surface with a double-buffered swap chain.
//!
//! This example wires:
//! - a toy scene of colored boxes that can be moved,
//! - a software backend that alternates two buffers and reports their age,
//! - `QueueLoop` standing in for the host event loop.
//!
//! Each move damages the old and new position; the stage folds the requests into
//! one paint and repaints only the damaged area plus whatever the recycled buffer
//! missed.
//!
//! Run:
//! - `cargo run -p understory_demos --example stage_redraw`

use core::time::Duration;

use kurbo::{BezPath, Rect};
use understory_damage::{BufferAge, DeviceRect, Repaint};
use understory_pick::{CpuPickTarget, PickAssigner, PickError, PickRenderer, PickScene, Rgba8};
use understory_redraw::QueueLoop;
use understory_stage::{Scene, Stage, StageConfig, StageError, StageEvent, SurfaceBackend};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 200;

/// Software swap chain: `frames[front]` is on screen, the others are back buffers.
struct SoftwareSurface {
    frames: Vec<Vec<Rgba8>>,
    /// Frame counter at which each buffer was last presented.
    presented_at: Vec<Option<u64>>,
    back: usize,
    frame_count: u64,
    pick: CpuPickTarget,
}

impl SoftwareSurface {
    fn new(buffers: usize) -> Self {
        Self {
            frames: vec![vec![[0; 4]; (WIDTH * HEIGHT) as usize]; buffers],
            presented_at: vec![None; buffers],
            back: 0,
            frame_count: 0,
            pick: CpuPickTarget::new(),
        }
    }

    fn fill(&mut self, rect: DeviceRect, color: Rgba8) {
        let rect = rect.intersect(&DeviceRect::from_size(WIDTH, HEIGHT));
        let frame = &mut self.frames[self.back];
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                frame[y as usize * WIDTH as usize + x as usize] = color;
            }
        }
    }
}

impl PickRenderer for SoftwareSurface {
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

impl SurfaceBackend for SoftwareSurface {
    fn surface_size(&self) -> (u32, u32) {
        (WIDTH, HEIGHT)
    }

    fn buffer_age(&mut self) -> BufferAge {
        match self.presented_at[self.back] {
            // A buffer presented in the latest frame would have age 1.
            Some(at) => BufferAge::Frames(u32::try_from(self.frame_count - at + 1).unwrap_or(0)),
            None => BufferAge::Frames(0),
        }
    }

    fn make_current(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    fn clear(&mut self, color: Rgba8, clip: Option<DeviceRect>) {
        self.fill(clip.unwrap_or(DeviceRect::from_size(WIDTH, HEIGHT)), color);
    }

    fn present(&mut self, _repaint: &Repaint) -> Result<(), StageError> {
        self.frame_count += 1;
        self.presented_at[self.back] = Some(self.frame_count);
        self.back = (self.back + 1) % self.frames.len();
        Ok(())
    }

    fn read_frame(&mut self, rect: DeviceRect) -> Result<Vec<Rgba8>, StageError> {
        let front = (self.back + self.frames.len() - 1) % self.frames.len();
        let frame = &self.frames[front];
        let mut out = Vec::with_capacity(rect.area() as usize);
        for y in rect.y..rect.y + rect.height {
            let start = y as usize * WIDTH as usize + rect.x as usize;
            out.extend_from_slice(&frame[start..start + rect.width as usize]);
        }
        Ok(out)
    }
}

struct Boxes {
    boxes: Vec<(&'static str, DeviceRect, Rgba8)>,
}

impl Boxes {
    /// Move box `index` by `(dx, dy)` and return the damage: old and new position.
    fn nudge(&mut self, index: usize, dx: i32, dy: i32) -> [DeviceRect; 2] {
        let (_, rect, _) = &mut self.boxes[index];
        let old = *rect;
        rect.x += dx;
        rect.y += dy;
        [old, *rect]
    }
}

impl PickScene for Boxes {
    type Element = &'static str;

    fn paint_for_pick(&self, assigner: &mut PickAssigner<'_, &'static str>) {
        for &(name, rect, _) in &self.boxes {
            assigner.paint_rect(name, rect.to_kurbo());
        }
    }
}

impl Scene<SoftwareSurface> for Boxes {
    fn paint(&mut self, target: &mut SoftwareSurface, clip: Option<DeviceRect>) {
        for &(_, rect, color) in &self.boxes {
            target.fill(clip.map_or(rect, |clip| rect.intersect(&clip)), color);
        }
    }
}

fn run(stage: &mut Stage<Boxes, SoftwareSurface>, lp: &mut QueueLoop) {
    while let Some(source) = lp.next_ready() {
        stage.dispatch_redraw(source, lp.now());
    }
    for event in stage.drain_events() {
        match event {
            StageEvent::Painted { region, full } => {
                let kind = if full { "full" } else { "clipped" };
                println!("  painted {kind} {region:?}");
            }
            other => println!("  {other:?}"),
        }
    }
}

fn main() {
    let scene = Boxes {
        boxes: vec![
            ("red", DeviceRect::new(20, 20, 60, 40), [0xd0, 0x30, 0x30, 0xff]),
            ("green", DeviceRect::new(120, 60, 60, 40), [0x30, 0xd0, 0x30, 0xff]),
            ("blue", DeviceRect::new(220, 100, 60, 40), [0x30, 0x30, 0xd0, 0xff]),
        ],
    };
    let config = StageConfig::new().with_background([0x20, 0x20, 0x20, 0xff]);
    let mut stage = Stage::new(scene, SoftwareSurface::new(2), config);
    let mut lp = QueueLoop::new();

    println!("first frame");
    let now = lp.now();
    stage.queue_redraw(&mut lp, now);
    run(&mut stage, &mut lp);

    for step in 0..4 {
        lp.advance(Duration::from_millis(16));
        println!("frame {step}: nudge red and green");
        let now = lp.now();
        for index in [0, 1] {
            for rect in stage.scene_mut().nudge(index, 4, 2) {
                stage.mark_damaged(rect);
            }
            stage.queue_redraw(&mut lp, now);
        }
        run(&mut stage, &mut lp);
    }

    println!("pick(25, 25) -> {:?}", stage.pick(25, 25));
    println!("pick(250, 120) -> {:?}", stage.pick(250, 120));
    println!("pick(5, 190) -> {:?}", stage.pick(5, 190));

    if let Some(snapshot) = stage.snapshot(DeviceRect::new(0, 0, 40, 40)) {
        let corner = snapshot.pixel(39, 39);
        println!("snapshot {:?}: pixel(39, 39) = {corner:?}", snapshot.rect);
    }
}
