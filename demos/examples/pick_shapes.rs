// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pick-pass hit testing over overlapping, non-rectangular shapes.
//!
//! Elements paint back to front; the pick pass resolves each query to whatever
//! is visually on top, including a circle over a rectangle and a rounded
//! corner that leaves the panel behind it exposed.
//!
//! Run:
//! - `cargo run -p understory_demos --example pick_shapes`

use kurbo::{Circle, Rect, RoundedRect};
use understory_damage::DeviceRect;
use understory_pick::{CpuPickTarget, PickAssigner, PickCodec, PickConfig, PickEngine, PickScene};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Widget {
    Window,
    Card,
    Avatar,
}

struct Scene {
    card: RoundedRect,
    avatar: Circle,
}

impl PickScene for Scene {
    type Element = Widget;

    fn paint_for_pick(&self, assigner: &mut PickAssigner<'_, Widget>) {
        assigner.paint_rect(Widget::Window, Rect::new(0.0, 0.0, 320.0, 240.0));
        assigner.paint_shape(Widget::Card, &self.card);
        assigner.paint_shape(Widget::Avatar, &self.avatar);
    }
}

fn main() {
    let scene = Scene {
        card: RoundedRect::new(40.0, 40.0, 280.0, 200.0, 24.0),
        avatar: Circle::new((80.0, 80.0), 30.0),
    };
    let surface = DeviceRect::from_size(320, 240);
    let mut target = CpuPickTarget::new();

    // A 5/6/5 framebuffer still has room for 65535 elements.
    let engine = PickEngine::new(
        PickConfig::new()
            .with_codec(PickCodec::RGB565)
            .with_sample_radius(1),
    );

    for (x, y) in [(80, 80), (200, 150), (42, 42), (10, 10), (400, 10)] {
        let hit = engine.pick(&scene, &mut target, surface, x, y);
        println!("pick({x:>3}, {y:>3}) -> {hit:?}");
    }

    assert_eq!(engine.pick(&scene, &mut target, surface, 80, 80), Some(Widget::Avatar));
    assert_eq!(engine.pick(&scene, &mut target, surface, 200, 150), Some(Widget::Card));
    // Outside the rounded corner, the window shows through.
    assert_eq!(engine.pick(&scene, &mut target, surface, 42, 42), Some(Widget::Window));
    assert_eq!(engine.pick(&scene, &mut target, surface, 400, 10), None);
    println!("{} pick passes run", target.passes());
}
