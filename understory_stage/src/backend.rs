// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability traits a [`Stage`](crate::Stage) composes.

use alloc::vec::Vec;

use understory_damage::{BufferAge, DeviceRect, Repaint};
use understory_pick::{PickError, PickRenderer, PickScene, Rgba8};

/// Why a backend operation failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// No rendering context could be made current.
    #[error("no rendering context available")]
    NoContext,
    /// Presenting the frame failed.
    #[error("present failed: {0}")]
    Present(&'static str),
    /// Reading the frame back failed.
    #[error("frame readback failed: {0}")]
    Readback(&'static str),
    /// The pick pass failed.
    #[error(transparent)]
    Pick(#[from] PickError),
}

/// The retained scene drawn by a stage.
///
/// The scene is also the pick source: [`PickScene::paint_for_pick`] must paint
/// elements in the same order as [`paint`](Self::paint).
pub trait Scene<B: ?Sized>: PickScene {
    /// Render into `target`.
    ///
    /// `clip` is `None` for a full repaint; otherwise only pixels inside it need
    /// to be correct and rendering outside it should be scissored away.
    fn paint(&mut self, target: &mut B, clip: Option<DeviceRect>);
}

/// The windowing and display side of a stage.
///
/// A backend owns the presentable surface and doubles as the render target of
/// pick passes.
pub trait SurfaceBackend: PickRenderer {
    /// Current surface size in device pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Age of the back buffer the next paint lands in.
    ///
    /// Return [`BufferAge::Unsupported`] when the swap chain cannot tell.
    fn buffer_age(&mut self) -> BufferAge;

    /// Make the rendering context current for this surface.
    fn make_current(&mut self) -> Result<(), StageError>;

    /// Fill `clip` (or the whole surface for `None`) with `color`.
    fn clear(&mut self, color: Rgba8, clip: Option<DeviceRect>);

    /// Present the frame. `repaint` lets backends pass damage to the swap chain.
    fn present(&mut self, repaint: &Repaint) -> Result<(), StageError>;

    /// Read back `rect` of the last painted frame as top-down RGBA rows.
    fn read_frame(&mut self, rect: DeviceRect) -> Result<Vec<Rgba8>, StageError>;
}
