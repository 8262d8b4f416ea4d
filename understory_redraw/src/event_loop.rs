// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability interface for the host's cooperative event loop.

use core::fmt::Debug;
use core::time::Duration;

/// The single-shot scheduling primitives a redraw scheduler needs from its host loop.
///
/// Sources are one-shot: once the loop hands a source back to the host for
/// dispatch it is gone, and removing it afterwards is a no-op. The host is
/// responsible for routing a fired source to the surface that registered it
/// (see [`RedrawScheduler::owns`](crate::RedrawScheduler::owns)).
pub trait EventLoop {
    /// Handle identifying a registered source.
    type Source: Copy + Eq + Debug;

    /// Register a source that fires at the next idle opportunity.
    fn add_idle(&mut self) -> Self::Source;

    /// Register a source that fires once `delay` has elapsed.
    fn add_timeout(&mut self, delay: Duration) -> Self::Source;

    /// Revoke a source so it never fires.
    fn remove(&mut self, source: Self::Source);
}
