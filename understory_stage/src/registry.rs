// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicit registry of stages with a default stage.

use core::fmt::Debug;
use core::time::Duration;

use hashbrown::HashMap;
use tracing::trace;
use understory_damage::DEFAULT_MAX_BUFFER_AGE;
use understory_redraw::{EventLoop, SourceId};

use crate::backend::{Scene, SurfaceBackend};
use crate::stage::Stage;

/// Handle of a stage in a [`StageRegistry`].
///
/// Handles are never reused within one registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(u32);

impl StageId {
    /// Raw value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Owns the stages of an application and routes fired redraw sources to them.
///
/// The first stage inserted becomes the default stage unless another one is
/// chosen with [`set_default`](Self::set_default). Removing the default stage
/// leaves the registry without one until the next insertion.
#[derive(Debug)]
pub struct StageRegistry<S, B, Src = SourceId, const N: usize = DEFAULT_MAX_BUFFER_AGE> {
    stages: HashMap<StageId, Stage<S, B, Src, N>>,
    next_id: u32,
    default: Option<StageId>,
}

impl<S, B, Src, const N: usize> Default for StageRegistry<S, B, Src, N> {
    fn default() -> Self {
        Self {
            stages: HashMap::new(),
            next_id: 0,
            default: None,
        }
    }
}

impl<S, B, Src, const N: usize> StageRegistry<S, B, Src, N>
where
    S: Scene<B>,
    B: SurfaceBackend,
    Src: Copy + Eq + Debug,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `stage` and return its handle.
    pub fn insert(&mut self, stage: Stage<S, B, Src, N>) -> StageId {
        self.next_id += 1;
        let id = StageId(self.next_id);
        self.stages.insert(id, stage);
        if self.default.is_none() {
            self.default = Some(id);
        }
        id
    }

    /// Tear down and remove the stage `id`, revoking its scheduled redraw.
    pub fn remove<L>(&mut self, id: StageId, event_loop: &mut L) -> Option<(S, B)>
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        let stage = self.stages.remove(&id)?;
        if self.default == Some(id) {
            self.default = None;
        }
        Some(stage.teardown(event_loop))
    }

    /// The stage `id`.
    pub fn get(&self, id: StageId) -> Option<&Stage<S, B, Src, N>> {
        self.stages.get(&id)
    }

    /// The stage `id`, mutably.
    pub fn get_mut(&mut self, id: StageId) -> Option<&mut Stage<S, B, Src, N>> {
        self.stages.get_mut(&id)
    }

    /// Handle of the default stage.
    pub fn default_id(&self) -> Option<StageId> {
        self.default
    }

    /// Make `id` the default stage. Returns `false` if no such stage exists.
    pub fn set_default(&mut self, id: StageId) -> bool {
        if !self.stages.contains_key(&id) {
            return false;
        }
        self.default = Some(id);
        true
    }

    /// The default stage.
    pub fn default_stage(&self) -> Option<&Stage<S, B, Src, N>> {
        self.default.and_then(|id| self.stages.get(&id))
    }

    /// The default stage, mutably.
    pub fn default_stage_mut(&mut self) -> Option<&mut Stage<S, B, Src, N>> {
        self.default.and_then(|id| self.stages.get_mut(&id))
    }

    /// The stage whose redraw is scheduled under `source`.
    pub fn owner_of(&self, source: Src) -> Option<StageId> {
        self.stages
            .iter()
            .find(|(_, stage)| stage.owns_source(source))
            .map(|(&id, _)| id)
    }

    /// Route a fired event-loop `source` to the stage that scheduled it.
    ///
    /// Returns the stage the source belonged to, or `None` for a stale source.
    pub fn dispatch(&mut self, source: Src, now: Duration) -> Option<StageId> {
        let Some(id) = self.owner_of(source) else {
            trace!(?source, "no stage owns redraw source");
            return None;
        };
        if let Some(stage) = self.stages.get_mut(&id) {
            stage.dispatch_redraw(source, now);
        }
        Some(id)
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the registry holds no stage.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Handles of all stages, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = StageId> + '_ {
        self.stages.keys().copied()
    }
}
