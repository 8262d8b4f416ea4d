// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-surface stage.

use alloc::vec::{Drain, Vec};
use core::fmt::Debug;
use core::time::Duration;

use tracing::{debug, trace};
use understory_damage::{BufferAge, DEFAULT_MAX_BUFFER_AGE, DamageTracker, DeviceRect};
use understory_pick::{PickEngine, Rgba8};
use understory_redraw::{EventLoop, RedrawKind, RedrawScheduler, RedrawState, SourceId};

use crate::backend::{Scene, StageError, SurfaceBackend};
use crate::types::{SkipReason, Snapshot, StageConfig, StageEvent, StageFlags};

/// One presentable surface with its scene.
///
/// A stage owns the scene and the backend and keeps the damage and redraw
/// state that ties them together. `Src` is the source handle type of the host
/// event loop. `N` is the deepest buffer age whose damage can be reconstructed;
/// it must cover the swap chain, so use 3 or more for triple buffering. Older
/// buffers are repainted in full.
///
/// Paint and pick both take `&mut self`, so a pick can never run in the middle
/// of a paint of the same stage.
#[derive(Debug)]
pub struct Stage<S, B, Src = SourceId, const N: usize = DEFAULT_MAX_BUFFER_AGE> {
    scene: S,
    backend: B,
    config: StageConfig,
    flags: StageFlags,
    damage: DamageTracker<N>,
    redraw: RedrawScheduler<Src>,
    picker: PickEngine,
    events: Vec<StageEvent>,
}

impl<S, B, Src, const N: usize> Stage<S, B, Src, N>
where
    S: Scene<B>,
    B: SurfaceBackend,
    Src: Copy + Eq + Debug,
{
    /// Create a mapped stage sized to the backend's surface.
    ///
    /// Nothing is scheduled yet; the first [`queue_redraw`](Self::queue_redraw)
    /// paints the whole surface.
    pub fn new(scene: S, backend: B, config: StageConfig) -> Self {
        let (width, height) = backend.surface_size();
        Self {
            scene,
            backend,
            damage: DamageTracker::new(width, height),
            redraw: RedrawScheduler::new(config.min_damage_interval),
            picker: PickEngine::new(config.pick),
            config,
            flags: StageFlags::default(),
            events: Vec::new(),
        }
    }

    /// The scene.
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access to the scene.
    ///
    /// Changes made through this reference are not tracked; report them with
    /// [`mark_damaged`](Self::mark_damaged).
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Current configuration.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Current flags.
    pub fn flags(&self) -> StageFlags {
        self.flags
    }

    /// Whether the stage is shown.
    pub fn is_mapped(&self) -> bool {
        self.flags.contains(StageFlags::MAPPED)
    }

    /// Whether painting is suspended.
    pub fn is_suspended(&self) -> bool {
        self.flags.contains(StageFlags::SUSPENDED)
    }

    /// Damage state.
    pub fn damage(&self) -> &DamageTracker<N> {
        &self.damage
    }

    /// Surface bounds as last seen by the stage.
    pub fn surface(&self) -> DeviceRect {
        self.damage.surface()
    }

    /// Redraw scheduling state.
    pub fn redraw_state(&self) -> RedrawState {
        self.redraw.state()
    }

    /// Whether `source` is this stage's pending redraw source.
    pub fn owns_source(&self, source: Src) -> bool {
        self.redraw.owns(source)
    }

    /// Take the events queued since the last call.
    pub fn drain_events(&mut self) -> Drain<'_, StageEvent> {
        self.events.drain(..)
    }

    /// Add `rect` to the pending damage. Does not schedule a redraw.
    pub fn mark_damaged(&mut self, rect: DeviceRect) -> bool {
        self.damage.mark_damaged(rect)
    }

    /// Add a fractional scene-space rectangle, rounded outward to whole pixels.
    pub fn mark_damaged_world(&mut self, rect: kurbo::Rect) -> bool {
        self.damage.mark_damaged(DeviceRect::from_kurbo(rect))
    }

    /// Mark the whole surface dirty. Does not schedule a redraw.
    pub fn mark_all_damaged(&mut self) {
        self.damage.mark_all_damaged();
    }

    /// Schedule a paint at the next idle opportunity.
    ///
    /// A paint held back by [`StageConfig::min_damage_interval`] is brought
    /// forward. Returns `false` if an idle paint was already scheduled.
    pub fn queue_redraw<L>(&mut self, event_loop: &mut L, now: Duration) -> bool
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        self.redraw.request(event_loop, RedrawKind::Idle, now)
    }

    /// Damage reported by the windowing system, such as a partial expose.
    ///
    /// Bursts of notifications are folded into paints spaced at least
    /// [`StageConfig::min_damage_interval`] apart. Returns whether a new paint
    /// was scheduled.
    pub fn notify_external_damage<L>(
        &mut self,
        rect: DeviceRect,
        event_loop: &mut L,
        now: Duration,
    ) -> bool
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        self.damage.mark_damaged(rect);
        if !self.damage.has_pending() {
            return false;
        }
        self.redraw.request(event_loop, RedrawKind::Coalesce, now)
    }

    /// Run the paint scheduled under `source`, which the event loop just fired.
    ///
    /// Sources this stage does not own are ignored. Returns whether a frame was
    /// presented: a suspended or unmapped stage skips the paint, and so does a
    /// stage with nothing pending.
    pub fn dispatch_redraw(&mut self, source: Src, now: Duration) -> bool {
        if !self.redraw.begin_dispatch(source, now) {
            return false;
        }
        let painted = if let Some(reason) = self.skip_reason() {
            debug!(?reason, "scheduled paint skipped");
            self.events.push(StageEvent::PaintSkipped(reason));
            false
        } else {
            self.sync_size();
            if self.damage.has_pending() {
                self.paint_or_report()
            } else {
                trace!("nothing pending, no frame");
                false
            }
        };
        self.redraw.end_dispatch();
        painted
    }

    /// Paint synchronously, bypassing the scheduler.
    ///
    /// Always produces a frame unless the stage is unmapped, suspended, or the
    /// backend fails. A redraw that is already scheduled stays scheduled.
    pub fn paint_now(&mut self) -> bool {
        if let Some(reason) = self.skip_reason() {
            debug!(?reason, "forced paint skipped");
            self.events.push(StageEvent::PaintSkipped(reason));
            return false;
        }
        self.paint_or_report()
    }

    /// Return the topmost element at `(x, y)`, if any.
    ///
    /// A pick that cannot run yields `None`; see [`try_pick`](Self::try_pick).
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn pick(&mut self, x: i32, y: i32) -> Option<S::Element> {
        match self.try_pick(x, y) {
            Ok(hit) => hit,
            Err(err) => {
                debug!(%err, "pick degraded to no hit");
                None
            }
        }
    }

    /// Like [`pick`](Self::pick), but reports why the pick could not run.
    pub fn try_pick(&mut self, x: i32, y: i32) -> Result<Option<S::Element>, StageError> {
        self.backend.make_current()?;
        self.sync_size();
        let surface = self.damage.surface();
        let hit = self
            .picker
            .try_pick(&self.scene, &mut self.backend, surface, x, y)?;
        Ok(hit)
    }

    /// Paint now and read `rect` back.
    ///
    /// `rect` is clipped to the surface. Returns `None` when the paint cannot
    /// run, the clipped rectangle is empty, or readback fails.
    pub fn snapshot(&mut self, rect: DeviceRect) -> Option<Snapshot> {
        if !self.paint_now() {
            return None;
        }
        let rect = rect.intersect(&self.damage.surface());
        if rect.is_empty() {
            return None;
        }
        match self.backend.read_frame(rect) {
            Ok(pixels) if pixels.len() as u64 == rect.area() => Some(Snapshot { rect, pixels }),
            Ok(pixels) => {
                debug!(len = pixels.len(), ?rect, "readback returned a short frame");
                None
            }
            Err(err) => {
                debug!(%err, ?rect, "snapshot readback failed");
                None
            }
        }
    }

    /// Adopt a new surface size reported by the host.
    ///
    /// History is reset and, if the stage is mapped, a redraw is scheduled.
    /// Returns whether the size changed.
    pub fn resize<L>(&mut self, width: u32, height: u32, event_loop: &mut L, now: Duration) -> bool
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        if !self.damage.resize(width, height) {
            return false;
        }
        self.events.push(StageEvent::Resized { width, height });
        self.queue_if_mapped(event_loop, now);
        true
    }

    /// The backing buffers were reallocated or lost their age tracking.
    ///
    /// History is reset and, if the stage is mapped, a redraw is scheduled.
    pub fn invalidate_buffers<L>(&mut self, event_loop: &mut L, now: Duration)
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        self.damage.reset();
        self.queue_if_mapped(event_loop, now);
    }

    /// Show or hide the stage. Showing repaints everything.
    pub fn set_mapped<L>(&mut self, mapped: bool, event_loop: &mut L, now: Duration)
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        if mapped == self.is_mapped() {
            return;
        }
        self.flags.set(StageFlags::MAPPED, mapped);
        if mapped {
            self.damage.mark_all_damaged();
            self.queue_redraw(event_loop, now);
        }
    }

    /// Suspend or resume painting.
    ///
    /// While suspended, dispatched redraws are skipped but damage keeps
    /// accumulating. Resuming schedules a redraw if anything is pending.
    pub fn set_suspended<L>(&mut self, suspended: bool, event_loop: &mut L, now: Duration)
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        if suspended == self.is_suspended() {
            return;
        }
        self.flags.set(StageFlags::SUSPENDED, suspended);
        if !suspended && self.damage.has_pending() {
            self.queue_if_mapped(event_loop, now);
        }
    }

    /// Change the clear color. The whole surface is repainted.
    pub fn set_background<L>(&mut self, color: Rgba8, event_loop: &mut L, now: Duration)
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        if color == self.config.background {
            return;
        }
        self.config.background = color;
        self.events.push(StageEvent::BackgroundChanged(color));
        self.damage.mark_all_damaged();
        self.queue_if_mapped(event_loop, now);
    }

    /// Tear the stage down, revoking any scheduled redraw.
    pub fn teardown<L>(mut self, event_loop: &mut L) -> (S, B)
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        self.redraw.cancel(event_loop);
        (self.scene, self.backend)
    }

    fn skip_reason(&self) -> Option<SkipReason> {
        if !self.is_mapped() {
            Some(SkipReason::Unmapped)
        } else if self.is_suspended() {
            Some(SkipReason::Suspended)
        } else {
            None
        }
    }

    fn queue_if_mapped<L>(&mut self, event_loop: &mut L, now: Duration)
    where
        L: EventLoop<Source = Src> + ?Sized,
    {
        if self.is_mapped() {
            self.queue_redraw(event_loop, now);
        }
    }

    fn sync_size(&mut self) {
        let (width, height) = self.backend.surface_size();
        if self.damage.resize(width, height) {
            self.events.push(StageEvent::Resized { width, height });
        }
    }

    fn paint_or_report(&mut self) -> bool {
        match self.paint() {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "paint failed");
                self.events.push(StageEvent::PaintSkipped(SkipReason::Failed));
                false
            }
        }
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn paint(&mut self) -> Result<(), StageError> {
        self.backend.make_current()?;
        self.sync_size();
        if !self.config.clipped_redraws {
            self.damage.mark_all_damaged();
        }
        let age = self.backend.buffer_age();
        if age == BufferAge::Unsupported {
            debug!("buffer age unsupported, repainting the previous frame's damage too");
        }
        let repaint = self.damage.reconcile_for_paint(age);
        if !repaint.is_empty() {
            let clip = repaint.clip();
            self.backend.clear(self.config.background, clip);
            self.scene.paint(&mut self.backend, clip);
        }
        if let Err(err) = self.backend.present(&repaint) {
            // The swap chain state is unknown after a failed present.
            self.damage.reset();
            return Err(err);
        }
        self.damage.finish_paint();
        self.events.push(StageEvent::Painted {
            region: repaint.region,
            full: repaint.full,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestSurface, Tiles};
    use alloc::vec;
    use kurbo::Rect;
    use understory_damage::{Dirty, Repaint};
    use understory_redraw::QueueLoop;

    const RED: Rgba8 = [0xff, 0, 0, 0xff];
    const BLUE: Rgba8 = [0, 0, 0xff, 0xff];
    const MS: Duration = Duration::from_millis(1);
    const T0: Duration = Duration::ZERO;

    type TestStage = Stage<Tiles, TestSurface>;

    fn stage(config: StageConfig) -> TestStage {
        let scene = Tiles::grid(200, 100, 2, 1, BLUE);
        Stage::new(scene, TestSurface::new(200, 100), config)
    }

    /// Run every ready source through the stage. Returns the number of presented frames.
    fn pump(stage: &mut TestStage, lp: &mut QueueLoop) -> usize {
        let mut frames = 0;
        while let Some(source) = lp.next_ready() {
            if stage.dispatch_redraw(source, lp.now()) {
                frames += 1;
            }
        }
        frames
    }

    /// Present two frames so that history no longer holds a full repaint.
    fn settle(stage: &mut TestStage) {
        assert!(stage.paint_now(), "initial paint");
        assert!(stage.paint_now(), "second paint");
        stage.drain_events().for_each(drop);
    }

    #[test]
    fn first_paint_is_full() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        assert!(s.queue_redraw(&mut lp, T0));
        assert_eq!(pump(&mut s, &mut lp), 1);
        assert!(s.backend().presented[0].full, "fresh surface repaints fully");
        assert_eq!(s.scene().paints, vec![None]);
        assert_eq!(s.damage().pending(), Dirty::Clean);
    }

    #[test]
    fn damage_clips_the_paint() {
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        let rect = DeviceRect::new(10, 10, 20, 20);
        s.mark_damaged(rect);
        assert!(s.paint_now());
        assert_eq!(s.scene().paints.last(), Some(&Some(rect)));
        let events: Vec<_> = s.drain_events().collect();
        assert_eq!(
            events,
            vec![StageEvent::Painted {
                region: rect,
                full: false
            }]
        );
    }

    #[test]
    fn many_requests_paint_once() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        for i in 0..5 {
            s.mark_damaged(DeviceRect::new(i * 10, 0, 5, 5));
            s.queue_redraw(&mut lp, T0);
        }
        assert_eq!(lp.pending(), 1);
        assert_eq!(pump(&mut s, &mut lp), 1, "requests must coalesce");
    }

    #[test]
    fn dispatch_with_nothing_pending_presents_nothing() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        let presented = s.backend().presented.len();
        s.queue_redraw(&mut lp, T0);
        assert_eq!(pump(&mut s, &mut lp), 0);
        assert_eq!(s.backend().presented.len(), presented);
        assert_eq!(s.redraw_state(), RedrawState::Idle);
    }

    #[test]
    fn forced_paint_leaves_scheduled_redraw_empty() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        let presented = s.backend().presented.len();
        s.mark_damaged(DeviceRect::new(10, 10, 20, 20));
        assert!(s.queue_redraw(&mut lp, T0));
        assert!(s.paint_now());
        assert_eq!(s.redraw_state(), RedrawState::Scheduled);
        s.drain_events().for_each(drop);

        assert_eq!(pump(&mut s, &mut lp), 0, "the forced paint took the damage");
        assert_eq!(s.backend().presented.len(), presented + 1);
        assert_eq!(s.redraw_state(), RedrawState::Idle);
        assert!(
            !s.drain_events()
                .any(|e| matches!(e, StageEvent::Painted { .. }))
        );
    }

    #[test]
    fn suspended_stage_skips_then_resumes() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        s.set_suspended(true, &mut lp, T0);
        s.mark_damaged(DeviceRect::new(0, 0, 10, 10));
        s.queue_redraw(&mut lp, T0);
        assert_eq!(pump(&mut s, &mut lp), 0);
        assert_eq!(
            s.drain_events().collect::<Vec<_>>(),
            vec![StageEvent::PaintSkipped(SkipReason::Suspended)]
        );
        assert_eq!(s.redraw_state(), RedrawState::Idle, "no dangling source");
        assert!(s.damage().has_pending(), "damage survives the skip");

        s.set_suspended(false, &mut lp, T0);
        assert_eq!(s.redraw_state(), RedrawState::Scheduled);
        assert_eq!(pump(&mut s, &mut lp), 1);
    }

    #[test]
    fn unmapped_stage_never_paints() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        s.set_mapped(false, &mut lp, T0);
        s.mark_damaged(DeviceRect::new(0, 0, 10, 10));
        s.queue_redraw(&mut lp, T0);
        assert_eq!(pump(&mut s, &mut lp), 0);
        assert!(!s.paint_now());
        assert!(s.snapshot(s.surface()).is_none());

        s.set_mapped(true, &mut lp, T0);
        assert_eq!(s.damage().pending(), Dirty::Full, "mapping repaints everything");
        assert_eq!(pump(&mut s, &mut lp), 1);
    }

    #[test]
    fn external_damage_respects_min_interval() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new().with_min_damage_interval(16 * MS));
        s.queue_redraw(&mut lp, T0);
        assert_eq!(pump(&mut s, &mut lp), 1);
        s.paint_now();

        lp.advance(MS);
        let now = lp.now();
        assert!(s.notify_external_damage(DeviceRect::new(0, 0, 4, 4), &mut lp, now));
        assert!(!s.notify_external_damage(DeviceRect::new(50, 50, 4, 4), &mut lp, now));
        assert_eq!(pump(&mut s, &mut lp), 0, "too early");

        lp.advance(15 * MS);
        assert_eq!(pump(&mut s, &mut lp), 1);
        assert_eq!(
            s.backend().presented.last().map(|r| r.region),
            Some(DeviceRect::new(0, 0, 54, 54))
        );
    }

    #[test]
    fn off_surface_external_damage_schedules_nothing() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        assert!(!s.notify_external_damage(DeviceRect::new(-20, -20, 10, 10), &mut lp, T0));
        assert_eq!(lp.pending(), 0);
    }

    #[test]
    fn pick_resolves_tiles() {
        let mut s = stage(StageConfig::new());
        assert_eq!(s.pick(50, 50), Some(0));
        assert_eq!(s.pick(150, 50), Some(1));
        assert_eq!(s.pick(250, 50), None);
        assert!(!s.backend().pick.is_active(), "pick state torn down");
        assert!(s.backend().presented.is_empty(), "pick never presents");
    }

    #[test]
    fn pick_without_context_degrades() {
        let mut s = stage(StageConfig::new());
        s.backend_mut().context = false;
        assert_eq!(s.pick(50, 50), None);
        assert_eq!(s.try_pick(50, 50), Err(StageError::NoContext));
        assert!(!s.paint_now());
        assert!(s.damage().has_pending(), "failed paint keeps damage");
    }

    #[test]
    fn failed_present_resets_history() {
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        s.backend_mut().fail_present = true;
        s.mark_damaged(DeviceRect::new(0, 0, 10, 10));
        assert!(!s.paint_now());
        assert_eq!(
            s.drain_events().collect::<Vec<_>>(),
            vec![StageEvent::PaintSkipped(SkipReason::Failed)]
        );
        assert_eq!(s.damage().pending(), Dirty::Full);
        assert!(s.damage().history().is_empty());
    }

    #[test]
    fn snapshot_reads_painted_pixels() {
        let mut s = stage(StageConfig::new().with_background(RED));
        s.scene_mut().tiles.truncate(1);
        let snap = s.snapshot(DeviceRect::new(90, 40, 200, 200)).unwrap();
        assert_eq!(snap.rect, DeviceRect::new(90, 40, 110, 60), "clipped to surface");
        assert_eq!(snap.pixel(95, 50), Some(BLUE));
        assert_eq!(snap.pixel(150, 50), Some(RED));
        assert_eq!(snap.pixel(0, 0), None);
        assert!(s.snapshot(DeviceRect::new(300, 0, 10, 10)).is_none());
    }

    #[test]
    fn background_change_repaints_everything() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        s.set_background(RED, &mut lp, T0);
        assert_eq!(s.damage().pending(), Dirty::Full);
        assert_eq!(s.redraw_state(), RedrawState::Scheduled);
        assert_eq!(pump(&mut s, &mut lp), 1);
        assert_eq!(s.backend().clears.last(), Some(&(RED, None)));

        s.drain_events().for_each(drop);
        s.set_background(RED, &mut lp, T0);
        assert_eq!(s.drain_events().count(), 0, "same color is a no-op");
    }

    #[test]
    fn resize_resets_and_reschedules() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        s.backend_mut().resize(300, 100);
        assert!(s.resize(300, 100, &mut lp, T0));
        assert!(!s.resize(300, 100, &mut lp, T0));
        assert_eq!(
            s.drain_events().collect::<Vec<_>>(),
            vec![StageEvent::Resized {
                width: 300,
                height: 100
            }]
        );
        assert_eq!(s.damage().pending(), Dirty::Full);
        assert!(s.damage().history().is_empty());
        assert_eq!(s.redraw_state(), RedrawState::Scheduled);
    }

    #[test]
    fn backend_size_change_is_picked_up_at_paint() {
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        s.backend_mut().resize(120, 80);
        assert!(s.paint_now());
        let events: Vec<_> = s.drain_events().collect();
        assert_eq!(events[0], StageEvent::Resized { width: 120, height: 80 });
        assert_eq!(
            events[1],
            StageEvent::Painted {
                region: DeviceRect::from_size(120, 80),
                full: true
            }
        );
    }

    #[test]
    fn invalidated_buffers_repaint_fully() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        s.invalidate_buffers(&mut lp, T0);
        assert_eq!(pump(&mut s, &mut lp), 1);
        assert!(s.backend().presented.last().is_some_and(|r| r.full));
    }

    #[test]
    fn unclipped_mode_always_repaints_fully() {
        let mut s = stage(StageConfig::new().with_clipped_redraws(false));
        settle(&mut s);
        s.mark_damaged(DeviceRect::new(0, 0, 1, 1));
        assert!(s.paint_now());
        assert_eq!(s.scene().paints.last(), Some(&None));
    }

    #[test]
    fn unsupported_buffer_age_adds_previous_frame() {
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        s.backend_mut().age = BufferAge::Unsupported;
        s.mark_damaged(DeviceRect::new(0, 0, 10, 10));
        assert!(s.paint_now());
        s.mark_damaged(DeviceRect::new(20, 0, 10, 10));
        assert!(s.paint_now());
        assert_eq!(
            s.backend().presented.last().map(|r| r.region),
            Some(DeviceRect::new(0, 0, 30, 10))
        );
    }

    #[test]
    fn deeper_history_clips_triple_buffered_paints() {
        fn run<const N: usize>(s: &mut Stage<Tiles, TestSurface, SourceId, N>) -> Repaint {
            s.backend_mut().age = BufferAge::Frames(3);
            for _ in 0..6 {
                s.mark_damaged(DeviceRect::new(10, 10, 5, 5));
                assert!(s.paint_now());
            }
            s.backend().presented.last().copied().unwrap()
        }

        let mut deep: Stage<Tiles, TestSurface, SourceId, 3> = Stage::new(
            Tiles::grid(200, 100, 2, 1, BLUE),
            TestSurface::new(200, 100),
            StageConfig::new(),
        );
        let last = run(&mut deep);
        assert!(!last.full, "three frames of history cover age 3");
        assert_eq!(last.region, DeviceRect::new(10, 10, 5, 5));

        let mut shallow = stage(StageConfig::new());
        assert!(run(&mut shallow).full, "two frames of history cannot");
    }

    #[test]
    fn world_damage_rounds_outward() {
        let mut s = stage(StageConfig::new());
        settle(&mut s);
        assert!(s.mark_damaged_world(Rect::new(1.5, 2.25, 3.5, 4.0)));
        assert_eq!(
            s.damage().pending(),
            Dirty::Partial(DeviceRect::new(1, 2, 3, 2))
        );
    }

    #[test]
    fn teardown_revokes_pending_redraw() {
        let mut lp = QueueLoop::new();
        let mut s = stage(StageConfig::new());
        s.queue_redraw(&mut lp, T0);
        let (_scene, backend) = s.teardown(&mut lp);
        assert_eq!(lp.pending(), 0);
        assert!(backend.presented.is_empty());
    }
}
