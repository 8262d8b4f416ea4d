// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Redraw coalescing state machine.
//!
//! A [`RedrawScheduler`] owns at most one pending event-loop source for its
//! surface. Requests made while that source is pending are absorbed, except
//! that an idle request replaces a pending coalescing timeout. When the
//! source fires, the host calls [`RedrawScheduler::begin_dispatch`], paints,
//! then calls [`RedrawScheduler::end_dispatch`]:
//!
//! ```text
//! Idle --request--> Scheduled --begin_dispatch--> Dispatching --end_dispatch--> Idle
//! ```
//!
//! The pending source is released by `begin_dispatch`, so a request made while
//! dispatching schedules a fresh cycle instead of being swallowed.

use core::time::Duration;

use tracing::trace;

use crate::event_loop::EventLoop;

/// How a redraw request wants to be scheduled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RedrawKind {
    /// Run at the next idle opportunity.
    #[default]
    Idle,
    /// Run no sooner than the minimum interval after the previous dispatch.
    ///
    /// Used for bursts of externally reported damage, so closely spaced
    /// notifications fold into one paint.
    Coalesce,
}

/// Observable scheduler state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RedrawState {
    /// Nothing queued.
    Idle,
    /// A source is pending on the event loop.
    Scheduled,
    /// A dispatch is running and nothing further is queued.
    Dispatching,
}

/// Guarantees at most one outstanding scheduled redraw per surface.
#[derive(Clone, Debug)]
pub struct RedrawScheduler<S> {
    token: Option<S>,
    /// The pending source is a coalescing timeout.
    timed: bool,
    dispatching: bool,
    last_dispatch: Option<Duration>,
    /// Minimum spacing between dispatches for [`RedrawKind::Coalesce`] requests.
    pub min_interval: Duration,
}

impl<S> Default for RedrawScheduler<S> {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl<S> RedrawScheduler<S> {
    /// Create an idle scheduler.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            token: None,
            timed: false,
            dispatching: false,
            last_dispatch: None,
            min_interval,
        }
    }

    /// Current state.
    pub fn state(&self) -> RedrawState {
        if self.token.is_some() {
            RedrawState::Scheduled
        } else if self.dispatching {
            RedrawState::Dispatching
        } else {
            RedrawState::Idle
        }
    }

    /// Whether a source is pending.
    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.token.is_some()
    }

    /// Whether a dispatch is in progress.
    #[inline]
    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// Time of the most recent dispatch, if any.
    #[inline]
    pub fn last_dispatch(&self) -> Option<Duration> {
        self.last_dispatch
    }
}

impl<S: Copy + Eq + core::fmt::Debug> RedrawScheduler<S> {
    /// The pending source, if any.
    #[inline]
    pub fn token(&self) -> Option<S> {
        self.token
    }

    /// Whether `source` is the pending source of this scheduler.
    #[inline]
    pub fn owns(&self, source: S) -> bool {
        self.token == Some(source)
    }

    /// Ask for a redraw at time `now`.
    ///
    /// Returns `true` if a new source was registered, `false` if one was
    /// already pending. An [`RedrawKind::Idle`] request made while a
    /// coalescing timeout is pending removes the timeout and registers an idle
    /// source in its place.
    pub fn request<L>(&mut self, event_loop: &mut L, kind: RedrawKind, now: Duration) -> bool
    where
        L: EventLoop<Source = S> + ?Sized,
    {
        if let Some(pending) = self.token {
            if !self.timed || kind != RedrawKind::Idle {
                return false;
            }
            trace!(source = ?pending, "idle request preempts coalescing timeout");
            event_loop.remove(pending);
            self.token = None;
        }
        let delay = match (kind, self.last_dispatch) {
            (RedrawKind::Coalesce, Some(last)) => {
                last.saturating_add(self.min_interval).saturating_sub(now)
            }
            _ => Duration::ZERO,
        };
        let source = if delay.is_zero() {
            event_loop.add_idle()
        } else {
            event_loop.add_timeout(delay)
        };
        trace!(?source, ?kind, ?delay, "redraw scheduled");
        self.token = Some(source);
        self.timed = !delay.is_zero();
        true
    }

    /// Start dispatching for a fired `source` at time `now`.
    ///
    /// Returns `false` for a source this scheduler does not own (stale or
    /// revoked), in which case nothing changes and the caller must not paint.
    pub fn begin_dispatch(&mut self, source: S, now: Duration) -> bool {
        if !self.owns(source) {
            trace!(?source, "ignoring foreign redraw source");
            return false;
        }
        self.token = None;
        self.timed = false;
        self.dispatching = true;
        self.last_dispatch = Some(now);
        true
    }

    /// Finish the dispatch started by [`begin_dispatch`](Self::begin_dispatch).
    pub fn end_dispatch(&mut self) {
        self.dispatching = false;
    }

    /// Revoke the pending source, if any. Returns whether one was revoked.
    ///
    /// Call on surface teardown so the source never fires against a dead surface.
    pub fn cancel<L>(&mut self, event_loop: &mut L) -> bool
    where
        L: EventLoop<Source = S> + ?Sized,
    {
        self.timed = false;
        match self.token.take() {
            Some(source) => {
                trace!(?source, "redraw revoked");
                event_loop.remove(source);
                true
            }
            None => false,
        }
    }
}
