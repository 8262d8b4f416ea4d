// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal single-threaded event loop with a virtual clock.
//!
//! [`QueueLoop`] is enough to drive redraw scheduling in headless hosts and
//! tests. Time only moves when [`QueueLoop::advance`] or
//! [`QueueLoop::advance_to`] is called.
//!
//! ```
//! use core::time::Duration;
//! use understory_redraw::{EventLoop, QueueLoop};
//!
//! let mut lp = QueueLoop::new();
//! let idle = lp.add_idle();
//! let timer = lp.add_timeout(Duration::from_millis(10));
//!
//! assert_eq!(lp.next_ready(), Some(idle));
//! assert_eq!(lp.next_ready(), None);
//!
//! lp.advance(Duration::from_millis(10));
//! assert_eq!(lp.next_ready(), Some(timer));
//! ```

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::time::Duration;

use crate::event_loop::EventLoop;

/// Handle of a source registered with a [`QueueLoop`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

/// FIFO idle queue plus deadline-ordered timers.
#[derive(Clone, Debug, Default)]
pub struct QueueLoop {
    next_id: u64,
    now: Duration,
    idle: VecDeque<SourceId>,
    /// `(deadline, source)`, unsorted.
    timers: Vec<(Duration, SourceId)>,
}

impl QueueLoop {
    /// Create an empty loop at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward by `by`.
    pub fn advance(&mut self, by: Duration) {
        self.now = self.now.saturating_add(by);
    }

    /// Move the clock to `t`. Earlier times are ignored.
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }

    /// Number of sources that have not fired or been removed.
    pub fn pending(&self) -> usize {
        self.idle.len() + self.timers.len()
    }

    /// Earliest timer deadline, if any timer is pending.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|&(due, _)| due).min()
    }

    /// Pop the next source that is ready to fire.
    ///
    /// Idle sources fire first, in registration order, then expired timers in
    /// deadline order.
    pub fn next_ready(&mut self) -> Option<SourceId> {
        if let Some(source) = self.idle.pop_front() {
            return Some(source);
        }
        let (pos, _) = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, (due, _))| *due <= self.now)
            .min_by_key(|(_, (due, source))| (*due, *source))?;
        Some(self.timers.swap_remove(pos).1)
    }

    fn alloc_id(&mut self) -> SourceId {
        self.next_id += 1;
        SourceId(self.next_id)
    }
}

impl EventLoop for QueueLoop {
    type Source = SourceId;

    fn add_idle(&mut self) -> SourceId {
        let id = self.alloc_id();
        self.idle.push_back(id);
        id
    }

    fn add_timeout(&mut self, delay: Duration) -> SourceId {
        let id = self.alloc_id();
        self.timers.push((self.now.saturating_add(delay), id));
        id
    }

    fn remove(&mut self, source: SourceId) {
        self.idle.retain(|&s| s != source);
        self.timers.retain(|&(_, s)| s != source);
    }
}
