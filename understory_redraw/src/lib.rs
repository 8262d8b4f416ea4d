// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_redraw --heading-base-level=0

//! Understory Redraw: coalesce redraw requests into one scheduled paint.
//!
//! Understory Redraw decides *when* a surface paints.
//!
//! - Any number of redraw requests made before the next paint fold into one scheduled dispatch.
//! - Requests run at the next idle opportunity, or, for bursts of external damage, no sooner
//!   than a minimum interval after the previous dispatch.
//! - A pending request can be revoked on teardown so it never fires against a dead surface.
//!
//! The scheduler does not own an event loop. It talks to the host through the narrow
//! [`EventLoop`] trait (idle source, timeout source, removal) and the host calls back into
//! [`RedrawScheduler::begin_dispatch`] when a source fires. [`QueueLoop`] is a small
//! reference loop with a virtual clock, useful for headless hosts and tests.
//!
//! ## Example
//!
//! ```rust
//! use core::time::Duration;
//! use understory_redraw::{QueueLoop, RedrawKind, RedrawScheduler, RedrawState};
//!
//! let mut lp = QueueLoop::new();
//! let mut redraw = RedrawScheduler::new(Duration::from_millis(16));
//!
//! // Three requests, one scheduled source.
//! let now = lp.now();
//! for _ in 0..3 {
//!     redraw.request(&mut lp, RedrawKind::Idle, now);
//! }
//! assert_eq!(redraw.state(), RedrawState::Scheduled);
//!
//! let source = lp.next_ready().unwrap();
//! assert!(redraw.begin_dispatch(source, lp.now()));
//! // ... paint ...
//! redraw.end_dispatch();
//! assert_eq!(redraw.state(), RedrawState::Idle);
//! assert_eq!(lp.next_ready(), None);
//! ```
//!
//! Everything runs on the thread that drives the event loop; no locking is involved.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod event_loop;
mod queue;
mod scheduler;

pub use event_loop::EventLoop;
pub use queue::{QueueLoop, SourceId};
pub use scheduler::{RedrawKind, RedrawScheduler, RedrawState};
