// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Time source abstraction
//!
//! Cooldown decisions use the monotonic clock, notification timestamps use
//! the wall clock. Both come from a [`Clock`] so tests can drive time by hand.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync + Debug {
    /// Monotonic instant for elapsed-time measurements
    fn now(&self) -> Instant;

    /// Wall-clock time for human-facing timestamps
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock. Clones share the same timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualTime>>,
}

#[derive(Debug)]
struct ManualTime {
    base_instant: Instant,
    base_wall: DateTime<Utc>,
    offset: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualTime {
                base_instant: Instant::now(),
                base_wall: Utc::now(),
                offset: Duration::ZERO,
            })),
        }
    }

    /// Moves both clocks forward
    pub fn advance(&self, by: Duration) {
        self.inner.lock().offset += by;
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.lock().offset
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let t = self.inner.lock();
        t.base_instant + t.offset
    }

    fn now_utc(&self) -> DateTime<Utc> {
        let t = self.inner.lock();
        // offsets beyond chrono's range are not a realistic test input
        t.base_wall + chrono::Duration::from_std(t.offset).unwrap_or_else(|_| chrono::Duration::zero())
    }
}
