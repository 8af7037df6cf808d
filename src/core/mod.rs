// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Core module - engine wiring, timers and time source

mod clock;
mod engine;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use scheduler::Scheduler;

use crate::notify::DispatcherState;
use serde::{Deserialize, Serialize};

/// System-wide state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    pub running: bool,
    pub upstream_connected: bool,
    pub cameras_known: usize,
    pub events_active: usize,
    pub notifications_queued: usize,
    pub notifications_dropped: u64,
    pub dispatcher: DispatcherState,
    pub uptime_seconds: u64,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            running: false,
            upstream_connected: false,
            cameras_known: 0,
            events_active: 0,
            notifications_queued: 0,
            notifications_dropped: 0,
            dispatcher: DispatcherState::Running,
            uptime_seconds: 0,
        }
    }
}
