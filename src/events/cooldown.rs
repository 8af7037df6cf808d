// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Notification cooldown

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cameras::CameraRegistry;
use crate::core::Clock;

/// Time of the last sent notification and the enforced gap.
///
/// There is one state for all cameras, so an alert on one camera also holds
/// back alerts on every other camera until the gap has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownState {
    pub last_sent_at: Instant,
    pub cooldown: Duration,
}

impl CooldownState {
    pub fn new(last_sent_at: Instant, cooldown: Duration) -> Self {
        Self { last_sent_at, cooldown }
    }

    pub fn elapsed_since_last(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_sent_at)
    }
}

/// Decides whether an event may produce a notification
#[derive(Debug, Clone)]
pub struct CooldownGate {
    cameras: Arc<CameraRegistry>,
    clock: Arc<dyn Clock>,
}

impl CooldownGate {
    pub fn new(cameras: Arc<CameraRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { cameras, clock }
    }

    /// False for cameras that are not enabled; otherwise true once strictly
    /// more than the cooldown has elapsed since the last notification
    pub fn should_notify(&self, camera: &str, state: &CooldownState) -> bool {
        if !self.cameras.check_or_add(camera).active {
            return false;
        }
        state.elapsed_since_last(self.clock.now()) > state.cooldown
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    fn gate() -> (CooldownGate, ManualClock, Arc<CameraRegistry>) {
        let clock = ManualClock::new();
        let cameras = Arc::new(CameraRegistry::default());
        (CooldownGate::new(cameras.clone(), Arc::new(clock.clone())), clock, cameras)
    }

    #[test]
    fn test_inactive_camera_never_notifies() {
        let (gate, clock, _) = gate();
        let state = CooldownState::new(clock.now(), Duration::from_secs(60));

        clock.advance(Duration::from_secs(3600));
        assert!(!gate.should_notify("garage", &state));
    }

    #[test]
    fn test_notifies_only_after_cooldown() {
        let (gate, clock, cameras) = gate();
        cameras.check_or_add("front");
        cameras.activate(&["front"]);
        let state = CooldownState::new(clock.now(), Duration::from_secs(60));

        clock.advance(Duration::from_secs(60));
        assert!(!gate.should_notify("front", &state), "exactly the cooldown is not enough");

        clock.advance(Duration::from_secs(1));
        assert!(gate.should_notify("front", &state));
    }

    #[test]
    fn test_unknown_camera_gets_registered() {
        let (gate, clock, cameras) = gate();
        let state = CooldownState::new(clock.now(), Duration::ZERO);

        assert!(!gate.should_notify("new-cam", &state));
        assert_eq!(cameras.get("new-cam").map(|c| c.active), Some(false));
    }
}
