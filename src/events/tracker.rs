// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Event tracker - active-event table and notification trigger

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{CooldownGate, CooldownState, Event, EventError, EventPhase, SnapshotFetcher};
use crate::cameras::CameraRegistry;
use crate::core::Clock;
use crate::notify::{Notification, NotificationQueue};

struct TrackerState {
    active: HashMap<String, Event>,
    cooldown: CooldownState,
}

/// Validates lifecycle transitions and queues notifications for new events.
///
/// The table and the cooldown are mutated together under one lock held for
/// the whole of [`ingest`](Self::ingest), including the snapshot fetch, so
/// concurrent deliveries are applied one at a time.
pub struct EventTracker {
    state: Mutex<TrackerState>,
    gate: CooldownGate,
    fetcher: Arc<dyn SnapshotFetcher>,
    queue: Arc<NotificationQueue>,
}

impl EventTracker {
    /// The cooldown window starts at construction, so the first alert after
    /// start-up is also held back until `cooldown` has passed.
    pub fn new(
        cameras: Arc<CameraRegistry>,
        fetcher: Arc<dyn SnapshotFetcher>,
        queue: Arc<NotificationQueue>,
        clock: Arc<dyn Clock>,
        cooldown: Duration,
    ) -> Self {
        let started = clock.now();
        Self {
            state: Mutex::new(TrackerState {
                active: HashMap::new(),
                cooldown: CooldownState::new(started, cooldown),
            }),
            gate: CooldownGate::new(cameras, clock),
            fetcher,
            queue,
        }
    }

    /// Applies one lifecycle record.
    ///
    /// A failed notification on `New` is reported but the event stays active.
    pub async fn ingest(&self, event: Event) -> Result<(), EventError> {
        let mut state = self.state.lock().await;

        match event.phase {
            EventPhase::New => {
                if state.active.contains_key(&event.id) {
                    return Err(EventError::DuplicateEvent { id: event.id });
                }
                state.active.insert(event.id.clone(), event.clone());
                debug!(id = %event.id, camera = %event.camera, label = %event.label, "Event started");

                if self.gate.should_notify(&event.camera, &state.cooldown) {
                    self.prepare_notification(&event, &mut state.cooldown).await?;
                }
            }
            EventPhase::Updated => match state.active.get_mut(&event.id) {
                Some(stored) => *stored = event,
                None => {
                    return Err(EventError::OrphanEvent {
                        id: event.id,
                        phase: event.phase,
                    })
                }
            },
            EventPhase::Ended => {
                if state.active.remove(&event.id).is_none() {
                    return Err(EventError::OrphanEvent {
                        id: event.id,
                        phase: event.phase,
                    });
                }
                debug!(id = %event.id, "Event ended");
            }
        }

        Ok(())
    }

    async fn prepare_notification(&self, event: &Event, cooldown: &mut CooldownState) -> Result<(), EventError> {
        let image = self
            .fetcher
            .fetch(&event.id)
            .await
            .map_err(|source| EventError::SnapshotFetch {
                id: event.id.clone(),
                source,
            })?;

        let clock = self.gate.clock();
        let notification = Notification::for_detection(&event.camera, &event.label, clock.now_utc(), image);
        let caption = notification.caption.clone();
        if self.queue.enqueue(notification) {
            info!("Notification queued: {}", caption);
        } else {
            warn!("Notification not queued: {}", caption);
        }
        cooldown.last_sent_at = clock.now();
        Ok(())
    }

    pub async fn is_active(&self, id: &str) -> bool {
        self.state.lock().await.active.contains_key(id)
    }

    pub async fn get(&self, id: &str) -> Option<Event> {
        self.state.lock().await.active.get(id).cloned()
    }

    pub async fn active_count(&self) -> usize {
        self.state.lock().await.active.len()
    }

    pub async fn cooldown(&self) -> Duration {
        self.state.lock().await.cooldown.cooldown
    }

    /// Changes the cooldown without resetting the last-sent time
    pub async fn set_cooldown(&self, cooldown: Duration) {
        self.state.lock().await.cooldown.cooldown = cooldown;
        info!("Cooldown set to {:?}", cooldown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::events::SnapshotError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubFetcher {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl SnapshotFetcher for StubFetcher {
        async fn fetch(&self, _event_id: &str) -> Result<Vec<u8>, SnapshotError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(SnapshotError::Status(500));
            }
            Ok(vec![0xff, 0xd8, 0xff])
        }
    }

    struct Harness {
        tracker: Arc<EventTracker>,
        clock: ManualClock,
        queue: Arc<NotificationQueue>,
        fetcher: Arc<StubFetcher>,
        cameras: Arc<CameraRegistry>,
    }

    /// `front` is enabled, `garage` is known but disabled; the start-up
    /// cooldown has already elapsed
    fn harness() -> Harness {
        let clock = ManualClock::new();
        let cameras = Arc::new(CameraRegistry::default());
        cameras.check_or_add("front");
        cameras.check_or_add("garage");
        cameras.activate(&["front"]);
        let queue = Arc::new(NotificationQueue::new(100));
        let fetcher = Arc::new(StubFetcher::default());
        let tracker = Arc::new(EventTracker::new(
            cameras.clone(),
            fetcher.clone(),
            queue.clone(),
            Arc::new(clock.clone()),
            Duration::from_secs(60),
        ));
        clock.advance(Duration::from_secs(61));
        Harness { tracker, clock, queue, fetcher, cameras }
    }

    fn new_event(id: &str, camera: &str, label: &str) -> Event {
        Event::new(id, camera, label, EventPhase::New)
    }

    fn phase(id: &str, phase: EventPhase) -> Event {
        Event::new(id, "front", "person", phase)
    }

    #[tokio::test]
    async fn test_new_then_end_scenario() {
        let h = harness();

        h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap();
        assert_eq!(h.queue.len(), 1);
        let queued = h.queue.try_dequeue().unwrap();
        assert_eq!(queued.caption, "camera: front object: person");
        assert_eq!(queued.image, vec![0xff, 0xd8, 0xff]);

        h.tracker.ingest(phase("E1", EventPhase::Ended)).await.unwrap();
        assert!(!h.tracker.is_active("E1").await);

        let err = h.tracker.ingest(phase("E1", EventPhase::Updated)).await.unwrap_err();
        assert_eq!(err, EventError::OrphanEvent { id: "E1".into(), phase: EventPhase::Updated });
    }

    #[tokio::test]
    async fn test_duplicate_new_keeps_stored_record() {
        let h = harness();
        h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap();

        h.clock.advance(Duration::from_secs(120));
        let err = h.tracker.ingest(new_event("E1", "front", "car")).await.unwrap_err();

        assert_eq!(err, EventError::DuplicateEvent { id: "E1".into() });
        assert_eq!(h.tracker.get("E1").await.unwrap().label, "person");
        assert_eq!(h.queue.len(), 1, "rejected transition must not notify");
    }

    #[tokio::test]
    async fn test_orphan_transitions_leave_table_unchanged() {
        let h = harness();
        h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap();

        for p in [EventPhase::Updated, EventPhase::Ended] {
            let err = h.tracker.ingest(phase("E9", p)).await.unwrap_err();
            assert!(matches!(err, EventError::OrphanEvent { ref id, .. } if id == "E9"));
        }

        assert_eq!(h.tracker.active_count().await, 1);
        assert!(h.tracker.is_active("E1").await);
    }

    #[tokio::test]
    async fn test_update_replaces_without_notifying() {
        let h = harness();
        h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap();
        h.queue.try_dequeue();
        h.clock.advance(Duration::from_secs(120));

        h.tracker.ingest(Event::new("E1", "front", "dog", EventPhase::Updated)).await.unwrap();

        let stored = h.tracker.get("E1").await.unwrap();
        assert_eq!(stored.label, "dog");
        assert_eq!(stored.phase, EventPhase::Updated);
        assert!(h.queue.is_empty());
    }

    #[tokio::test]
    async fn test_events_within_cooldown_yield_one_notification() {
        let h = harness();
        h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap();
        h.clock.advance(Duration::from_secs(10));
        h.tracker.ingest(new_event("E2", "front", "person")).await.unwrap();

        assert_eq!(h.queue.len(), 1);
        assert_eq!(h.tracker.active_count().await, 2);
    }

    #[tokio::test]
    async fn test_events_past_cooldown_yield_two_notifications() {
        let h = harness();
        h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap();
        h.clock.advance(Duration::from_secs(61));
        h.tracker.ingest(new_event("E2", "front", "person")).await.unwrap();

        assert_eq!(h.queue.len(), 2);
    }

    #[tokio::test]
    async fn test_cooldown_is_shared_across_cameras() {
        let h = harness();
        h.cameras.check_or_add("yard");
        h.cameras.activate(&["front", "yard"]);

        h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap();
        h.clock.advance(Duration::from_secs(5));
        h.tracker.ingest(new_event("E2", "yard", "car")).await.unwrap();
        assert_eq!(h.queue.len(), 1);

        h.clock.advance(Duration::from_secs(56));
        h.tracker.ingest(new_event("E3", "yard", "car")).await.unwrap();
        assert_eq!(h.queue.len(), 2);
    }

    #[tokio::test]
    async fn test_inactive_camera_never_notifies() {
        let h = harness();
        for i in 0..5 {
            h.clock.advance(Duration::from_secs(3600));
            h.tracker.ingest(new_event(&format!("G{}", i), "garage", "person")).await.unwrap();
        }
        h.tracker.ingest(new_event("U1", "unknown-cam", "person")).await.unwrap();

        assert!(h.queue.is_empty());
        assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.tracker.active_count().await, 6);
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_event_and_cooldown() {
        let h = harness();
        h.fetcher.failing.store(true, Ordering::SeqCst);

        let err = h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap_err();
        assert_eq!(
            err,
            EventError::SnapshotFetch { id: "E1".into(), source: SnapshotError::Status(500) }
        );
        assert!(h.tracker.is_active("E1").await);
        assert!(h.queue.is_empty());

        // cooldown was not consumed, so the next event notifies right away
        h.fetcher.failing.store(false, Ordering::SeqCst);
        h.tracker.ingest(new_event("E2", "front", "person")).await.unwrap();
        assert_eq!(h.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_first_event_after_start_waits_for_cooldown() {
        let clock = ManualClock::new();
        let cameras = Arc::new(CameraRegistry::default());
        cameras.check_or_add("front");
        cameras.activate(&["front"]);
        let queue = Arc::new(NotificationQueue::new(10));
        let tracker = EventTracker::new(
            cameras,
            Arc::new(StubFetcher::default()),
            queue.clone(),
            Arc::new(clock.clone()),
            Duration::from_secs(60),
        );

        clock.advance(Duration::from_secs(30));
        tracker.ingest(new_event("E1", "front", "person")).await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_new_events_serialise() {
        let h = harness();
        let mut handles = Vec::new();
        for i in 0..32 {
            let tracker = h.tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker.ingest(new_event(&format!("E{}", i), "front", "person")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(h.tracker.active_count().await, 32);
        assert_eq!(h.queue.len(), 1, "cooldown read-modify-write must be atomic");
        assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_notification_still_starts_cooldown() {
        let clock = ManualClock::new();
        let cameras = Arc::new(CameraRegistry::default());
        cameras.check_or_add("front");
        cameras.activate(&["front"]);
        let queue = Arc::new(NotificationQueue::new(1));
        let tracker = EventTracker::new(
            cameras,
            Arc::new(StubFetcher::default()),
            queue.clone(),
            Arc::new(clock.clone()),
            Duration::from_secs(60),
        );
        assert!(queue.enqueue(Notification::new("backlog", "00:00:00 01.01.2026", vec![])));
        clock.advance(Duration::from_secs(61));

        tracker.ingest(new_event("E1", "front", "person")).await.unwrap();
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.len(), 1);

        queue.try_dequeue().unwrap();
        clock.advance(Duration::from_secs(5));
        tracker.ingest(new_event("E2", "front", "car")).await.unwrap();
        assert!(queue.is_empty(), "cooldown started by the dropped notification");
    }

    #[tokio::test]
    async fn test_set_cooldown_applies_to_next_event() {
        let h = harness();
        h.tracker.ingest(new_event("E1", "front", "person")).await.unwrap();

        h.tracker.set_cooldown(Duration::from_secs(5)).await;
        assert_eq!(h.tracker.cooldown().await, Duration::from_secs(5));
        h.clock.advance(Duration::from_secs(6));
        h.tracker.ingest(new_event("E2", "front", "person")).await.unwrap();

        assert_eq!(h.queue.len(), 2);
    }
}
