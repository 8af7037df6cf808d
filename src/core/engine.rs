// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Main relay engine - wires upstream, tracker and dispatcher together

use anyhow::Result;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use super::{Clock, Scheduler, SystemClock, SystemState};
use crate::cameras::CameraRegistry;
use crate::config::Config;
use crate::events::{EventTracker, SnapshotFetcher};
use crate::frigate::{FrigateApi, FrigateConnection, MqttConfig};
use crate::notify::{NotificationManager, NotificationQueue, Sink, StatusAggregator, WebFeed, WebSink};

/// Main frigate-notify engine
pub struct Engine {
    config: Arc<RwLock<Config>>,
    config_path: PathBuf,
    cameras: Arc<CameraRegistry>,
    queue: Arc<NotificationQueue>,
    tracker: Arc<EventTracker>,
    manager: Arc<NotificationManager>,
    status: Arc<StatusAggregator>,
    web_feed: WebFeed,
    api: Arc<FrigateApi>,
    connection: Arc<FrigateConnection>,
    scheduler: Scheduler,
    shutdown_tx: broadcast::Sender<()>,
    start_time: Option<Instant>,
}

impl Engine {
    pub async fn new(config: Config, config_path: &Path) -> Result<Self> {
        let api = Arc::new(FrigateApi::new(&config.frigate.api_url(), config.dispatch.http_timeout())?);
        let fetcher: Arc<dyn SnapshotFetcher> = api.clone();
        Self::with_parts(config, config_path, api, fetcher, Arc::new(SystemClock)).await
    }

    /// Builds an engine with a custom snapshot source and clock
    pub async fn with_parts(
        config: Config,
        config_path: &Path,
        api: Arc<FrigateApi>,
        fetcher: Arc<dyn SnapshotFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let cameras = Arc::new(CameraRegistry::new(config.frigate.cameras.clone()));
        let queue = Arc::new(NotificationQueue::new(config.dispatch.queue_capacity));
        let tracker = Arc::new(EventTracker::new(
            cameras.clone(),
            fetcher,
            queue.clone(),
            clock,
            config.frigate.cooldown(),
        ));

        let connection = Arc::new(FrigateConnection::new(MqttConfig::from(&config.frigate)));
        let status = Arc::new(StatusAggregator::new());
        let manager = Arc::new(
            NotificationManager::new(
                queue.clone(),
                config.notify.clone(),
                status.clone(),
                config.dispatch.sink_timeout(),
            )
            .with_upstream(connection.clone()),
        );
        let (shutdown_tx, _) = broadcast::channel(4);

        info!(
            "Engine configured: {} cameras, queue capacity {}, cooldown {:?}",
            cameras.len(),
            queue.capacity(),
            config.frigate.cooldown()
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.to_path_buf(),
            cameras,
            queue,
            tracker,
            manager,
            status,
            web_feed: WebFeed::new(),
            api,
            connection,
            scheduler: Scheduler::new(),
            shutdown_tx,
            start_time: None,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("Starting frigate-notify engine...");
        self.start_time = Some(Instant::now());

        let sinks: Vec<Box<dyn Sink>> = vec![Box::new(WebSink::new(self.web_feed.clone()))];
        self.manager.setup_sinks(sinks).await;
        self.manager.start();

        self.connection.start(self.tracker.clone(), self.shutdown_tx.subscribe());

        let (poll_interval, flush_interval) = {
            let config = self.config.read();
            (config.dispatch.camera_poll_interval(), config.dispatch.config_flush_interval())
        };

        let api = self.api.clone();
        let cameras = self.cameras.clone();
        self.scheduler.add_task("camera-discovery", poll_interval, self.shutdown_tx.subscribe(), move || {
            let api = api.clone();
            let cameras = cameras.clone();
            async move { discover_cameras(&api, &cameras).await }
        });

        let manager = self.manager.clone();
        let cameras = self.cameras.clone();
        let config = self.config.clone();
        let path = self.config_path.clone();
        self.scheduler.add_task("config-flush", flush_interval, self.shutdown_tx.subscribe(), move || {
            let manager = manager.clone();
            let cameras = cameras.clone();
            let config = config.clone();
            let path = path.clone();
            async move {
                let notify = manager.configuration_all().await;
                let snapshot = {
                    let mut config = config.write();
                    config.notify = notify;
                    config.frigate.cameras = cameras.snapshot();
                    config.clone()
                };
                match snapshot.save(&path) {
                    Ok(()) => debug!("Configuration flushed to {:?}", path),
                    Err(e) => error!("Configuration flush failed: {}", e),
                }
            }
        });

        info!("frigate-notify engine started");
        Ok(())
    }

    /// Stops intake, drains the queue into the sinks, removes them and
    /// persists the resulting configuration.
    pub async fn stop(&mut self) -> Result<Config> {
        info!("Stopping frigate-notify engine...");

        // Receivers may all be gone if start() never ran.
        let _ = self.shutdown_tx.send(());
        self.connection.stopped().await;
        self.scheduler.join_all().await;

        let notify = self.manager.shutdown().await;
        let config = {
            let mut config = self.config.write();
            config.notify = notify;
            config.frigate.cameras = self.cameras.snapshot();
            config.clone()
        };
        config.save(&self.config_path)?;
        self.start_time = None;

        info!("frigate-notify engine stopped, configuration saved to {:?}", self.config_path);
        Ok(config)
    }

    pub async fn state(&self) -> SystemState {
        SystemState {
            running: self.start_time.is_some(),
            upstream_connected: self.connection.is_connected(),
            cameras_known: self.cameras.len(),
            events_active: self.tracker.active_count().await,
            notifications_queued: self.queue.len(),
            notifications_dropped: self.queue.dropped(),
            dispatcher: self.manager.state(),
            uptime_seconds: self.uptime(),
        }
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    pub fn tracker(&self) -> &Arc<EventTracker> {
        &self.tracker
    }

    pub fn cameras(&self) -> &Arc<CameraRegistry> {
        &self.cameras
    }

    pub fn status(&self) -> &Arc<StatusAggregator> {
        &self.status
    }

    pub fn web_feed(&self) -> &WebFeed {
        &self.web_feed
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }
}

async fn discover_cameras(api: &FrigateApi, cameras: &CameraRegistry) {
    match api.cameras().await {
        Ok(names) => {
            for name in names {
                cameras.check_or_add(&name);
            }
        }
        Err(e) => debug!("Camera discovery failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::events::{Event, EventPhase, SnapshotError};
    use crate::notify::DispatcherState;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Jpeg;

    #[async_trait]
    impl SnapshotFetcher for Jpeg {
        async fn fetch(&self, _event_id: &str) -> Result<Vec<u8>, SnapshotError> {
            Ok(b"jpeg".to_vec())
        }
    }

    fn offline_config() -> Config {
        let mut config = Config::with_defaults();
        config.frigate.host = "127.0.0.1".into();
        config.frigate.port = 1;
        config.frigate.mqtt_server = "127.0.0.1".into();
        config.frigate.mqtt_port = 1;
        config
    }

    async fn engine(path: &Path, clock: &ManualClock) -> Engine {
        let config = offline_config();
        let api = Arc::new(FrigateApi::new(&config.frigate.api_url(), Duration::from_millis(200)).unwrap());
        Engine::with_parts(config, path, api, Arc::new(Jpeg), Arc::new(clock.clone()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_event_reaches_web_feed_and_config_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let clock = ManualClock::new();
        let mut engine = engine(&path, &clock).await;

        engine.start().await.unwrap();
        engine.cameras().check_or_add("front");
        engine.cameras().activate(&["front"]);
        clock.advance(Duration::from_secs(61));

        engine
            .tracker()
            .ingest(Event::new("E1", "front", "person", EventPhase::New))
            .await
            .unwrap();

        for _ in 0..100 {
            if !engine.web_feed().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let feed = engine.web_feed().recent();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].caption, "camera: front object: person");

        let saved = engine.stop().await.unwrap();
        assert_eq!(saved.notify.get("Web").and_then(|c| c.get("enabled")), Some("true"));
        assert_eq!(saved.frigate.cameras.get("front").map(|c| c.active), Some(true));

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded, saved);
    }

    #[tokio::test]
    async fn test_state_tracks_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let clock = ManualClock::new();
        let mut engine = engine(&path, &clock).await;

        assert!(!engine.state().await.running);
        engine.start().await.unwrap();

        let state = engine.state().await;
        assert!(state.running);
        assert!(!state.upstream_connected);
        assert_eq!(state.dispatcher, DispatcherState::Running);
        assert!(engine.status().get("Web").is_some());
        assert!(!engine.status().get("Frigate").map(|h| h.healthy).unwrap_or(true));

        engine.stop().await.unwrap();
        let state = engine.state().await;
        assert!(!state.running);
        assert_eq!(state.dispatcher, DispatcherState::Stopped);
    }
}
