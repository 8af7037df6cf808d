// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Notification manager - owns the sinks and drains the queue into them

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{
    ChannelHealth, Notification, NotificationQueue, NotifyConfig, Sink, SinkError, SinkStatus,
    StatusAggregator,
};

/// Provides the status row of the event source feeding the queue
pub trait UpstreamStatus: Send + Sync {
    fn upstream_status(&self) -> SinkStatus;
}

/// Dispatcher lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatcherState {
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Default)]
struct DeliveryStats {
    delivered: u64,
    failed: u64,
    last_error: Option<String>,
    last_failed: bool,
}

/// Fans every queued notification out to all registered sinks
pub struct NotificationManager {
    queue: Arc<NotificationQueue>,
    sinks: RwLock<BTreeMap<String, Box<dyn Sink>>>,
    persisted: parking_lot::Mutex<NotifyConfig>,
    stats: parking_lot::Mutex<HashMap<String, DeliveryStats>>,
    status: Arc<StatusAggregator>,
    upstream: Option<Arc<dyn UpstreamStatus>>,
    sink_timeout: Duration,
    state: parking_lot::Mutex<DispatcherState>,
    worker: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl NotificationManager {
    pub fn new(
        queue: Arc<NotificationQueue>,
        persisted: NotifyConfig,
        status: Arc<StatusAggregator>,
        sink_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            sinks: RwLock::new(BTreeMap::new()),
            persisted: parking_lot::Mutex::new(persisted),
            stats: parking_lot::Mutex::new(HashMap::new()),
            status,
            upstream: None,
            sink_timeout,
            state: parking_lot::Mutex::new(DispatcherState::Running),
            worker: parking_lot::Mutex::new(None),
        }
    }

    /// Adds an upstream row to every status refresh
    pub fn with_upstream(mut self, upstream: Arc<dyn UpstreamStatus>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Registers the given sinks in order
    pub async fn setup_sinks(&self, sinks: Vec<Box<dyn Sink>>) {
        for sink in sinks {
            self.register(sink).await;
        }
        self.refresh_status().await;
    }

    /// Sets up and registers `sink`. A name that is already registered, or a
    /// failing setup, leaves the registry unchanged and returns false.
    pub async fn register(&self, mut sink: Box<dyn Sink>) -> bool {
        let name = sink.name().to_string();
        let mut sinks = self.sinks.write().await;

        if sinks.contains_key(&name) {
            warn!("Sink {} is already registered", name);
            return false;
        }

        let persisted = self.persisted.lock().get(&name).cloned();
        let had_existing = persisted.is_some();
        if let Err(e) = sink.setup(persisted.unwrap_or_default(), had_existing).await {
            error!("Sink {} setup failed: {}", name, e);
            return false;
        }

        sinks.insert(name.clone(), sink);
        drop(sinks);
        self.stats.lock().entry(name.clone()).or_default();

        info!("Registered sink: {} (persisted config: {})", name, had_existing);
        self.refresh_status().await;
        true
    }

    /// Spawns the single consumer loop over the queue. Returns false, and
    /// spawns nothing, if a worker exists or shutdown has begun.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut worker = self.worker.lock();
        if worker.is_some() || self.state() != DispatcherState::Running {
            warn!("Dispatcher already started, ignoring start request");
            return false;
        }
        let manager = Arc::clone(self);
        *worker = Some(tokio::spawn(async move { manager.run().await }));
        true
    }

    /// Consumer loop. Returns once the queue is closed and drained.
    pub async fn run(&self) {
        info!("Notification dispatcher running");
        while let Some(notification) = self.queue.dequeue().await {
            self.notify_all(&notification).await;
            self.refresh_status().await;
        }
        info!("Notification queue closed and drained");
    }

    /// Offers `notification` to every sink once. Sinks run concurrently, each
    /// bounded by the sink timeout; one failure never affects the others.
    pub async fn notify_all(&self, notification: &Notification) {
        let timeout = self.sink_timeout;
        let mut sinks = self.sinks.write().await;

        let deliveries = sinks.iter_mut().map(|(name, sink)| async move {
            let result = match tokio::time::timeout(timeout, sink.send_notification(notification)).await {
                Ok(result) => result,
                Err(_) => Err(SinkError::Timeout {
                    sink: name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }),
            };
            (name.clone(), result)
        });
        let results = join_all(deliveries).await;
        drop(sinks);

        let mut stats = self.stats.lock();
        for (name, result) in results {
            let entry = stats.entry(name.clone()).or_default();
            match result {
                Ok(()) => {
                    entry.delivered += 1;
                    entry.last_failed = false;
                    debug!("Delivered to {}: {}", name, notification.caption);
                }
                Err(e) => {
                    entry.failed += 1;
                    entry.last_failed = true;
                    entry.last_error = Some(e.to_string());
                    warn!("Delivery to {} failed: {}", name, e);
                }
            }
        }
    }

    /// Recomputes the status table from the upstream and every sink
    pub async fn refresh_status(&self) {
        let sinks = self.sinks.read().await;
        let stats = self.stats.lock().clone();

        let mut rows = Vec::with_capacity(sinks.len() + 1);
        if let Some(upstream) = &self.upstream {
            rows.push(ChannelHealth::from_status(upstream.upstream_status()));
        }
        for (name, sink) in sinks.iter() {
            let mut row = ChannelHealth::from_status(sink.status());
            row.name = name.clone();
            if let Some(s) = stats.get(name) {
                row.delivered = s.delivered;
                row.failed = s.failed;
                row.last_error = s.last_error.clone();
                row.healthy = row.healthy && !s.last_failed;
            }
            rows.push(row);
        }
        drop(sinks);

        self.status.replace_all(rows);
    }

    /// Live configuration of every sink merged over the persisted store
    pub async fn configuration_all(&self) -> NotifyConfig {
        let sinks = self.sinks.read().await;
        let mut persisted = self.persisted.lock();
        for (name, sink) in sinks.iter() {
            persisted.insert(name, sink.configuration());
        }
        persisted.clone()
    }

    /// Tears every sink down and returns the merged final configuration.
    /// A sink whose removal fails keeps its previously persisted entry.
    pub async fn remove_all(&self) -> NotifyConfig {
        let drained = std::mem::take(&mut *self.sinks.write().await);

        let mut finals = Vec::with_capacity(drained.len());
        for (name, mut sink) in drained {
            match sink.remove().await {
                Ok(config) => {
                    info!("Removed sink: {}", name);
                    finals.push((name, config));
                }
                Err(e) => error!("Removing sink {} failed: {}", name, e),
            }
        }

        let mut persisted = self.persisted.lock();
        for (name, config) in finals {
            persisted.insert(&name, config);
        }
        persisted.clone()
    }

    /// Draining: close the queue, let the consumer deliver what is left,
    /// remove every sink. Returns the configuration to persist.
    pub async fn shutdown(&self) -> NotifyConfig {
        self.set_state(DispatcherState::Draining);
        info!(pending = self.queue.len(), "Dispatcher draining");
        self.queue.close();

        let worker = self.worker.lock().take();
        match worker {
            Some(handle) => {
                if let Err(e) = handle.await {
                    error!("Dispatcher worker ended abnormally: {}", e);
                }
            }
            None => self.run().await,
        }

        // last rows keep their counters; removed sinks are flagged afterwards
        self.refresh_status().await;
        let names = self.sink_names().await;
        let config = self.remove_all().await;
        for name in &names {
            self.status.mark_stopped(name);
        }
        self.set_state(DispatcherState::Stopped);
        info!(dropped = self.queue.dropped(), "Dispatcher stopped");
        config
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.lock()
    }

    fn set_state(&self, state: DispatcherState) {
        *self.state.lock() = state;
    }

    pub async fn sink_names(&self) -> Vec<String> {
        self.sinks.read().await.keys().cloned().collect()
    }

    pub fn status(&self) -> &Arc<StatusAggregator> {
        &self.status
    }

    pub fn queue(&self) -> &Arc<NotificationQueue> {
        &self.queue
    }
}
