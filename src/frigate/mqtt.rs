// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! MQTT subscriber for `frigate/events`

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::FrigateConfig;
use crate::events::{EventMessage, EventTracker};
use crate::notify::{SinkStatus, UpstreamStatus};

/// Topic carrying event lifecycle records
pub const EVENTS_TOPIC: &str = "frigate/events";

/// Name of the upstream row on the status page
pub const UPSTREAM_NAME: &str = "Frigate";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
}

impl From<&FrigateConfig> for MqttConfig {
    fn from(config: &FrigateConfig) -> Self {
        Self {
            broker: config.mqtt_server.clone(),
            port: config.mqtt_port,
            client_id: config.mqtt_client_id.clone(),
            keep_alive_secs: 10,
        }
    }
}

/// Connection to the broker that feeds the event tracker
pub struct FrigateConnection {
    config: MqttConfig,
    connected: Arc<AtomicBool>,
    worker: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl FrigateConnection {
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            connected: Arc::new(AtomicBool::new(false)),
            worker: parking_lot::Mutex::new(None),
        }
    }

    /// Spawns the event loop. Reconnects on its own and re-subscribes on every
    /// connection acknowledgement; exits when `shutdown` fires.
    pub fn start(&self, tracker: Arc<EventTracker>, mut shutdown: broadcast::Receiver<()>) {
        let mut options = MqttOptions::new(&self.config.client_id, &self.config.broker, self.config.port);
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));

        let (client, mut eventloop) = AsyncClient::new(options, 100);
        let connected = self.connected.clone();
        let broker = format!("{}:{}", self.config.broker, self.config.port);

        let handle = tokio::spawn(async move {
            info!("MQTT client started for {}", broker);
            loop {
                let event = tokio::select! {
                    event = eventloop.poll() => event,
                    _ = shutdown.recv() => break,
                };

                match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        connected.store(true, Ordering::SeqCst);
                        info!("MQTT connection established");
                        match client.try_subscribe(EVENTS_TOPIC, QoS::AtLeastOnce) {
                            Ok(()) => info!("Subscribed to MQTT topic: {}", EVENTS_TOPIC),
                            Err(e) => error!("Subscribing to {} failed: {}", EVENTS_TOPIC, e),
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        if msg.topic != EVENTS_TOPIC {
                            debug!("Ignoring message on {}", msg.topic);
                            continue;
                        }
                        handle_event_payload(&tracker, &msg.payload).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        if connected.swap(false, Ordering::SeqCst) {
                            warn!("MQTT connection lost: {}", e);
                        } else {
                            warn!("MQTT error: {}", e);
                        }
                        tokio::select! {
                            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                            _ = shutdown.recv() => break,
                        }
                    }
                }
            }

            if let Err(e) = client.try_disconnect() {
                debug!("MQTT disconnect: {}", e);
            }
            connected.store(false, Ordering::SeqCst);
            info!("MQTT client stopped");
        });

        if let Some(previous) = self.worker.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Waits for the event loop to exit after shutdown
    pub async fn stopped(&self) {
        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                error!("MQTT worker ended abnormally: {}", e);
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl UpstreamStatus for FrigateConnection {
    fn upstream_status(&self) -> SinkStatus {
        let connected = self.is_connected();
        SinkStatus::new(UPSTREAM_NAME, connected, if connected { "OK" } else { "Init" })
    }
}

/// Decodes one `frigate/events` payload and feeds it to the tracker.
/// Undecodable payloads and rejected transitions are logged and dropped.
pub async fn handle_event_payload(tracker: &EventTracker, payload: &[u8]) {
    let message = match EventMessage::from_json(payload) {
        Ok(message) => message,
        Err(e) => {
            warn!("Message could not be parsed ({}): {}", String::from_utf8_lossy(payload), e);
            return;
        }
    };

    if let Err(e) = tracker.ingest(message.into_event()).await {
        warn!("{}", e);
    }
}
