// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Frigate upstream - MQTT event feed and HTTP API

mod api;
mod mqtt;

pub use api::{ApiCamera, ApiStats, FrigateApi};
pub use mqtt::{handle_event_payload, FrigateConnection, MqttConfig, EVENTS_TOPIC, UPSTREAM_NAME};
