// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Notification module - queue, sink contract, dispatcher, and status

mod queue;
mod sink;
mod manager;
mod status;
mod web;

pub use queue::{NotificationQueue, DEFAULT_QUEUE_CAPACITY};
pub use sink::{Sink, SinkError, SinkStatus};
pub use manager::{DispatcherState, NotificationManager, UpstreamStatus};
pub use status::{ChannelHealth, StatusAggregator};
pub use web::{WebFeed, WebNotification, WebSink, WEB_FEED_SIZE};

pub use crate::config::{NotifyConfig, SinkConfig};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout shown next to every notification
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S %d.%m.%Y";

/// Outbound alert: snapshot plus caption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub caption: String,
    pub timestamp: String,
    /// JPEG snapshot as returned by Frigate
    #[serde(skip)]
    pub image: Vec<u8>,
}

impl Notification {
    pub fn new(caption: impl Into<String>, timestamp: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            caption: caption.into(),
            timestamp: timestamp.into(),
            image,
        }
    }

    /// Notification for a detection of `label` on `camera`
    pub fn for_detection(camera: &str, label: &str, at: DateTime<Utc>, image: Vec<u8>) -> Self {
        Self {
            caption: format!("camera: {} object: {}", camera, label),
            timestamp: at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
            image,
        }
    }
}
