// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Web sink - keeps the latest notifications for the admin page

use async_trait::async_trait;
use base64::Engine;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use super::{Notification, Sink, SinkConfig, SinkError, SinkStatus};

/// Number of notifications shown on the overview page
pub const WEB_FEED_SIZE: usize = 3;

const NAME: &str = "Web";

/// Notification as rendered by the admin page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebNotification {
    pub caption: String,
    pub timestamp: String,
    /// Snapshot as standard base64, ready for a `data:` URL
    pub jpeg_base64: String,
}

/// Shared, newest-first view of the last [`WEB_FEED_SIZE`] notifications
#[derive(Debug, Clone, Default)]
pub struct WebFeed {
    entries: Arc<RwLock<VecDeque<WebNotification>>>,
}

impl WebFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, notification: &Notification) {
        let entry = WebNotification {
            caption: notification.caption.clone(),
            timestamp: notification.timestamp.clone(),
            jpeg_base64: base64::engine::general_purpose::STANDARD.encode(&notification.image),
        };

        let mut entries = self.entries.write();
        entries.push_front(entry);
        entries.truncate(WEB_FEED_SIZE);
    }

    pub fn recent(&self) -> Vec<WebNotification> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// In-process sink feeding [`WebFeed`]
pub struct WebSink {
    config: SinkConfig,
    feed: WebFeed,
}

impl WebSink {
    pub fn new(feed: WebFeed) -> Self {
        Self {
            config: Self::default_config(),
            feed,
        }
    }

    fn default_config() -> SinkConfig {
        [("enabled", "true")].into_iter().collect()
    }

    pub fn feed(&self) -> &WebFeed {
        &self.feed
    }
}

#[async_trait]
impl Sink for WebSink {
    fn name(&self) -> &str {
        NAME
    }

    async fn setup(&mut self, config: SinkConfig, had_existing_config: bool) -> Result<(), SinkError> {
        self.config = if had_existing_config {
            config
        } else {
            Self::default_config()
        };
        Ok(())
    }

    async fn send_notification(&mut self, notification: &Notification) -> Result<(), SinkError> {
        if !self.config.is_enabled() {
            debug!("Web sink disabled, skipping: {}", notification.caption);
            return Ok(());
        }
        self.feed.push(notification);
        Ok(())
    }

    async fn remove(&mut self) -> Result<SinkConfig, SinkError> {
        Ok(self.config.clone())
    }

    fn configuration(&self) -> SinkConfig {
        self.config.clone()
    }

    fn status(&self) -> SinkStatus {
        let message = if self.config.is_enabled() { "OK" } else { "disabled" };
        SinkStatus::new(NAME, true, message)
    }
}
