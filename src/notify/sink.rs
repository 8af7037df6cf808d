// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Sink trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Notification, SinkConfig};

/// Failure reported by a single sink operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("{sink}: setup failed: {message}")]
    Setup { sink: String, message: String },

    #[error("{sink}: delivery failed: {message}")]
    Send { sink: String, message: String },

    #[error("{sink}: shutdown failed: {message}")]
    Remove { sink: String, message: String },

    #[error("{sink}: no response after {timeout_ms}ms")]
    Timeout { sink: String, timeout_ms: u64 },
}

impl SinkError {
    pub fn send(sink: &str, message: impl Into<String>) -> Self {
        Self::Send {
            sink: sink.to_string(),
            message: message.into(),
        }
    }

    pub fn setup(sink: &str, message: impl Into<String>) -> Self {
        Self::Setup {
            sink: sink.to_string(),
            message: message.into(),
        }
    }

    pub fn remove(sink: &str, message: impl Into<String>) -> Self {
        Self::Remove {
            sink: sink.to_string(),
            message: message.into(),
        }
    }
}

/// Self-reported health of a sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkStatus {
    pub name: String,
    pub healthy: bool,
    pub message: String,
}

impl SinkStatus {
    pub fn new(name: &str, healthy: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            healthy,
            message: message.into(),
        }
    }
}

/// Delivery channel for notifications
///
/// Implementations may be push-based (a long-lived bot connection), poll-based,
/// or plain HTTP; the dispatcher only relies on this contract.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Stable, unique name. Also the key of the sink's persisted configuration.
    fn name(&self) -> &str;

    /// Initialise from `config`. When `had_existing_config` is false the sink
    /// ignores `config` and builds its own default. Calling it again re-applies.
    async fn setup(&mut self, config: SinkConfig, had_existing_config: bool) -> Result<(), SinkError>;

    /// Single delivery attempt, no retry
    async fn send_notification(&mut self, notification: &Notification) -> Result<(), SinkError>;

    /// Stop background activity and hand back the final configuration
    async fn remove(&mut self) -> Result<SinkConfig, SinkError>;

    /// Current configuration, without tearing anything down
    fn configuration(&self) -> SinkConfig;

    fn status(&self) -> SinkStatus;
}
