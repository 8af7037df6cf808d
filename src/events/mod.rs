// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Detection events - wire format, lifecycle tracking, and cooldown

mod cooldown;
mod tracker;

pub use cooldown::{CooldownGate, CooldownState};
pub use tracker::EventTracker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle phase of a tracked detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventPhase {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "update")]
    Updated,
    #[serde(rename = "end")]
    Ended,
}

impl std::fmt::Display for EventPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventPhase::New => "new",
            EventPhase::Updated => "update",
            EventPhase::Ended => "end",
        };
        f.write_str(s)
    }
}

/// A detection as seen by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub camera: String,
    pub label: String,
    pub phase: EventPhase,
}

impl Event {
    pub fn new(id: &str, camera: &str, label: &str, phase: EventPhase) -> Self {
        Self {
            id: id.to_string(),
            camera: camera.to_string(),
            label: label.to_string(),
            phase,
        }
    }
}

/// Object state inside a `frigate/events` message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBody {
    pub id: String,
    pub camera: String,
    pub label: String,
    pub top_score: f32,
    pub false_positive: bool,
    pub score: f32,
}

/// Payload published by Frigate on `frigate/events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub phase: EventPhase,
    #[serde(default)]
    pub before: EventBody,
    #[serde(default)]
    pub after: EventBody,
}

impl EventMessage {
    pub fn from_json(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }

    /// The event is identified by its `before` state, as Frigate keeps the id
    /// and camera stable across both halves
    pub fn into_event(self) -> Event {
        Event {
            id: self.before.id,
            camera: self.before.camera,
            label: self.before.label,
            phase: self.phase,
        }
    }
}

/// Failure fetching an event snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("upstream answered with status {0}")]
    Status(u16),

    #[error("snapshot request failed: {0}")]
    Transport(String),
}

/// Errors from a single lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("unexpected new event {id}: already active")]
    DuplicateEvent { id: String },

    #[error("unexpected {phase} event {id}: not active")]
    OrphanEvent { id: String, phase: EventPhase },

    #[error("snapshot for event {id} unavailable: {source}")]
    SnapshotFetch {
        id: String,
        #[source]
        source: SnapshotError,
    },
}

/// Source of the JPEG snapshot attached to a notification
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch(&self, event_id: &str) -> Result<Vec<u8>, SnapshotError>;
}
