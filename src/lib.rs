// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! frigate-notify - Frigate NVR event relay
//!
//! Listens to Frigate's MQTT event stream and turns object detections into
//! notifications:
//! - Lifecycle tracking of events (new, update, end)
//! - Global cooldown between alerts, per-camera enable switch
//! - Bounded, non-blocking notification queue
//! - Concurrent fan-out to pluggable sinks with per-sink timeouts
//! - Live health overview and persisted sink configuration
//! - Console and size-rotated file logging
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    frigate-notify Engine                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐  ┌─────────┐  ┌──────────┐  ┌──────────────┐   │
//! │  │ Frigate  │→ │  Event  │→ │  Queue   │→ │ Notification │   │
//! │  │  MQTT    │  │ Tracker │  │ (bounded)│  │   Manager    │   │
//! │  └──────────┘  └─────────┘  └──────────┘  └──────────────┘   │
//! │       ↓            ↓                        ↓        ↓       │
//! │  ┌──────────┐  ┌─────────┐           ┌────────┐ ┌────────┐   │
//! │  │ Frigate  │  │ Camera  │           │  Sinks │ │ Status │   │
//! │  │ HTTP API │  │Registry │           │        │ │        │   │
//! │  └──────────┘  └─────────┘           └────────┘ └────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod cameras;
pub mod config;
pub mod core;
pub mod events;
pub mod frigate;
pub mod logging;
pub mod notify;

// Re-exports for convenience
pub use cameras::CameraRegistry;
pub use config::Config;
pub use core::{Engine, SystemState};
pub use events::{Event, EventPhase, EventTracker};
pub use frigate::{FrigateApi, FrigateConnection};
pub use notify::{Notification, NotificationManager, NotificationQueue, Sink, StatusAggregator};

/// frigate-notify version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// frigate-notify name
pub const NAME: &str = "frigate-notify";
