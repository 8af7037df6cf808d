// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Health snapshot of the upstream connection and every sink

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SinkStatus;

/// One row of the status page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHealth {
    pub name: String,
    pub healthy: bool,
    pub message: String,
    pub delivered: u64,
    pub failed: u64,
    pub last_error: Option<String>,
}

impl ChannelHealth {
    pub fn from_status(status: SinkStatus) -> Self {
        Self {
            name: status.name,
            healthy: status.healthy,
            message: status.message,
            delivered: 0,
            failed: 0,
            last_error: None,
        }
    }
}

/// Read-mostly `name -> health` table
#[derive(Debug, Default)]
pub struct StatusAggregator {
    entries: RwLock<BTreeMap<String, ChannelHealth>>,
}

impl StatusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, health: ChannelHealth) {
        self.entries.write().insert(health.name.clone(), health);
    }

    /// Swaps in a freshly computed table
    pub fn replace_all(&self, entries: impl IntoIterator<Item = ChannelHealth>) {
        let fresh: BTreeMap<String, ChannelHealth> = entries.into_iter().map(|h| (h.name.clone(), h)).collect();
        *self.entries.write() = fresh;
    }

    /// Flags a removed channel while keeping its counters
    pub fn mark_stopped(&self, name: &str) {
        if let Some(row) = self.entries.write().get_mut(name) {
            row.healthy = false;
            row.message = "stopped".to_string();
        }
    }

    pub fn get(&self, name: &str) -> Option<ChannelHealth> {
        self.entries.read().get(name).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, ChannelHealth> {
        self.entries.read().clone()
    }

    /// True when every channel reports healthy
    pub fn all_healthy(&self) -> bool {
        self.entries.read().values().all(|h| h.healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_all_drops_stale_rows() {
        let status = StatusAggregator::new();
        status.update(ChannelHealth::from_status(SinkStatus::new("Old", true, "OK")));

        status.replace_all(vec![
            ChannelHealth::from_status(SinkStatus::new("Frigate", false, "Init")),
            ChannelHealth::from_status(SinkStatus::new("Web", true, "OK")),
        ]);

        let snapshot = status.snapshot();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["Frigate", "Web"]);
        assert!(!status.all_healthy());
        assert_eq!(status.get("Frigate").unwrap().message, "Init");
    }

    #[test]
    fn test_mark_stopped_keeps_counters() {
        let status = StatusAggregator::new();
        let mut row = ChannelHealth::from_status(SinkStatus::new("Web", true, "OK"));
        row.delivered = 4;
        status.update(row);

        status.mark_stopped("Web");
        status.mark_stopped("Unknown");

        let web = status.get("Web").unwrap();
        assert!(!web.healthy);
        assert_eq!(web.message, "stopped");
        assert_eq!(web.delivered, 4);
        assert!(status.get("Unknown").is_none());
    }
}
