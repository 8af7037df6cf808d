// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Frigate HTTP API client

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::events::{SnapshotError, SnapshotFetcher};

/// Per-camera block of `/api/stats`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiCamera {
    pub camera_fps: f64,
    pub process_fps: f64,
    pub skipped_fps: f64,
    pub detection_fps: f64,
    pub detection_enabled: bool,
    pub pid: i64,
    pub capture_pid: i64,
    pub ffmpeg_pid: i64,
    pub audio_rms: f64,
    #[serde(rename = "audio_dBFS")]
    pub audio_dbfs: f64,
}

/// Subset of `/api/stats` used for camera discovery
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiStats {
    #[serde(default)]
    pub cameras: BTreeMap<String, ApiCamera>,
}

/// Client for snapshot and stats endpoints
pub struct FrigateApi {
    base_url: String,
    client: reqwest::Client,
}

impl FrigateApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("building HTTP client failed: {}", e))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn snapshot_url(&self, event_id: &str) -> String {
        format!("{}/api/events/{}/snapshot.jpg", self.base_url, event_id)
    }

    pub fn stats_url(&self) -> String {
        format!("{}/api/stats", self.base_url)
    }

    /// JPEG snapshot of an event
    pub async fn snapshot(&self, event_id: &str) -> Result<Vec<u8>, SnapshotError> {
        let response = self
            .client
            .get(self.snapshot_url(event_id))
            .send()
            .await
            .map_err(|e| SnapshotError::Transport(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SnapshotError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SnapshotError::Transport(e.to_string()))?;
        debug!("Fetched snapshot for {} ({} bytes)", event_id, body.len());
        Ok(body.to_vec())
    }

    pub async fn stats(&self) -> Result<ApiStats> {
        let response = self.client.get(self.stats_url()).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(anyhow!("stats request answered with status {}", status.as_u16()));
        }

        Ok(response.json::<ApiStats>().await?)
    }

    /// Names of all cameras Frigate currently reports
    pub async fn cameras(&self) -> Result<Vec<String>> {
        Ok(self.stats().await?.cameras.into_keys().collect())
    }
}

#[async_trait]
impl SnapshotFetcher for FrigateApi {
    async fn fetch(&self, event_id: &str) -> Result<Vec<u8>, SnapshotError> {
        self.snapshot(event_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let api = FrigateApi::new("http://frigate:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://frigate:5000");
        assert_eq!(
            api.snapshot_url("1718-abc"),
            "http://frigate:5000/api/events/1718-abc/snapshot.jpg"
        );
        assert_eq!(api.stats_url(), "http://frigate:5000/api/stats");
    }

    #[test]
    fn test_parse_stats() {
        let body = r#"{
            "cameras": {
                "front": {"camera_fps": 5.1, "process_fps": 5.0, "detection_enabled": true,
                          "pid": 412, "audio_dBFS": -42.5},
                "garage": {"camera_fps": 0.0}
            },
            "detection_fps": 3.2,
            "service": {"uptime": 1234}
        }"#;

        let stats: ApiStats = serde_json::from_str(body).unwrap();
        assert_eq!(stats.cameras.keys().collect::<Vec<_>>(), vec!["front", "garage"]);
        assert!(stats.cameras["front"].detection_enabled);
        assert_eq!(stats.cameras["front"].audio_dbfs, -42.5);
        assert_eq!(stats.cameras["garage"].pid, 0);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let api = FrigateApi::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        match api.fetch("e1").await {
            Err(SnapshotError::Transport(_)) => {}
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
