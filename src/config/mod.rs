// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Frigate connection and camera configuration
    pub frigate: FrigateConfig,

    /// Per-sink configuration store
    pub notify: NotifyConfig,

    /// Queue and timer tuning
    pub dispatch: DispatchConfig,

    /// Log file next to console output
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {:?}", path))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing configuration {:?}", path))?;
        if config.log_level.is_empty() {
            config.log_level = "info".to_string();
        }
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing configuration {:?}", path))?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::with_defaults();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Default configuration with the log level filled in
    pub fn with_defaults() -> Self {
        Self {
            log_level: "info".to_string(),
            ..Self::default()
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("frigate-notify"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Frigate host and MQTT broker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrigateConfig {
    /// Frigate HTTP API host
    pub host: String,
    pub port: u16,

    /// MQTT broker carrying `frigate/events`
    pub mqtt_server: String,
    pub mqtt_port: u16,
    pub mqtt_client_id: String,

    /// Minimum seconds between two notifications, across all cameras
    pub cooldown_secs: u64,

    /// UI language tag, kept for the admin page
    pub language: String,

    /// Known cameras and whether they notify
    pub cameras: BTreeMap<String, CameraConfig>,
}

impl Default for FrigateConfig {
    fn default() -> Self {
        Self {
            host: "frigate".to_string(),
            port: 5000,
            mqtt_server: "mqtt-server".to_string(),
            mqtt_port: 1883,
            mqtt_client_id: "fnd_sub_v1".to_string(),
            cooldown_secs: 60,
            language: "en".to_string(),
            cameras: BTreeMap::new(),
        }
    }
}

impl FrigateConfig {
    /// Base URL of the Frigate HTTP API
    pub fn api_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Camera entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub name: String,
    pub active: bool,
}

impl CameraConfig {
    /// Cameras are discovered disabled and switched on by an operator
    pub fn inactive(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: false,
        }
    }
}

/// Free-form string settings of a single sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SinkConfig(BTreeMap<String, String>);

impl SinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// `enabled = "true"`; anything else, including absence, is disabled
    pub fn is_enabled(&self) -> bool {
        self.get("enabled") == Some("true")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SinkConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Configuration of every sink, keyed by sink name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub sinks: BTreeMap<String, SinkConfig>,
}

impl NotifyConfig {
    pub fn get(&self, sink: &str) -> Option<&SinkConfig> {
        self.sinks.get(sink)
    }

    pub fn insert(&mut self, sink: &str, config: SinkConfig) {
        self.sinks.insert(sink.to_string(), config);
    }
}

/// Queue sizing, delivery timeout, and maintenance intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Notifications held between ingestion and delivery
    pub queue_capacity: usize,

    /// Upper bound for a single sink delivery
    pub sink_timeout_secs: u64,

    /// Timeout for snapshot and stats requests against Frigate
    pub http_timeout_secs: u64,

    /// Camera discovery interval
    pub camera_poll_interval_secs: u64,

    /// Interval for writing live sink configuration back to disk
    pub config_flush_interval_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            sink_timeout_secs: 10,
            http_timeout_secs: 5,
            camera_poll_interval_secs: 10,
            config_flush_interval_secs: 120 * 60,
        }
    }
}

impl DispatchConfig {
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn camera_poll_interval(&self) -> Duration {
        Duration::from_secs(self.camera_poll_interval_secs.max(1))
    }

    pub fn config_flush_interval(&self) -> Duration {
        Duration::from_secs(self.config_flush_interval_secs.max(1))
    }
}

/// File logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write log lines to `dir/file_name`
    pub file_enabled: bool,
    pub dir: PathBuf,
    pub file_name: String,

    /// Size after which the log file is moved aside and restarted
    pub max_file_bytes: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: true,
            dir: PathBuf::from("logs"),
            file_name: "fnd.log".to_string(),
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

impl LoggingConfig {
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}
