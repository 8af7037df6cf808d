// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Camera registry - known cameras and their notification switch

use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::CameraConfig;

/// Directory of cameras seen on the event feed or in Frigate's stats
#[derive(Debug, Default)]
pub struct CameraRegistry {
    cameras: Mutex<BTreeMap<String, CameraConfig>>,
}

impl CameraRegistry {
    pub fn new(cameras: BTreeMap<String, CameraConfig>) -> Self {
        Self {
            cameras: Mutex::new(cameras),
        }
    }

    /// Returns the camera, adding it as inactive if it was unknown
    pub fn check_or_add(&self, name: &str) -> CameraConfig {
        let mut cameras = self.cameras.lock();
        cameras
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("Discovered camera: {}", name);
                CameraConfig::inactive(name)
            })
            .clone()
    }

    /// Enables exactly the listed cameras. Unknown names are ignored.
    pub fn activate(&self, active: &[&str]) {
        let mut cameras = self.cameras.lock();
        for camera in cameras.values_mut() {
            camera.active = active.contains(&camera.name.as_str());
        }
        info!("Active cameras: {:?}", active);
    }

    pub fn set_active(&self, name: &str, active: bool) -> bool {
        match self.cameras.lock().get_mut(name) {
            Some(camera) => {
                camera.active = active;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<CameraConfig> {
        self.cameras.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.cameras.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.lock().is_empty()
    }

    /// Copy for persistence
    pub fn snapshot(&self) -> BTreeMap<String, CameraConfig> {
        self.cameras.lock().clone()
    }
}
