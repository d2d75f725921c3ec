//! Hand tracking transport.
//!
//! Landmark detection runs out of process: a MediaPipe Hands sidecar
//! (`scripts/hand_tracker.py`) captures camera frames, runs the model and
//! sends one JSON datagram per processed frame. This module receives those
//! datagrams without blocking and optionally manages the sidecar process.

pub mod receiver;
pub mod sidecar;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use receiver::{decode_packet, LandmarkPacket, LandmarkReceiver};
pub use sidecar::{python_module_available, TrackerProcess};

/// Tracker transport and sidecar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Listen for landmark datagrams at all.
    pub enabled: bool,
    pub listen_address: String,
    pub port: u16,
    /// Start the sidecar script ourselves.
    pub auto_launch: bool,
    pub python: String,
    pub script: PathBuf,
    pub camera_device: u32,
    pub capture_width: u32,
    pub capture_height: u32,
    pub capture_fps: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: "127.0.0.1".to_string(),
            port: 39540,
            auto_launch: false,
            python: "python3".to_string(),
            script: PathBuf::from("scripts/hand_tracker.py"),
            camera_device: 0,
            capture_width: 640,
            capture_height: 480,
            capture_fps: 30,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture_fps == 0 {
            return Err(ConfigError::invalid(
                "tracker.capture_fps",
                "must be greater than 0",
            ));
        }
        if self.auto_launch && !self.script.exists() {
            tracing::warn!(
                "Tracker auto_launch enabled but script not found at: {}",
                self.script.display()
            );
        }
        Ok(())
    }

    /// `address:port` the receiver binds to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.listen_address, self.port)
    }
}
