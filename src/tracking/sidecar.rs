//! Tracker sidecar process.
//!
//! Launches the Python hand tracker as a child process and guarantees it is
//! killed and reaped on stop or drop.

use std::process::{Child, Command, Stdio};

use super::TrackerConfig;
use crate::error::TrackingError;

/// Handle to a running hand tracker sidecar.
pub struct TrackerProcess {
    child: Option<Child>,
}

impl TrackerProcess {
    /// Launch the tracker script.
    ///
    /// Runs: `<python> <script> --ip <listen_address> --port <port>
    ///        --capture <camera_device> --width <w> --height <h> --fps <fps>`
    pub fn launch(config: &TrackerConfig) -> Result<Self, TrackingError> {
        let child = Command::new(&config.python)
            .arg(&config.script)
            .args(["--ip", &config.listen_address])
            .args(["--port", &config.port.to_string()])
            .args(["--capture", &config.camera_device.to_string()])
            .args(["--width", &config.capture_width.to_string()])
            .args(["--height", &config.capture_height.to_string()])
            .args(["--fps", &config.capture_fps.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| TrackingError::Launch {
                script: config.script.clone(),
                source,
            })?;

        tracing::info!(
            "Hand tracker started (pid: {}, camera: {}, port: {})",
            child.id(),
            config.camera_device,
            config.port,
        );

        Ok(Self { child: Some(child) })
    }

    /// Check if the sidecar is still running (non-blocking).
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    tracing::warn!("Hand tracker exited with: {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to check hand tracker status: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Kill and reap the sidecar. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::info!("Stopping hand tracker (pid: {})", child.id());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for TrackerProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Check whether `python -c "import <module>"` succeeds.
pub fn python_module_available(python: &str, module: &str) -> bool {
    Command::new(python)
        .args(["-c", &format!("import {}", module)])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
