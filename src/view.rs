//! View state: orbit camera, projection and output size.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Camera settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting distance; `None` picks a distance that frames the scene.
    pub distance: Option<f32>,
    pub pitch: f32,
    pub yaw: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: None,
            pitch: 0.0,
            yaw: 0.0,
            fov_degrees: 60.0,
            near: 0.1,
            far: 10_000.0,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::invalid(
                "camera.fov_degrees",
                "must be between 0 and 180",
            ));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(ConfigError::invalid(
                "camera.near",
                "must be positive and below camera.far",
            ));
        }
        if matches!(self.distance, Some(d) if !(d > 0.0)) {
            return Err(ConfigError::invalid(
                "camera.distance",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Orbit camera around a target point.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    min_distance: f32,
    max_distance: f32,
}

impl Camera {
    /// Create a camera at `distance`; scroll zoom is limited to a tenth and
    /// four times that distance.
    pub fn new(yaw: f32, pitch: f32, distance: f32) -> Self {
        Self {
            yaw,
            pitch,
            distance,
            target: Vec3::ZERO,
            min_distance: distance * 0.1,
            max_distance: distance * 4.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Rotate by a mouse drag in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-1.5, 1.5);
    }

    /// Move toward/away from the target by a scroll amount in lines.
    pub fn zoom(&mut self, lines: f32) {
        let step = self.distance * 0.1;
        self.distance = (self.distance - lines * step).clamp(self.min_distance, self.max_distance);
    }
}

/// Camera parameters plus renderer output size.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub camera: Camera,
    width: u32,
    height: u32,
    fov_y: f32,
    near: f32,
    far: f32,
}

impl ViewState {
    pub fn new(width: u32, height: u32, config: &CameraConfig, default_distance: f32) -> Self {
        let distance = config.distance.unwrap_or(default_distance);
        Self {
            camera: Camera::new(config.yaw, config.pitch, distance),
            width: width.max(1),
            height: height.max(1),
            fov_y: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
        }
    }

    /// Apply a new output size. Zero-sized (minimized) windows are ignored.
    /// Returns whether the size changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect(), self.near, self.far)
    }

    /// Projection * view * model.
    pub fn view_projection(&self, model: Mat4) -> Mat4 {
        self.projection() * self.camera.view_matrix() * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_position_on_axis() {
        let cam = Camera::new(0.0, 0.0, 10.0);
        assert!((cam.position() - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_orbit_clamps_pitch() {
        let mut cam = Camera::new(0.0, 0.0, 10.0);
        cam.orbit(0.0, 10_000.0);
        assert_eq!(cam.pitch, 1.5);
    }

    #[test]
    fn test_zoom_limits() {
        let mut cam = Camera::new(0.0, 0.0, 100.0);
        for _ in 0..200 {
            cam.zoom(1.0);
        }
        assert!((cam.distance - 10.0).abs() < 1e-3);
        for _ in 0..200 {
            cam.zoom(-1.0);
        }
        assert!((cam.distance - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_resize_ignores_zero() {
        let mut view = ViewState::new(800, 600, &CameraConfig::default(), 100.0);
        assert!(!view.resize(0, 600));
        assert_eq!(view.size(), (800, 600));
    }

    #[test]
    fn test_config_distance_overrides_default() {
        let config = CameraConfig {
            distance: Some(42.0),
            ..CameraConfig::default()
        };
        let view = ViewState::new(800, 600, &config, 100.0);
        assert_eq!(view.camera.distance, 42.0);
    }
}
