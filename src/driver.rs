//! Animation driver.
//!
//! Two states: [`DriverState::Idle`] before a scene has been loaded and
//! [`DriverState::Active`] once one has. Every tick reads the latest gesture
//! progress and produces a [`FrameUpdate`] describing what the renderer must
//! do this frame. The image scene blends positions on the host; the orbital
//! scene only advances `time` and forwards progress as `zoom`, leaving the
//! motion itself to the vertex program.

use crate::orbital::OrbitalField;
use crate::particles::ParticleBuffer;

/// A loaded scene.
#[derive(Debug, Clone)]
pub enum Scene {
    /// Image point cloud, moved by blending initial and target positions.
    Blend(ParticleBuffer),
    /// Orbital field, moved by the vertex program.
    Orbital(OrbitalField),
}

impl Scene {
    pub fn len(&self) -> usize {
        match self {
            Scene::Blend(buffer) => buffer.len(),
            Scene::Orbital(field) => field.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub enum DriverState {
    Idle,
    Active(Scene),
}

/// What a single frame draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameKind {
    /// Clear only.
    Background,
    /// Blended point cloud. `upload` is set when positions changed since
    /// the last frame.
    Points { rotation: f32, upload: bool },
    /// Orbital field driven by uniforms.
    Orbital { time: f32, zoom: f32 },
}

/// Result of one driver tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    pub kind: FrameKind,
    /// Progress value the frame was computed from.
    pub progress: f32,
}

/// Per-frame scheduler for the active scene.
#[derive(Debug)]
pub struct AnimationDriver {
    state: DriverState,
    /// Radians added to the image scene's Y rotation each frame.
    rotation_speed: f32,
    rotation: f32,
    time: f32,
    running: bool,
}

impl AnimationDriver {
    pub fn new(rotation_speed: f32) -> Self {
        Self {
            state: DriverState::Idle,
            rotation_speed,
            rotation: 0.0,
            time: 0.0,
            running: true,
        }
    }

    /// Install a scene, replacing any previous one.
    pub fn load(&mut self, scene: Scene) {
        tracing::debug!("Animation driver active with {} particles", scene.len());
        self.state = DriverState::Active(scene);
        self.rotation = 0.0;
        self.time = 0.0;
    }

    /// Drop the scene and return to idle.
    pub fn clear(&mut self) {
        self.state = DriverState::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DriverState::Active(_))
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.state {
            DriverState::Active(scene) => Some(scene),
            DriverState::Idle => None,
        }
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        match &mut self.state {
            DriverState::Active(scene) => Some(scene),
            DriverState::Idle => None,
        }
    }

    /// Accumulated Y rotation of the image scene.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Accumulated orbital time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance one frame. Returns `None` once the driver has been cancelled.
    pub fn tick(&mut self, dt: f32, progress: f32) -> Option<FrameUpdate> {
        if !self.running {
            return None;
        }
        let progress = progress.clamp(0.0, 1.0);

        let kind = match &mut self.state {
            DriverState::Idle => FrameKind::Background,
            DriverState::Active(Scene::Blend(buffer)) => {
                if buffer.is_empty() {
                    FrameKind::Background
                } else {
                    buffer.blend(progress);
                    self.rotation = (self.rotation + self.rotation_speed) % std::f32::consts::TAU;
                    FrameKind::Points {
                        rotation: self.rotation,
                        upload: buffer.take_dirty(),
                    }
                }
            }
            DriverState::Active(Scene::Orbital(field)) => {
                self.time += dt.max(0.0);
                if field.is_empty() {
                    FrameKind::Background
                } else {
                    FrameKind::Orbital {
                        time: self.time,
                        zoom: progress,
                    }
                }
            }
        };

        Some(FrameUpdate { kind, progress })
    }

    /// Stop scheduling frames. Idempotent.
    pub fn cancel(&mut self) {
        if self.running {
            tracing::debug!("Animation driver cancelled");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
