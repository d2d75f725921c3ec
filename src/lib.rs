//! # pinchfield
//!
//! Particle scenes driven by a hand gesture.
//!
//! A webcam hand tracker reports the distance between thumb tip and index
//! tip; pinchfield maps it to a smoothed progress value in `[0, 1]` and uses
//! it to animate one of two scenes:
//!
//! - **Image**: a source image is rasterized into a point cloud. Each
//!   visible pixel becomes a particle that blends between a random position
//!   in a cube and its place in the image.
//! - **Orbital**: a procedurally generated body and ring system. Progress
//!   becomes a zoom uniform; orbits, scaling and jitter are evaluated in the
//!   vertex program.
//!
//! ## Layout
//!
//! The simulation side is plain data and has no GPU dependency:
//! [`point_cloud`], [`particles`], [`orbital`], [`gesture`], [`driver`],
//! [`view`] and [`session`]. [`gpu`] and [`app`] put it on screen with wgpu
//! and winit. Landmarks arrive over UDP from a sidecar process, see
//! [`tracking`].
//!
//! ```ignore
//! use pinchfield::prelude::*;
//!
//! let config = Config::load()?;
//! config.validate()?;
//! pinchfield::run(config)?;
//! ```

pub mod app;
pub mod config;
pub mod driver;
pub mod error;
pub mod gesture;
pub mod gpu;
pub mod orbital;
pub mod panel;
pub mod particles;
pub mod point_cloud;
pub mod sampling;
pub mod session;
pub mod time;
pub mod tracking;
pub mod uniforms;
pub mod view;

pub use app::run;
pub use glam::Vec3;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::config::{Config, SceneKind};
    pub use crate::driver::{AnimationDriver, FrameKind, FrameUpdate, Scene};
    pub use crate::error::{AppError, AssetError, ConfigError, GpuError, TrackingError};
    pub use crate::gesture::{
        Detection, GestureConfig, GestureSignal, HandLandmarks, Landmark, PinchSemantic,
    };
    pub use crate::orbital::{OrbitalConfig, OrbitalField, OrbitalParticle};
    pub use crate::panel::{ColorSource, Tunables};
    pub use crate::particles::ParticleBuffer;
    pub use crate::point_cloud::{ColorPredicate, PointCloudConfig, VisibilityPolicy};
    pub use crate::session::{Session, SessionEvent};
    pub use crate::Vec3;
}
