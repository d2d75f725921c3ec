//! Procedural orbital particle field: a solid body wrapped in a ring disk.
//!
//! The field is generated once. Motion is not stored as positions; each
//! particle keeps its orbital radius, start angle and angular speed, and the
//! vertex program advances them from the `time` and `zoom` uniforms every
//! frame. [`OrbitalParticle::position_at`] mirrors that program on the host.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sampling::{lerp_color, Sampler};

/// Population a particle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleClass {
    /// Part of the central sphere; does not orbit.
    Body,
    /// Part of the ring disk; orbits with Keplerian speed.
    Ring,
}

/// Device-side motion parameters, supplied as uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitalMotion {
    /// Zoom above which the jitter term switches on.
    pub chaos_threshold: f32,
    /// Jitter displacement at full zoom.
    pub chaos_amplitude: f32,
    /// Positions are scaled by `1 + zoom * zoom_scale`.
    pub zoom_scale: f32,
}

impl Default for OrbitalMotion {
    fn default() -> Self {
        Self {
            chaos_threshold: 0.7,
            chaos_amplitude: 6.0,
            zoom_scale: 1.5,
        }
    }
}

impl OrbitalMotion {
    /// Jitter strength in `[0, 1]` for a given zoom.
    pub fn chaos_intensity(&self, zoom: f32) -> f32 {
        let span = (1.0 - self.chaos_threshold).max(1e-4);
        ((zoom - self.chaos_threshold) / span).clamp(0.0, 1.0)
    }
}

/// Settings for the orbital scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitalConfig {
    /// Total particle count.
    pub count: u32,
    /// Share of particles assigned to the central body.
    pub body_fraction: f32,
    pub body_radius: f32,
    /// Radial spread around `body_radius`.
    pub body_shell: f32,
    /// Latitude stripe colors, south to north.
    pub body_bands: [[f32; 3]; 3],
    pub ring_inner: f32,
    pub ring_outer: f32,
    /// Vertical spread of the ring disk.
    pub ring_thickness: f32,
    /// Sparse band `[gap_start, gap_end)` in the ring.
    pub gap_start: f32,
    pub gap_end: f32,
    /// Probability that a particle landing in the gap is pushed outward.
    pub gap_exclusion: f32,
    /// Angular speed is `kepler_constant / sqrt(radius)`.
    pub kepler_constant: f32,
    pub inner_color: [f32; 3],
    pub outer_color: [f32; 3],
    /// Tilt of the ring plane toward the camera, in degrees.
    pub tilt_degrees: f32,
    pub seed: Option<u64>,
    pub motion: OrbitalMotion,
}

impl Default for OrbitalConfig {
    fn default() -> Self {
        Self {
            count: 60_000,
            body_fraction: 0.3,
            body_radius: 15.0,
            body_shell: 1.0,
            body_bands: [[0.78, 0.55, 0.32], [0.93, 0.82, 0.62], [0.70, 0.50, 0.30]],
            ring_inner: 25.0,
            ring_outer: 65.0,
            ring_thickness: 0.6,
            gap_start: 48.0,
            gap_end: 52.0,
            gap_exclusion: 0.65,
            kepler_constant: 1.5,
            inner_color: [0.85, 0.75, 0.60],
            outer_color: [0.45, 0.50, 0.62],
            tilt_degrees: 20.0,
            seed: None,
            motion: OrbitalMotion::default(),
        }
    }
}

impl OrbitalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::invalid(
                "orbital.count",
                "must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.body_fraction) {
            return Err(ConfigError::invalid(
                "orbital.body_fraction",
                "must be between 0.0 and 1.0",
            ));
        }
        if !(self.body_radius > 0.0) {
            return Err(ConfigError::invalid(
                "orbital.body_radius",
                "must be greater than 0",
            ));
        }
        if !(self.body_shell >= 0.0 && self.body_shell < self.body_radius) {
            return Err(ConfigError::invalid(
                "orbital.body_shell",
                "must be non-negative and below body_radius",
            ));
        }
        if !(self.ring_inner > 0.0 && self.ring_inner < self.ring_outer) {
            return Err(ConfigError::invalid(
                "orbital.ring_inner",
                "must be positive and below ring_outer",
            ));
        }
        let gap_width = self.gap_end - self.gap_start;
        if !(gap_width >= 0.0
            && self.gap_start >= self.ring_inner
            && self.gap_end + gap_width <= self.ring_outer)
        {
            return Err(ConfigError::invalid(
                "orbital.gap_start",
                "gap band and its push-out distance must lie inside the ring",
            ));
        }
        if !(0.0..=1.0).contains(&self.gap_exclusion) {
            return Err(ConfigError::invalid(
                "orbital.gap_exclusion",
                "must be between 0.0 and 1.0",
            ));
        }
        if !(self.kepler_constant > 0.0) {
            return Err(ConfigError::invalid(
                "orbital.kepler_constant",
                "must be greater than 0",
            ));
        }
        if !(self.motion.chaos_threshold < 1.0) {
            return Err(ConfigError::invalid(
                "orbital.motion.chaos_threshold",
                "must be below 1.0",
            ));
        }
        Ok(())
    }

    /// Number of particles in the body population.
    pub fn body_count(&self) -> u32 {
        ((self.count as f32 * self.body_fraction).round() as u32).min(self.count)
    }
}

/// Keplerian angular speed at orbital radius `radius`.
#[inline]
pub fn keplerian_speed(kepler_constant: f32, radius: f32) -> f32 {
    kepler_constant / radius.sqrt()
}

/// One generated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalParticle {
    pub class: ParticleClass,
    /// Rest position. For ring particles only `y` is used during motion.
    pub position: Vec3,
    pub radius: f32,
    pub angle: f32,
    /// Zero marks a non-orbiting particle.
    pub angular_speed: f32,
    pub color: Vec3,
    pub size: f32,
    pub jitter: Vec3,
}

impl OrbitalParticle {
    /// Host-side evaluation of the orbital vertex program.
    pub fn position_at(&self, time: f32, zoom: f32, motion: &OrbitalMotion) -> Vec3 {
        let mut p = self.position;
        if self.angular_speed > 0.0 {
            let a = self.angle + time * self.angular_speed;
            p = Vec3::new(
                a.cos() * self.radius,
                self.position.y,
                a.sin() * self.radius,
            );
        }
        p *= 1.0 + zoom * motion.zoom_scale;

        let pulse = 0.5 + 0.5 * (time * 4.0 + self.angle * 7.0).sin();
        p + self.jitter * motion.chaos_amplitude * motion.chaos_intensity(zoom) * pulse
    }

    pub fn to_gpu(&self) -> OrbitalVertex {
        OrbitalVertex {
            position: self.position.to_array(),
            radius: self.radius,
            color: self.color.to_array(),
            angle: self.angle,
            jitter: self.jitter.to_array(),
            angular_speed: self.angular_speed,
            size: self.size,
            _pad: [0.0; 3],
        }
    }
}

/// Per-instance vertex layout of an orbital particle.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OrbitalVertex {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub angle: f32,
    pub jitter: [f32; 3],
    pub angular_speed: f32,
    pub size: f32,
    pub _pad: [f32; 3],
}

impl OrbitalVertex {
    pub const RADIUS_OFFSET: u64 = 12;
    pub const COLOR_OFFSET: u64 = 16;
    pub const ANGLE_OFFSET: u64 = 28;
    pub const JITTER_OFFSET: u64 = 32;
    pub const SPEED_OFFSET: u64 = 44;
    pub const SIZE_OFFSET: u64 = 48;
}

/// The generated particle population.
#[derive(Debug, Clone)]
pub struct OrbitalField {
    particles: Vec<OrbitalParticle>,
    body_count: usize,
}

impl OrbitalField {
    /// Generate `config.count` particles: the first `body_count()` form the
    /// body, the rest the ring.
    pub fn generate(config: &OrbitalConfig, sampler: &mut Sampler) -> Self {
        let body_count = config.body_count() as usize;
        let total = config.count as usize;
        let mut particles = Vec::with_capacity(total);

        for _ in 0..body_count {
            particles.push(body_particle(config, sampler));
        }
        for _ in body_count..total {
            particles.push(ring_particle(config, sampler));
        }

        tracing::info!(
            "Generated orbital field: {} body, {} ring particles",
            body_count,
            total - body_count
        );

        Self {
            particles,
            body_count,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn body_count(&self) -> usize {
        self.body_count
    }

    pub fn particles(&self) -> &[OrbitalParticle] {
        &self.particles
    }

    pub fn to_gpu(&self) -> Vec<OrbitalVertex> {
        self.particles.iter().map(OrbitalParticle::to_gpu).collect()
    }
}

fn body_particle(config: &OrbitalConfig, sampler: &mut Sampler) -> OrbitalParticle {
    let r = config.body_radius + sampler.random_range(-config.body_shell, config.body_shell);
    let position = sampler.random_on_sphere(r);

    // Three latitude stripes by normalized height.
    let h = if r > 0.0 {
        (position.y / r + 1.0) * 0.5
    } else {
        0.5
    };
    let band = ((h * 3.0) as usize).min(2);
    let shade = sampler.random_range(0.85, 1.0);

    OrbitalParticle {
        class: ParticleClass::Body,
        position,
        radius: r,
        angle: 0.0,
        angular_speed: 0.0,
        color: Vec3::from(config.body_bands[band]) * shade,
        size: sampler.random_range(0.8, 1.2),
        jitter: sampler.random_signed(),
    }
}

fn ring_particle(config: &OrbitalConfig, sampler: &mut Sampler) -> OrbitalParticle {
    let mut r = sampler.random_range(config.ring_inner, config.ring_outer);
    if r >= config.gap_start && r < config.gap_end && sampler.chance(config.gap_exclusion) {
        r += config.gap_end - config.gap_start;
    }

    let angle = sampler.random_range(0.0, std::f32::consts::TAU);
    let half = config.ring_thickness * 0.5;
    let y = sampler.random_range(-half, half);
    let t = (r - config.ring_inner) / (config.ring_outer - config.ring_inner);

    OrbitalParticle {
        class: ParticleClass::Ring,
        position: Vec3::new(angle.cos() * r, y, angle.sin() * r),
        radius: r,
        angle,
        angular_speed: keplerian_speed(config.kepler_constant, r),
        color: lerp_color(config.inner_color.into(), config.outer_color.into(), t),
        size: sampler.random_range(0.4, 1.0),
        jitter: sampler.random_signed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> OrbitalConfig {
        OrbitalConfig {
            count: 2_000,
            seed: Some(11),
            ..OrbitalConfig::default()
        }
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<OrbitalVertex>(), 64);
        assert_eq!(
            std::mem::offset_of!(OrbitalVertex, size) as u64,
            OrbitalVertex::SIZE_OFFSET
        );
        assert_eq!(
            std::mem::offset_of!(OrbitalVertex, jitter) as u64,
            OrbitalVertex::JITTER_OFFSET
        );
    }

    #[test]
    fn test_partition() {
        let config = small_config();
        let field = OrbitalField::generate(&config, &mut Sampler::new(config.seed));
        assert_eq!(field.len(), 2_000);
        assert_eq!(field.body_count(), 600);
        assert!(field.particles()[..600]
            .iter()
            .all(|p| p.class == ParticleClass::Body && p.angular_speed == 0.0));
        assert!(field.particles()[600..]
            .iter()
            .all(|p| p.class == ParticleClass::Ring && p.angular_speed > 0.0));
    }

    #[test]
    fn test_ring_radius_bounds() {
        let config = small_config();
        let field = OrbitalField::generate(&config, &mut Sampler::new(config.seed));
        for p in &field.particles()[field.body_count()..] {
            assert!(p.radius >= config.ring_inner && p.radius < config.ring_outer);
        }
    }

    #[test]
    fn test_body_shell() {
        let config = small_config();
        let field = OrbitalField::generate(&config, &mut Sampler::new(config.seed));
        for p in &field.particles()[..field.body_count()] {
            let d = p.position.length();
            assert!(d >= 14.0 - 1e-3 && d <= 16.0 + 1e-3);
        }
    }

    #[test]
    fn test_gap_is_sparse() {
        let config = OrbitalConfig {
            count: 20_000,
            body_fraction: 0.0,
            seed: Some(5),
            ..OrbitalConfig::default()
        };
        let field = OrbitalField::generate(&config, &mut Sampler::new(config.seed));
        let in_band = |lo: f32, hi: f32| {
            field
                .particles()
                .iter()
                .filter(|p| p.radius >= lo && p.radius < hi)
                .count()
        };
        // Same width bands, one inside the gap, one well clear of it.
        assert!(in_band(48.0, 52.0) * 2 < in_band(30.0, 34.0));
    }

    #[test]
    fn test_non_orbiting_particles_stay_put() {
        let config = small_config();
        let field = OrbitalField::generate(&config, &mut Sampler::new(config.seed));
        let motion = OrbitalMotion::default();
        let p = field.particles()[0];
        assert_eq!(
            p.position_at(0.0, 0.0, &motion),
            p.position_at(37.5, 0.0, &motion)
        );
    }

    #[test]
    fn test_chaos_only_above_threshold() {
        let motion = OrbitalMotion::default();
        assert_eq!(motion.chaos_intensity(0.5), 0.0);
        assert_eq!(motion.chaos_intensity(0.7), 0.0);
        assert!(motion.chaos_intensity(0.85) > 0.0);
        assert_eq!(motion.chaos_intensity(1.0), 1.0);
    }

    #[test]
    fn test_invalid_gap_rejected() {
        let config = OrbitalConfig {
            gap_start: 62.0,
            gap_end: 64.0,
            ..OrbitalConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(OrbitalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_body_rejected() {
        let shell_too_thick = OrbitalConfig {
            body_radius: 2.0,
            body_shell: 3.0,
            ..OrbitalConfig::default()
        };
        match shell_too_thick.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "orbital.body_shell"),
            other => panic!("expected body_shell error, got {:?}", other),
        }

        let no_body = OrbitalConfig {
            body_radius: 0.0,
            ..OrbitalConfig::default()
        };
        match no_body.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "orbital.body_radius"),
            other => panic!("expected body_radius error, got {:?}", other),
        }

        let negative_shell = OrbitalConfig {
            body_shell: -0.5,
            ..OrbitalConfig::default()
        };
        assert!(negative_shell.validate().is_err());
    }
}
