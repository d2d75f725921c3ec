//! Seeded random sampling for particle generation.
//!
//! Both the image point cloud (dispersed start positions) and the orbital
//! field draw from a [`Sampler`]. Passing a seed makes generation
//! reproducible; without one the sampler is seeded from OS entropy.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Random source with helpers for the spawn patterns used by the scenes.
pub struct Sampler {
    rng: SmallRng,
}

impl Sampler {
    /// Create a sampler, deterministic when `seed` is given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { rng }
    }

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Returns `true` with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.random() < p
    }

    /// Random point inside a cube of given half-size, centered at origin.
    pub fn random_in_cube(&mut self, half_size: f32) -> Vec3 {
        Vec3::new(
            self.random_range(-half_size, half_size),
            self.random_range(-half_size, half_size),
            self.random_range(-half_size, half_size),
        )
    }

    /// Random point on a sphere of given radius.
    ///
    /// Inclination is drawn as `acos(2u - 1)` so points are uniform over the
    /// surface instead of bunching at the poles.
    pub fn random_on_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = self.random_range(0.0, TAU);
        let phi = (2.0 * self.random() - 1.0).clamp(-1.0, 1.0).acos();

        Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.cos(),
            radius * phi.sin() * theta.sin(),
        )
    }

    /// Random vector with each component in `[-1, 1)`.
    pub fn random_signed(&mut self) -> Vec3 {
        self.random_in_cube(1.0)
    }
}

/// Linear blend between two colors.
pub fn lerp_color(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a.lerp(b, t.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_samplers_agree() {
        let mut a = Sampler::new(Some(7));
        let mut b = Sampler::new(Some(7));
        for _ in 0..32 {
            assert_eq!(a.random_in_cube(10.0), b.random_in_cube(10.0));
        }
    }

    #[test]
    fn test_random_in_cube_bounds() {
        let mut s = Sampler::new(Some(1));
        for _ in 0..1000 {
            let p = s.random_in_cube(2.5);
            assert!(p.abs().max_element() <= 2.5);
        }
    }

    #[test]
    fn test_random_on_sphere_radius() {
        let mut s = Sampler::new(Some(3));
        for _ in 0..200 {
            let p = s.random_on_sphere(15.0);
            assert!((p.length() - 15.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_empty_range_returns_min() {
        let mut s = Sampler::new(Some(0));
        assert_eq!(s.random_range(4.0, 4.0), 4.0);
        assert_eq!(s.random_in_cube(0.0), Vec3::ZERO);
    }

    #[test]
    fn test_lerp_color_clamps() {
        let a = Vec3::ZERO;
        let b = Vec3::ONE;
        assert_eq!(lerp_color(a, b, 2.0), Vec3::ONE);
        assert_eq!(lerp_color(a, b, -1.0), Vec3::ZERO);
    }
}
