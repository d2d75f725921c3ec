//! Particle buffer for the position-blend scene.
//!
//! Parallel arrays, one entry per particle: current, initial (dispersed) and
//! target (image) positions plus a source color. All arrays share one length
//! fixed at construction.

use glam::Vec3;

/// One particle as produced by a generator, before it is split into the
/// parallel arrays of a [`ParticleBuffer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticlePoint {
    pub initial: Vec3,
    pub target: Vec3,
    pub color: Vec3,
}

/// Parallel position/attribute arrays for point-rendered particles.
#[derive(Debug, Clone)]
pub struct ParticleBuffer {
    current: Vec<Vec3>,
    initial: Vec<Vec3>,
    target: Vec<Vec3>,
    colors: Vec<Vec3>,
    dispersion: f32,
    dirty: bool,
}

impl ParticleBuffer {
    /// Build a buffer from generated points. Current positions start at the
    /// initial (dispersed) positions.
    ///
    /// `dispersion` is the half-width of the cube the initial positions were
    /// drawn from; it is what [`set_dispersion`](Self::set_dispersion)
    /// rescales against.
    pub fn from_points(points: Vec<ParticlePoint>, dispersion: f32) -> Self {
        let n = points.len();
        let mut initial = Vec::with_capacity(n);
        let mut target = Vec::with_capacity(n);
        let mut colors = Vec::with_capacity(n);
        for p in points {
            initial.push(p.initial);
            target.push(p.target);
            colors.push(p.color);
        }

        Self {
            current: initial.clone(),
            initial,
            target,
            colors,
            dispersion,
            dirty: true,
        }
    }

    /// A buffer with no particles.
    pub fn empty(dispersion: f32) -> Self {
        Self::from_points(Vec::new(), dispersion)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn current(&self) -> &[Vec3] {
        &self.current
    }

    pub fn initial(&self) -> &[Vec3] {
        &self.initial
    }

    pub fn target(&self) -> &[Vec3] {
        &self.target
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn dispersion(&self) -> f32 {
        self.dispersion
    }

    /// Interpolate every current position between its initial and target
    /// position and mark the buffer dirty.
    ///
    /// Written as `initial * (1 - t) + target * t` so that `t = 0` and `t = 1`
    /// land exactly on the endpoints.
    pub fn blend(&mut self, progress: f32) {
        let t = progress.clamp(0.0, 1.0);
        let s = 1.0 - t;
        for ((cur, init), tgt) in self
            .current
            .iter_mut()
            .zip(&self.initial)
            .zip(&self.target)
        {
            *cur = *init * s + *tgt * t;
        }
        self.dirty = true;
    }

    /// Change the dispersion cube half-width, rescaling every initial
    /// position by `new / old`. Non-positive values are ignored.
    pub fn set_dispersion(&mut self, dispersion: f32) {
        if dispersion <= 0.0 || self.dispersion <= 0.0 || dispersion == self.dispersion {
            return;
        }
        let ratio = dispersion / self.dispersion;
        for p in &mut self.initial {
            *p *= ratio;
        }
        self.dispersion = dispersion;
        self.dirty = true;
    }

    /// Returns whether positions changed since the last call, clearing the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParticleBuffer {
        ParticleBuffer::from_points(
            vec![
                ParticlePoint {
                    initial: Vec3::new(-3.7, 12.1, 0.3),
                    target: Vec3::new(4.0, -2.0, 0.0),
                    color: Vec3::ONE,
                },
                ParticlePoint {
                    initial: Vec3::new(100.9, -0.001, 77.7),
                    target: Vec3::new(-8.0, 6.0, 0.0),
                    color: Vec3::ZERO,
                },
            ],
            200.0,
        )
    }

    #[test]
    fn test_arrays_share_length() {
        let buf = sample();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.initial().len(), buf.len());
        assert_eq!(buf.target().len(), buf.len());
        assert_eq!(buf.colors().len(), buf.len());
    }

    #[test]
    fn test_blend_endpoints_are_exact() {
        let mut buf = sample();
        buf.blend(1.0);
        assert_eq!(buf.current(), buf.target());
        buf.blend(0.0);
        assert_eq!(buf.current(), buf.initial());
    }

    #[test]
    fn test_blend_midpoint() {
        let mut buf = sample();
        buf.blend(0.5);
        let expected = (buf.initial()[0] + buf.target()[0]) * 0.5;
        assert!((buf.current()[0] - expected).length() < 1e-4);
    }

    #[test]
    fn test_dirty_flag() {
        let mut buf = sample();
        assert!(buf.take_dirty());
        assert!(!buf.take_dirty());
        buf.blend(0.3);
        assert!(buf.take_dirty());
    }

    #[test]
    fn test_set_dispersion_rescales_initial() {
        let mut buf = sample();
        let before = buf.initial()[1];
        buf.take_dirty();
        buf.set_dispersion(400.0);
        assert!((buf.initial()[1] - before * 2.0).length() < 1e-3);
        assert_eq!(buf.dispersion(), 400.0);
        assert!(buf.take_dirty());

        buf.set_dispersion(0.0);
        assert_eq!(buf.dispersion(), 400.0);
    }

    #[test]
    fn test_empty_blend_is_noop() {
        let mut buf = ParticleBuffer::empty(10.0);
        buf.blend(0.7);
        assert!(buf.is_empty());
    }
}
