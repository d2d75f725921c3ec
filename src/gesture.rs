//! Gesture signal: hand landmarks to a smoothed scalar in `[0, 1]`.
//!
//! Every detection result updates a target value: the thumb-to-index
//! fingertip distance mapped through the configured input range, or, with no
//! hand in view, the previous target decayed toward zero. The published
//! `progress` follows the target by exponential smoothing, once per
//! detection. Renderers read `progress` whenever they draw and never wait
//! for a fresh detection.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TrackingError};

/// Landmarks per detected hand.
pub const LANDMARK_COUNT: usize = 21;
/// Index of the thumb tip landmark.
pub const THUMB_TIP: usize = 4;
/// Index of the index-finger tip landmark.
pub const INDEX_TIP: usize = 8;

/// A point on a detected hand in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// The full landmark set of one hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks([Landmark; LANDMARK_COUNT]);

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self(points)
    }

    /// Build from raw `[x, y, z]` triples; the slice must hold exactly
    /// [`LANDMARK_COUNT`] points.
    pub fn from_triples(points: &[[f32; 3]]) -> Result<Self, TrackingError> {
        if points.len() != LANDMARK_COUNT {
            return Err(TrackingError::Landmarks(points.len()));
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        for (dst, [x, y, z]) in out.iter_mut().zip(points.iter().copied()) {
            *dst = Landmark::new(x, y, z);
        }
        Ok(Self(out))
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.0
    }

    /// Image-plane distance between thumb tip and index tip.
    pub fn pinch_distance(&self) -> f32 {
        let a = self.0[THUMB_TIP];
        let b = self.0[INDEX_TIP];
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }
}

/// One detection result: zero or one hand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Detection {
    pub hand: Option<HandLandmarks>,
}

impl Detection {
    pub fn none() -> Self {
        Self { hand: None }
    }

    pub fn with_hand(hand: HandLandmarks) -> Self {
        Self { hand: Some(hand) }
    }
}

/// What a wide pinch means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchSemantic {
    /// Spreading the fingers drives the signal toward 1.
    #[default]
    Opens,
    /// Pinching the fingers together drives the signal toward 1.
    Closes,
}

/// Mapping and filter constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Distance mapped to the "closed" end of the range.
    pub input_min: f32,
    /// Distance mapped to the "open" end of the range.
    pub input_max: f32,
    pub semantic: PinchSemantic,
    /// Exponential smoothing factor applied per detection.
    pub smoothing: f32,
    /// Per-detection multiplier on the target while no hand is seen.
    pub decay: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            input_min: 0.03,
            input_max: 0.2,
            semantic: PinchSemantic::Opens,
            smoothing: 0.08,
            decay: 0.95,
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.input_max > self.input_min) {
            return Err(ConfigError::invalid(
                "gesture.input_max",
                "must be greater than input_min",
            ));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::invalid(
                "gesture.smoothing",
                "must be in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.decay) {
            return Err(ConfigError::invalid("gesture.decay", "must be in [0, 1]"));
        }
        Ok(())
    }

    /// Map a fingertip distance to a clamped value in `[0, 1]`.
    pub fn map_distance(&self, distance: f32) -> f32 {
        let t = (distance - self.input_min) / (self.input_max - self.input_min);
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self.semantic {
            PinchSemantic::Opens => t,
            PinchSemantic::Closes => 1.0 - t,
        }
    }
}

/// Smoothed gesture state: the target from the last detection and the
/// published progress.
#[derive(Debug, Clone)]
pub struct GestureSignal {
    config: GestureConfig,
    target: f32,
    progress: f32,
    hand_present: bool,
}

impl GestureSignal {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            target: 0.0,
            progress: 0.0,
            hand_present: false,
        }
    }

    /// Fold one detection result into the signal.
    pub fn on_detection(&mut self, detection: &Detection) {
        match &detection.hand {
            Some(hand) => {
                self.target = self.config.map_distance(hand.pinch_distance());
                self.hand_present = true;
            }
            None => {
                self.target *= self.config.decay;
                self.hand_present = false;
            }
        }
        self.progress += (self.target - self.progress) * self.config.smoothing;
        self.progress = self.progress.clamp(0.0, 1.0);
    }

    /// Smoothed scalar in `[0, 1]`.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Unsmoothed value derived from the latest detection.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the latest detection contained a hand.
    #[inline]
    pub fn hand_present(&self) -> bool {
        self.hand_present
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Force the target, e.g. to resume from a known state.
    pub fn set_target(&mut self, target: f32) {
        self.target = target.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_with_pinch(distance: f32) -> HandLandmarks {
        let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        points[THUMB_TIP] = Landmark::new(0.4, 0.5, 0.0);
        points[INDEX_TIP] = Landmark::new(0.4 + distance, 0.5, 0.0);
        HandLandmarks::new(points)
    }

    #[test]
    fn test_pinch_distance_ignores_depth() {
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        points[THUMB_TIP] = Landmark::new(0.0, 0.0, 0.0);
        points[INDEX_TIP] = Landmark::new(0.3, 0.4, 0.9);
        assert!((HandLandmarks::new(points).pinch_distance() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_triples_rejects_wrong_count() {
        let err = HandLandmarks::from_triples(&[[0.0; 3]; 5]).unwrap_err();
        assert!(matches!(err, TrackingError::Landmarks(5)));
        assert!(HandLandmarks::from_triples(&[[0.0; 3]; 21]).is_ok());
    }

    #[test]
    fn test_map_distance_semantics() {
        let opens = GestureConfig::default();
        assert_eq!(opens.map_distance(0.0), 0.0);
        assert_eq!(opens.map_distance(0.5), 1.0);

        let closes = GestureConfig {
            semantic: PinchSemantic::Closes,
            ..GestureConfig::default()
        };
        assert_eq!(closes.map_distance(0.0), 1.0);
        assert_eq!(closes.map_distance(0.5), 0.0);
    }

    #[test]
    fn test_progress_converges_toward_target() {
        let mut signal = GestureSignal::new(GestureConfig::default());
        let det = Detection::with_hand(hand_with_pinch(0.3));
        for _ in 0..200 {
            signal.on_detection(&det);
        }
        assert_eq!(signal.target(), 1.0);
        assert!(signal.progress() > 0.99);
        assert!(signal.hand_present());
    }

    #[test]
    fn test_single_step_uses_smoothing() {
        let mut signal = GestureSignal::new(GestureConfig::default());
        signal.on_detection(&Detection::with_hand(hand_with_pinch(0.3)));
        assert!((signal.progress() - 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_no_hand_decays_target() {
        let mut signal = GestureSignal::new(GestureConfig::default());
        signal.set_target(1.0);
        signal.on_detection(&Detection::none());
        assert!((signal.target() - 0.95).abs() < 1e-6);
        assert!(!signal.hand_present());
    }

    #[test]
    fn test_config_validation() {
        assert!(GestureConfig::default().validate().is_ok());
        let bad = GestureConfig {
            smoothing: 0.0,
            ..GestureConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
