//! Frame timing.
//!
//! [`FrameClock`] is ticked once per redraw and provides the delta used to
//! advance the orbital time accumulator, plus a periodically refreshed FPS
//! figure for the window title.

use std::time::{Duration, Instant};

/// Longest delta a single frame may report. Stalls (window drags, debugger
/// breaks) are clamped so orbits don't jump.
const MAX_DELTA: f32 = 0.1;

/// Per-frame timing.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    fps_refreshed: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fps_refreshed: false,
        }
    }

    /// Advance one frame. Returns the clamped delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta_secs = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_DELTA);
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        self.fps_refreshed = fps_elapsed >= self.fps_update_interval;
        if self.fps_refreshed {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether the last tick recomputed the FPS figure.
    #[inline]
    pub fn fps_refreshed(&self) -> bool {
        self.fps_refreshed
    }

    /// Wall time since the clock was created.
    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
