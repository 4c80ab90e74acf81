//! Time utilities for the frame loop

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Upper bound on a single frame delta (seconds). A stalled frame is
/// clamped so avatars do not jump across the map.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Measures elapsed time between consecutive frames
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
        }
    }

    /// Seconds since the previous call (or since construction)
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        self.delta_at(now)
    }

    fn delta_at(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        self.frames += 1;
        elapsed.min(MAX_FRAME_DELTA)
    }

    /// Number of frames measured so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
