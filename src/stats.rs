//! Loop timing and frame-rate accounting.

use std::time::Duration;

/// Floor for the elapsed-time denominator. An iteration that completes in
/// under a millisecond reports 1000 fps instead of dividing by zero.
pub const MIN_ELAPSED_MS: f64 = 1.0;

/// One iteration's frame-rate measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsSample {
    /// 1-based iteration index
    pub frame: u64,
    /// Instantaneous frame rate: 1000 / elapsed milliseconds
    pub fps: f64,
    /// Cumulative mean of all instantaneous samples so far
    pub avg_fps: f64,
}

/// Running frame-rate accumulator for the acquisition loop.
///
/// Explicit state passed through the loop; nothing global. Reset only by
/// constructing a new value.
#[derive(Debug, Default)]
pub struct FpsStats {
    frames: u64,
    sum_fps: f64,
}

impl FpsStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of iterations recorded so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Record one iteration's wall-clock duration and return its sample.
    pub fn record(&mut self, elapsed: Duration) -> FpsSample {
        let elapsed_ms = (elapsed.as_secs_f64() * 1000.0).max(MIN_ELAPSED_MS);
        let fps = 1000.0 / elapsed_ms;

        self.frames += 1;
        self.sum_fps += fps;

        FpsSample {
            frame: self.frames,
            fps,
            avg_fps: self.sum_fps / self.frames as f64,
        }
    }
}
