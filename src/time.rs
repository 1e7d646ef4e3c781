//! Frame clock for driving the simulation from wall time.
//!
//! Simulated time is the running sum of clamped frame deltas, so it stops
//! while paused and never jumps after a stall.
//!
//! ```ignore
//! let mut clock = Time::new();
//! loop {
//!     let (elapsed, delta) = clock.update();
//!     sim.update(delta, elapsed);
//! }
//! ```

use crate::constants::MAX_FRAME_DELTA;
use std::time::Instant;

/// Clamped frame timing with pause, fixed step and time scale.
#[derive(Debug, Clone)]
pub struct Time {
    last_frame: Instant,
    /// Simulated seconds since start or the last reset.
    elapsed_secs: f32,
    /// Last frame's simulated step.
    delta_secs: f32,
    frame_count: u64,
    paused: bool,
    /// Replaces the measured wall delta when set.
    fixed_delta: Option<f32>,
    time_scale: f32,
    /// Upper bound on a single step.
    max_delta: f32,
}

impl Time {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: MAX_FRAME_DELTA,
        }
    }

    /// Advance by one frame. Returns `(elapsed, delta)`.
    ///
    /// While paused the delta is zero and neither elapsed time nor the frame
    /// counter move.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, 0.0);
        }

        let step = self.fixed_delta.unwrap_or(raw) * self.time_scale;
        self.delta_secs = step.clamp(0.0, self.max_delta);
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        (self.elapsed_secs, self.delta_secs)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
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
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    #[inline]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume without counting the paused interval as a step.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Use a constant step instead of wall time. `None` restores wall time.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.filter(|d| d.is_finite() && *d >= 0.0);
    }

    /// Playback speed multiplier, clamped to be non-negative.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    pub fn set_max_delta(&mut self, max_delta: f32) {
        if max_delta.is_finite() && max_delta > 0.0 {
            self.max_delta = max_delta;
        }
    }

    /// Zero the clock. Pause state and step settings are kept.
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.elapsed_secs = 0.0;
        self.delta_secs = 0.0;
        self.frame_count = 0;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert!(!time.is_paused());
        assert_eq!(time.time_scale(), 1.0);
        assert_eq!(time.max_delta(), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_time_update() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = time.update();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_delta_is_capped() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(120));
        let (_, delta) = time.update();
        assert_eq!(delta, MAX_FRAME_DELTA);
    }

    #[test]
    fn test_time_pause() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(0.01));
        time.update();

        time.pause();
        let elapsed_before = time.elapsed();
        time.update();
        assert_eq!(time.elapsed(), elapsed_before);
        assert_eq!(time.delta(), 0.0);
        assert_eq!(time.frame(), 1);

        time.resume();
        time.update();
        assert!((time.elapsed() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_time_scale() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(0.01));
        time.set_time_scale(2.0);
        time.update();
        assert!((time.delta() - 0.02).abs() < 1e-6);

        time.set_time_scale(-1.0);
        assert_eq!(time.time_scale(), 0.0);
    }

    #[test]
    fn test_fixed_delta_and_reset() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(1.0 / 60.0));
        thread::sleep(Duration::from_millis(30));
        for _ in 0..3 {
            time.update();
        }
        assert!((time.elapsed() - 0.05).abs() < 1e-5);

        time.reset();
        assert_eq!(time.elapsed(), 0.0);
        assert_eq!(time.frame(), 0);
    }
}
