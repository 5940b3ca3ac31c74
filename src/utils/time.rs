//! Frame time sampling and fixed-step budgeting.
//!
//! [`Time`] turns wall-clock samples into a clamped variable delta and keeps a
//! fixed-step accumulator for physics-rate callbacks. The accumulator is
//! clamped to `fixed_step * max_steps_per_frame` after each sample, so a long
//! stall never turns into an unbounded catch-up loop.

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use crate::settings::TimeSettings;

/// Tolerance used when comparing the accumulator against one fixed step.
const STEP_EPSILON: f64 = 1e-9;

/// Frame clock with a fixed-step accumulator.
#[derive(Debug, Clone)]
pub struct Time {
    last_sample: Instant,

    time_scale: f64,
    fixed_step: f64,
    max_delta: f64,
    max_steps_per_frame: u32,
    accumulator: f64,

    /// Clamped delta of the last frame, before time scaling
    unscaled_delta: f64,
    /// Clamped and scaled delta of the last frame
    delta: f64,
    /// Total scaled time since creation
    elapsed: f64,
    /// Total simulated fixed-step time since creation
    fixed_elapsed: f64,
    /// Total number of samples
    pub frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new(TimeSettings::default())
    }
}

impl Time {
    /// Creates a clock starting from now.
    #[must_use]
    pub fn new(settings: TimeSettings) -> Self {
        Self {
            last_sample: Instant::now(),
            time_scale: settings.time_scale,
            fixed_step: settings.fixed_step,
            max_delta: settings.max_delta,
            max_steps_per_frame: settings.max_steps_per_frame,
            accumulator: 0.0,
            unscaled_delta: 0.0,
            delta: 0.0,
            elapsed: 0.0,
            fixed_elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Samples the wall clock and advances by the elapsed time.
    ///
    /// Returns the scaled delta.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let raw = now.saturating_duration_since(self.last_sample).as_secs_f64();
        self.last_sample = now;
        self.advance(raw)
    }

    /// Advances by an explicit raw delta in seconds.
    ///
    /// The raw value is clamped to `[0, max_delta]` (NaN counts as zero),
    /// scaled, and added to the fixed-step budget, which is then clamped to
    /// `fixed_step * max_steps_per_frame`. Returns the scaled delta.
    pub fn advance(&mut self, raw_delta: f64) -> f64 {
        let clamped = if raw_delta.is_nan() {
            0.0
        } else {
            raw_delta.clamp(0.0, self.max_delta)
        };

        self.unscaled_delta = clamped;
        self.delta = clamped * self.time_scale;
        self.elapsed += self.delta;
        self.frame_count += 1;

        self.accumulator += self.delta;
        let budget = self.fixed_step * f64::from(self.max_steps_per_frame);
        if self.accumulator > budget {
            log::trace!(
                "Fixed-step backlog clamped from {:.4}s to {:.4}s",
                self.accumulator,
                budget
            );
            self.accumulator = budget;
        }

        self.delta
    }

    /// Consumes one fixed step from the budget if enough time accumulated.
    ///
    /// Callers loop on this to run zero or more physics ticks per frame.
    pub fn try_consume_fixed_step(&mut self) -> bool {
        if self.accumulator + STEP_EPSILON < self.fixed_step {
            return false;
        }
        self.accumulator = (self.accumulator - self.fixed_step).max(0.0);
        self.fixed_elapsed += self.fixed_step;
        true
    }

    /// Resets the sampling baseline, e.g. after resuming from suspension.
    pub fn reset_baseline(&mut self) {
        self.last_sample = Instant::now();
    }

    /// Sets the time scale; negative values are treated as zero.
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    #[inline]
    #[must_use]
    pub fn fixed_step(&self) -> f64 {
        self.fixed_step
    }

    #[inline]
    #[must_use]
    pub fn max_steps_per_frame(&self) -> u32 {
        self.max_steps_per_frame
    }

    /// Remaining fixed-step budget, in seconds.
    #[inline]
    #[must_use]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Fraction of a fixed step left in the budget, for render interpolation.
    #[inline]
    #[must_use]
    pub fn fixed_alpha(&self) -> f64 {
        (self.accumulator / self.fixed_step).clamp(0.0, 1.0)
    }

    /// Scaled delta of the last frame, in seconds.
    #[inline]
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Clamped delta of the last frame before scaling, in seconds.
    #[inline]
    #[must_use]
    pub fn unscaled_delta(&self) -> f64 {
        self.unscaled_delta
    }

    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Simulated time advanced by consumed fixed steps.
    #[inline]
    #[must_use]
    pub fn fixed_elapsed(&self) -> f64 {
        self.fixed_elapsed
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TimeSettings {
        TimeSettings {
            fixed_step: 1.0 / 60.0,
            max_steps_per_frame: 8,
            max_delta: 0.25,
            time_scale: 1.0,
        }
    }

    #[test]
    fn test_negative_delta_clamps_to_zero() {
        let mut time = Time::new(settings());
        assert_eq!(time.advance(-1.0), 0.0);
        assert_eq!(time.accumulator(), 0.0);
    }

    #[test]
    fn test_nan_delta_counts_as_zero() {
        let mut time = Time::new(settings());
        assert_eq!(time.advance(f64::NAN), 0.0);
        assert!(!time.try_consume_fixed_step());
    }

    #[test]
    fn test_time_scale_applies_after_clamp() {
        let mut s = settings();
        s.time_scale = 0.5;
        let mut time = Time::new(s);
        let scaled = time.advance(1.0);
        assert!((scaled - 0.125).abs() < 1e-12);
        assert!((time.unscaled_delta() - 0.25).abs() < 1e-12);
    }
}
