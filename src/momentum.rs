//! Momentum state carried across inference cycles
//!
//! The two bounded counters give the classifier memory: excitement builds
//! under sustained wireless activity and drains during quiet stretches,
//! learning progress accumulates as the device dwells in study-like states.
//! A third value tracks how long the current behavioral state has been held.

use serde::Serialize;

/// Upper bound for both momentum counters.
pub const MOMENTUM_CEILING: u8 = 100;

/// Cycle-to-cycle memory owned by the inference engine.
///
/// Single-owner by design: only the engine mutates it, so it needs no
/// synchronization. Counters are clamped to `[0, 100]` on every operation.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Momentum {
    excitement: u8,
    learning_progress: u8,
    time_in_state_ms: u32,
    #[serde(skip)]
    decay_elapsed_ms: u32,
}

impl Momentum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current excitement level, 0-100.
    pub fn excitement(&self) -> u8 {
        self.excitement
    }

    /// Current learning progress, 0-100.
    pub fn learning_progress(&self) -> u8 {
        self.learning_progress
    }

    /// Elapsed time in the current behavioral state (ms).
    pub fn time_in_state_ms(&self) -> u32 {
        self.time_in_state_ms
    }

    /// Raise excitement by `step`, clamped at the ceiling.
    pub fn raise_excitement(&mut self, step: u8) {
        self.excitement = clamp_add(self.excitement, step);
    }

    /// Lower excitement by `step`, clamped at zero.
    pub fn ease_excitement(&mut self, step: u8) {
        self.excitement = self.excitement.saturating_sub(step);
    }

    /// Raise learning progress by `step`, clamped at the ceiling.
    pub fn raise_learning(&mut self, step: u8) {
        self.learning_progress = clamp_add(self.learning_progress, step);
    }

    /// Lower learning progress by `step`, but only while above `floor`.
    ///
    /// Sleep eases learning back without erasing it; below the floor the
    /// counter is left alone.
    pub fn ease_learning(&mut self, step: u8, floor: u8) {
        if self.learning_progress > floor {
            self.learning_progress = self.learning_progress.saturating_sub(step);
        }
    }

    /// Advance the dwell clock by one cycle period.
    pub fn advance_dwell(&mut self, period_ms: u32) {
        self.time_in_state_ms = self.time_in_state_ms.saturating_add(period_ms);
    }

    /// Reset the dwell clock on a state change.
    pub fn reset_dwell(&mut self) {
        self.time_in_state_ms = 0;
    }

    /// Restart the decay clock after a cycle that reinforced excitement.
    pub fn reset_decay_clock(&mut self) {
        self.decay_elapsed_ms = 0;
    }

    /// Account one quiet cycle toward excitement decay.
    ///
    /// Accumulates `period_ms` of elapsed time and applies one decay step per
    /// full `interval_ms` covered, so cadence holds regardless of how the
    /// cycle period divides the interval.
    pub fn accrue_decay(&mut self, period_ms: u32, interval_ms: u32, step: u8) {
        if interval_ms == 0 {
            return;
        }
        self.decay_elapsed_ms = self.decay_elapsed_ms.saturating_add(period_ms);
        while self.decay_elapsed_ms >= interval_ms {
            self.decay_elapsed_ms -= interval_ms;
            self.ease_excitement(step);
        }
    }
}

fn clamp_add(value: u8, step: u8) -> u8 {
    value.saturating_add(step).min(MOMENTUM_CEILING)
}
