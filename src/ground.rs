//! Ground contact gate and ground-level calibration.

use serde::{Deserialize, Serialize};

/// Vertical threshold deciding whether the leader touches the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundContact {
    pub level: f64,
    pub margin: f64,
}

impl GroundContact {
    /// Create a gate at `level` with tolerance `margin` [m].
    pub fn new(level: f64, margin: f64) -> Self {
        Self { level, margin }
    }

    /// True when `y` is at or below `level + margin`.
    pub fn is_grounded(&self, y: f64) -> bool {
        y <= self.level + self.margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStatus {
    Sampling,
    /// Mean of the collected samples; `None` when nothing was sampled.
    Finished(Option<f64>),
}

/// Ground-level sampler that spans many ticks.
///
/// Every [`step`](GroundCalibration::step) records the leader height while
/// the elapsed time is below the duration and reports the mean on the first
/// step past it. Dropping an unfinished calibration has no side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundCalibration {
    duration: f64,
    elapsed: f64,
    sum: f64,
    count: usize,
}

impl GroundCalibration {
    /// Start a calibration that samples for `duration` seconds of steps.
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            sum: 0.0,
            count: 0,
        }
    }

    /// Record one sample over a step of `dt`; negative or non-finite steps count as zero.
    pub fn step(&mut self, sample_y: f64, dt: f64) -> CalibrationStatus {
        if self.elapsed < self.duration {
            self.sum += sample_y;
            self.count += 1;
            self.elapsed += if dt.is_finite() { dt.max(0.0) } else { 0.0 };
            return CalibrationStatus::Sampling;
        }

        CalibrationStatus::Finished(self.mean())
    }

    /// Mean of the samples so far.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn sample_count(&self) -> usize {
        self.count
    }
}
