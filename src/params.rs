//! Disturbance parameters
//!
//! Plain configuration for the generators and the offset controller,
//! validated once when a controller is built.

use serde::{Deserialize, Serialize};

use crate::wave_bank::{FrequencySpacing, Interval, WaveRanges};
use crate::DisturbanceError;

/// Shape of each per-axis multisine generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Number of sinusoids per axis (truncated to the bank capacity)
    pub wave_count: usize,
    pub ranges: WaveRanges,
    pub spacing: FrequencySpacing,
    /// Multiplier applied after normalization
    pub gain: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            wave_count: 100,
            ranges: WaveRanges::default(),
            spacing: FrequencySpacing::Even,
            gain: 1.0,
        }
    }
}

/// Configuration of a positional noise disturbance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisturbanceParams {
    /// Top-level seed; `None` draws a fresh one from the clock on every initialization
    pub seed: Option<u64>,
    pub generator: GeneratorParams,
    /// Per-axis scale (x, y, z); zero disables an axis
    pub axis_scale: [f64; 3],
    /// Offset magnitude at full scale and intensity [m]
    pub max_distance: f64,
    /// Global multiplier in [0, 1]
    pub intensity: f64,
    /// Freeze noise time while the leader is grounded
    pub pause_on_ground: bool,
    /// Initial ground level [m]
    pub ground_level: f64,
    /// Height above the ground level still counted as grounded [m]
    pub ground_margin: f64,
    /// Ground calibration window [s]
    pub calibration_duration: f64,
    /// Draw a random phase shift in time at initialization
    pub randomize_time_offset: bool,
    /// Upper bound for the random time offset [s]
    pub max_time_offset: f64,
}

impl Default for DisturbanceParams {
    fn default() -> Self {
        Self {
            seed: None,
            generator: GeneratorParams::default(),
            axis_scale: [1.0, 1.0, 1.0],
            max_distance: 1.0,
            intensity: 1.0,
            pause_on_ground: true,
            ground_level: 0.05,
            ground_margin: 0.01,
            calibration_duration: 1.0,
            randomize_time_offset: false,
            max_time_offset: 1000.0,
        }
    }
}

impl DisturbanceParams {
    pub fn validate(&self) -> Result<(), DisturbanceError> {
        let ranges = &self.generator.ranges;
        check_interval("frequency range", &ranges.frequency)?;
        check_interval("amplitude range", &ranges.amplitude)?;
        check_interval("phase range", &ranges.phase)?;

        if !self.generator.gain.is_finite() {
            return Err(invalid("gain must be finite"));
        }

        if self
            .axis_scale
            .iter()
            .any(|s| !s.is_finite() || *s < 0.0)
        {
            return Err(invalid("axis_scale entries must be finite and >= 0"));
        }

        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(invalid("max_distance must be finite and >= 0"));
        }

        if !self.intensity.is_finite() {
            return Err(invalid("intensity must be finite"));
        }

        if !self.ground_level.is_finite() {
            return Err(invalid("ground_level must be finite"));
        }

        if !self.ground_margin.is_finite() || self.ground_margin < 0.0 {
            return Err(invalid("ground_margin must be finite and >= 0"));
        }

        if !self.calibration_duration.is_finite() || self.calibration_duration < 0.0 {
            return Err(invalid("calibration_duration must be finite and >= 0"));
        }

        if !self.max_time_offset.is_finite() || self.max_time_offset < 0.0 {
            return Err(invalid("max_time_offset must be finite and >= 0"));
        }

        Ok(())
    }
}

fn check_interval(name: &str, interval: &Interval) -> Result<(), DisturbanceError> {
    if interval.is_valid() {
        Ok(())
    } else {
        Err(invalid(&format!(
            "{name} must be finite with min <= max and a finite width, got [{}, {}]",
            interval.min, interval.max
        )))
    }
}

fn invalid(msg: &str) -> DisturbanceError {
    DisturbanceError::InvalidConfig(msg.to_string())
}
