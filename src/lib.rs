//! posnoise - multisine positional disturbance
//!
//! Deterministic sum-of-sinusoids noise, normalized by its estimated
//! standard deviation, applied as a bounded 3D offset to a tracked leader
//! pose for robustness testing of motion-tracking and control systems.

pub mod controller;
pub mod generator;
pub mod ground;
pub mod leader;
pub mod params;
pub mod registry;
pub mod wave_bank;

use thiserror::Error;

// Re-export main types
pub use controller::{Disturbance, DisturbanceHooks, DisturbanceOffsetController, NoHooks};
pub use generator::SignalGenerator;
pub use ground::{CalibrationStatus, GroundCalibration, GroundContact};
pub use leader::{LeaderSource, Pose};
pub use params::{DisturbanceParams, GeneratorParams};
pub use registry::{DisturbanceId, DisturbanceRegistry};
pub use wave_bank::{FrequencySpacing, Interval, WaveBank, WaveRanges, WAVE_CAPACITY};

#[derive(Debug, Error)]
pub enum DisturbanceError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown {0}")]
    UnknownDisturbance(DisturbanceId),
}
