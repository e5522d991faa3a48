use std::f64::consts::{PI, TAU};

use nalgebra::{UnitQuaternion, Vector3};
use posnoise::{LeaderSource, Pose};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Synthetic tracked foot used as the disturbance leader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitParams {
    /// Strides per second [Hz]
    pub stride_frequency: f64,
    /// Peak foot clearance during swing [m]
    pub lift_height: f64,
    /// Forward speed [m/s]
    pub walking_speed: f64,
    /// Height of the tracker while the foot is planted [m]
    pub floor_height: f64,
    /// Fraction of each stride spent on the ground
    pub stance_fraction: f64,
    /// Tracker jitter, per axis [m]
    pub sensor_noise_std: f64,
    /// Peak heading sway [rad]
    pub yaw_sway: f64,
    pub seed: u64,
}

impl Default for GaitParams {
    fn default() -> Self {
        Self {
            stride_frequency: 1.0,
            lift_height: 0.12,
            walking_speed: 1.2,
            floor_height: 0.05,
            stance_fraction: 0.6,
            sensor_noise_std: 0.002,
            yaw_sway: 0.05,
            seed: 7,
        }
    }
}

impl GaitParams {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.stride_frequency > 0.0, "stride_frequency must be > 0");
        anyhow::ensure!(self.lift_height >= 0.0, "lift_height must be >= 0");
        anyhow::ensure!(
            self.stance_fraction >= 0.0 && self.stance_fraction < 1.0,
            "stance_fraction must be in [0, 1)"
        );
        anyhow::ensure!(self.sensor_noise_std >= 0.0, "sensor_noise_std must be >= 0");
        Ok(())
    }
}

/// Foot pose following a stance/swing cycle with tracker jitter.
#[derive(Debug, Clone)]
pub struct WalkingFoot {
    params: GaitParams,
    pose: Pose,
    rng: ChaCha8Rng,
}

impl WalkingFoot {
    pub fn new(params: GaitParams) -> Self {
        let mut foot = Self {
            params,
            pose: Pose::identity(),
            rng: ChaCha8Rng::seed_from_u64(params.seed ^ 0xF007_5EED_u64),
        };
        foot.pose.position = foot.clean_position(0.0);
        foot
    }

    /// Noise-free foot clearance above the floor at time `t_s`.
    pub fn clearance(&self, t_s: f64) -> f64 {
        let phase = (t_s * self.params.stride_frequency).fract();
        let stance = self.params.stance_fraction;
        if phase < stance {
            return 0.0;
        }
        let swing = (phase - stance) / (1.0 - stance);
        self.params.lift_height * (PI * swing).sin()
    }

    fn clean_position(&self, t_s: f64) -> Vector3<f64> {
        Vector3::new(
            self.params.walking_speed * t_s,
            self.params.floor_height + self.clearance(t_s),
            0.1,
        )
    }

    /// Move the foot to time `t_s`.
    pub fn advance(&mut self, t_s: f64) {
        let jitter = Vector3::new(
            self.gaussian(self.params.sensor_noise_std),
            self.gaussian(self.params.sensor_noise_std),
            self.gaussian(self.params.sensor_noise_std),
        );
        let yaw = self.params.yaw_sway * (TAU * self.params.stride_frequency * t_s).sin();

        self.pose.position = self.clean_position(t_s) + jitter;
        self.pose.rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, yaw);
    }

    fn gaussian(&mut self, sigma: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        sigma * z
    }
}

impl LeaderSource for WalkingFoot {
    fn pose(&self) -> Pose {
        self.pose
    }
}
