//! Positional noise disturbance
//!
//! Three independent multisine generators (one per axis) driven by an
//! accumulated noise time. Each active tick turns their outputs into an
//! offset that is added to the leader position.

use std::time::{SystemTime, UNIX_EPOCH};

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::generator::SignalGenerator;
use crate::ground::{CalibrationStatus, GroundCalibration, GroundContact};
use crate::leader::{LeaderSource, Pose};
use crate::params::DisturbanceParams;
use crate::DisturbanceError;

/// Common surface of disturbances managed by a registry.
pub trait Disturbance {
    fn is_active(&self) -> bool;
    fn is_initialized(&self) -> bool;
    fn intensity(&self) -> f64;
    /// Stored value is always clamped to [0, 1].
    fn set_intensity(&mut self, intensity: f64);
    fn initialize(&mut self, force: bool);
    fn activate(&mut self);
    fn deactivate(&mut self);
    /// One fixed simulation step of length `dt`.
    fn tick(&mut self, dt: f64);
    fn offset(&self) -> Vector3<f64>;
}

/// Extension points around the lifecycle transitions. All default to no-ops.
pub trait DisturbanceHooks {
    fn on_initialize(&mut self) {}
    fn on_activate(&mut self) {}
    fn on_deactivate(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl DisturbanceHooks for NoHooks {}

/// Multisine offset applied to a leader pose.
pub struct DisturbanceOffsetController<L> {
    params: DisturbanceParams,
    leader: Option<L>,
    hooks: Box<dyn DisturbanceHooks>,
    generators: Option<[SignalGenerator; 3]>,
    intensity: f64,
    ground: GroundContact,
    calibration: Option<GroundCalibration>,
    seed: u64,
    elapsed: f64,
    time_offset: f64,
    offset: Vector3<f64>,
    output: Pose,
    initialized: bool,
    active: bool,
}

impl<L: LeaderSource> DisturbanceOffsetController<L> {
    /// Create an uninitialized, inactive controller; fails if `params` do not validate.
    pub fn new(params: DisturbanceParams, leader: Option<L>) -> Result<Self, DisturbanceError> {
        params.validate()?;

        let output = leader.as_ref().map(|l| l.pose()).unwrap_or_default();

        Ok(Self {
            intensity: clamp_unit(params.intensity),
            ground: GroundContact::new(params.ground_level, params.ground_margin),
            params,
            leader,
            hooks: Box::new(NoHooks),
            generators: None,
            calibration: None,
            seed: 0,
            elapsed: 0.0,
            time_offset: 0.0,
            offset: Vector3::zeros(),
            output,
            initialized: false,
            active: false,
        })
    }

    /// Replace the lifecycle hooks.
    pub fn with_hooks(mut self, hooks: Box<dyn DisturbanceHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Parameters the controller was built with.
    pub fn params(&self) -> &DisturbanceParams {
        &self.params
    }

    /// Current leader, if one is assigned.
    pub fn leader(&self) -> Option<&L> {
        self.leader.as_ref()
    }

    /// Assign or replace the leader.
    pub fn set_leader(&mut self, leader: L) {
        self.leader = Some(leader);
    }

    /// Detach the leader; ticks become no-ops until a new one is set.
    pub fn clear_leader(&mut self) -> Option<L> {
        self.leader.take()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Store `intensity` clamped to [0, 1]; NaN becomes 0.
    pub fn set_intensity(&mut self, intensity: f64) {
        self.intensity = clamp_unit(intensity);
    }

    /// Top-level seed used by the most recent initialization.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Accumulated noise time [s].
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Fixed offset added to noise time [s].
    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    /// x, y, z generators; `None` before the first initialization.
    pub fn generators(&self) -> Option<&[SignalGenerator; 3]> {
        self.generators.as_ref()
    }

    /// Last computed offset. Read-only: it only changes through ticks and lifecycle calls.
    pub fn offset(&self) -> Vector3<f64> {
        self.offset
    }

    /// Leader rotation with the disturbed position.
    pub fn output_pose(&self) -> Pose {
        self.output
    }

    /// Current ground gate.
    pub fn ground(&self) -> GroundContact {
        self.ground
    }

    /// Set the ground margin [m]; negative values are clamped to zero.
    pub fn set_ground_margin(&mut self, margin: f64) {
        self.ground.margin = margin.max(0.0);
    }

    /// Ground gate on the leader's current height; false without a leader.
    pub fn is_grounded(&self) -> bool {
        self.leader
            .as_ref()
            .map(|leader| self.ground.is_grounded(leader.position().y))
            .unwrap_or(false)
    }

    /// True while a ground-level calibration is sampling.
    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_some()
    }

    /// Start sampling the leader height for `duration` seconds of ticks,
    /// replacing any calibration in progress.
    pub fn recalibrate_ground_level(&mut self, duration: f64) {
        info!(duration, "starting ground level calibration");
        self.calibration = Some(GroundCalibration::new(duration));
    }

    /// Abandon a calibration in progress, keeping the current ground level.
    pub fn cancel_calibration(&mut self) {
        if self.calibration.take().is_some() {
            debug!("ground level calibration abandoned");
        }
    }

    /// Draw the three generator banks from the top-level seed. No-op when
    /// already initialized unless `force` is set.
    pub fn initialize(&mut self, force: bool) {
        if self.initialized && !force {
            return;
        }

        let seed = self.params.seed.unwrap_or_else(clock_seed);
        let mut source = ChaCha8Rng::seed_from_u64(seed);
        let sub_seeds: [u64; 3] = [source.gen(), source.gen(), source.gen()];

        self.time_offset = if self.params.randomize_time_offset && self.params.max_time_offset > 0.0
        {
            source.gen_range(0.0..self.params.max_time_offset)
        } else {
            0.0
        };

        self.seed = seed;
        self.elapsed = 0.0;
        let generator = self.params.generator;
        self.generators = Some(sub_seeds.map(|s| SignalGenerator::from_params(&generator, s)));

        if self.params.pause_on_ground {
            self.recalibrate_ground_level(self.params.calibration_duration);
        }

        self.hooks.on_initialize();
        self.offset = self.compute_offset();
        self.initialized = true;

        info!(
            seed,
            x_seed = sub_seeds[0],
            y_seed = sub_seeds[1],
            z_seed = sub_seeds[2],
            time_offset = self.time_offset,
            "noise waves initialized"
        );
    }

    /// Initializes on first use, then enters the active state.
    pub fn activate(&mut self) {
        self.initialize(false);
        self.hooks.on_activate();
        self.active = true;
        debug!("disturbance activated");
    }

    /// Leaves the active state and snaps the output back onto the leader.
    /// While inactive the output keeps that position and only follows the
    /// leader rotation.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.hooks.on_deactivate();

        self.offset = Vector3::zeros();
        if let Some(leader) = self.leader.as_ref() {
            self.output = leader.pose();
        }
        debug!("disturbance deactivated");
    }

    /// Advance one fixed step.
    ///
    /// Negative or non-finite `dt` counts as a zero step, so noise time never
    /// runs backwards. Without a leader nothing happens. A pending calibration
    /// samples the leader on every tick. While active the offset is recomputed
    /// first and only then is noise time advanced, unless the ground gate
    /// holds it.
    pub fn tick(&mut self, dt: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let pose = match self.leader.as_ref() {
            Some(leader) => leader.pose(),
            None => return,
        };

        self.advance_calibration(pose.position.y, dt);
        self.output.rotation = pose.rotation;

        if !self.active {
            return;
        }

        self.offset = self.compute_offset();
        self.output.position = pose.position + self.offset;

        if self.params.pause_on_ground && self.ground.is_grounded(pose.position.y) {
            return;
        }

        self.elapsed += dt;
    }

    fn advance_calibration(&mut self, y: f64, dt: f64) {
        let Some(calibration) = self.calibration.as_mut() else {
            return;
        };

        if let CalibrationStatus::Finished(level) = calibration.step(y, dt) {
            let samples = calibration.sample_count();
            self.calibration = None;
            if let Some(level) = level {
                self.ground.level = level;
            }
            info!(
                samples,
                ground_level = self.ground.level,
                ground_margin = self.ground.margin,
                "ground level calibration finished"
            );
        }
    }

    fn compute_offset(&self) -> Vector3<f64> {
        let Some([x, y, z]) = self.generators.as_ref() else {
            return Vector3::zeros();
        };

        let t = self.elapsed + self.time_offset;
        let noise = Vector3::new(x.evaluate(t, true), y.evaluate(t, true), z.evaluate(t, true));
        let scale = Vector3::from(self.params.axis_scale);

        noise.component_mul(&scale) * self.params.max_distance * self.intensity
    }
}

impl<L: LeaderSource> Disturbance for DisturbanceOffsetController<L> {
    fn is_active(&self) -> bool {
        self.active
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn intensity(&self) -> f64 {
        self.intensity
    }

    fn set_intensity(&mut self, intensity: f64) {
        DisturbanceOffsetController::set_intensity(self, intensity);
    }

    fn initialize(&mut self, force: bool) {
        DisturbanceOffsetController::initialize(self, force);
    }

    fn activate(&mut self) {
        DisturbanceOffsetController::activate(self);
    }

    fn deactivate(&mut self) {
        DisturbanceOffsetController::deactivate(self);
    }

    fn tick(&mut self, dt: f64) {
        DisturbanceOffsetController::tick(self, dt);
    }

    fn offset(&self) -> Vector3<f64> {
        self.offset
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
