use std::fs;
use std::path::Path;

use anyhow::Context;
use posnoise::DisturbanceParams;
use serde::{Deserialize, Serialize};

use crate::gait::GaitParams;

/// Runtime configuration for a disturbance trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed simulation step [s]
    pub dt: f64,
    /// Final simulation time [s]
    pub t_final: f64,
    /// Time the disturbance is switched on [s]
    pub activate_at: f64,
    /// Time the disturbance is switched off [s]; `None` keeps it on
    pub deactivate_at: Option<f64>,
    pub gait: GaitParams,
    pub disturbance: DisturbanceParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            t_final: 30.0,
            activate_at: 2.0,
            deactivate_at: Some(25.0),
            gait: GaitParams::default(),
            disturbance: DisturbanceParams {
                seed: Some(2023),
                ..DisturbanceParams::default()
            },
        }
    }
}

impl SimConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let cfg: SimConfig = toml::from_str(&raw)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.dt.is_finite() && self.dt > 0.0, "dt must be > 0");
        anyhow::ensure!(self.t_final > self.dt, "t_final must be > dt");
        anyhow::ensure!(self.activate_at >= 0.0, "activate_at must be >= 0");
        if let Some(off) = self.deactivate_at {
            anyhow::ensure!(
                off > self.activate_at,
                "deactivate_at must be later than activate_at"
            );
        }
        self.gait.validate()?;
        self.disturbance.validate()?;
        Ok(())
    }

    pub fn steps(&self) -> usize {
        (self.t_final / self.dt).ceil() as usize
    }

    /// Whether the disturbance should be on at time `t_s`.
    pub fn active_at(&self, t_s: f64) -> bool {
        t_s >= self.activate_at && self.deactivate_at.map_or(true, |off| t_s < off)
    }
}
