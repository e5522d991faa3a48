pub mod config;
pub mod gait;
pub mod output;
pub mod telemetry;

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use chrono::Utc;
use posnoise::{DisturbanceOffsetController, LeaderSource};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::gait::WalkingFoot;
use crate::output::{offset_metrics, write_csv, write_summary, OutputFiles, Summary, TraceRecord};

/// Result of driving the disturbance over the configured horizon.
#[derive(Debug, Clone)]
pub struct Trace {
    pub seed: u64,
    pub records: Vec<TraceRecord>,
    pub ground_level_m: f64,
}

/// Play the walking foot through a disturbance at a fixed step, without touching disk.
pub fn simulate(cfg: &SimConfig) -> anyhow::Result<Trace> {
    cfg.validate()?;

    let foot = Rc::new(RefCell::new(WalkingFoot::new(cfg.gait)));
    let mut disturbance =
        DisturbanceOffsetController::new(cfg.disturbance.clone(), Some(Rc::clone(&foot)))?;
    disturbance.initialize(false);

    let mut records = Vec::with_capacity(cfg.steps());

    for step_idx in 0..cfg.steps() {
        let t_s = step_idx as f64 * cfg.dt;
        foot.borrow_mut().advance(t_s);

        let want_active = cfg.active_at(t_s);
        if want_active && !disturbance.is_active() {
            info!(t_s, "activating disturbance");
            disturbance.activate();
        } else if !want_active && disturbance.is_active() {
            info!(t_s, "deactivating disturbance");
            disturbance.deactivate();
        }

        let grounded = disturbance.is_grounded();
        disturbance.tick(cfg.dt);

        let leader = foot.borrow().position();
        let offset = disturbance.offset();
        let output = disturbance.output_pose().position;

        records.push(TraceRecord {
            time_s: t_s,
            active: disturbance.is_active(),
            grounded,
            noise_time_s: disturbance.elapsed(),
            leader_x_m: leader.x,
            leader_y_m: leader.y,
            leader_z_m: leader.z,
            offset_x_m: offset.x,
            offset_y_m: offset.y,
            offset_z_m: offset.z,
            output_x_m: output.x,
            output_y_m: output.y,
            output_z_m: output.z,
            ground_level_m: disturbance.ground().level,
        });
    }

    debug!(samples = records.len(), "trace complete");

    Ok(Trace {
        seed: disturbance.seed(),
        records,
        ground_level_m: disturbance.ground().level,
    })
}

/// Directory name, under the workspace root, that runs land in by default.
pub const DEFAULT_OUTPUT_DIR: &str = "output-posnoise-sim";

/// Simulate and write `trace.csv` and `summary.json` into a fresh run
/// directory under `output_base`. Relative bases are taken from the
/// workspace root.
pub fn run_simulation(cfg: &SimConfig, output_base: &Path) -> anyhow::Result<Summary> {
    let trace = simulate(cfg)?;

    let run_dir = create_run_dir(output_base)?;
    let files = OutputFiles::in_dir(&run_dir);

    let records = &trace.records;
    let summary = Summary {
        config: cfg.clone(),
        seed: trace.seed,
        samples: records.len(),
        active_samples: records.iter().filter(|r| r.active).count(),
        frozen_samples: records.iter().filter(|r| r.active && r.grounded).count(),
        final_noise_time_s: records.last().map_or(0.0, |r| r.noise_time_s),
        calibrated_ground_level_m: trace.ground_level_m,
        offsets: offset_metrics(records),
        outputs: files.clone(),
    };

    write_csv(&files.csv_path, records)?;
    write_summary(&files.summary_path, &summary)?;

    info!(dir = %run_dir.display(), "run written");
    Ok(summary)
}

/// `output-posnoise-sim` at the workspace root.
pub fn default_output_base_dir() -> PathBuf {
    workspace_root().join(DEFAULT_OUTPUT_DIR)
}

fn workspace_root() -> PathBuf {
    // This crate lives two levels below the workspace root.
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map_or_else(|| manifest_dir.to_path_buf(), Path::to_path_buf)
}

/// Creates `<base>/run-<UTC stamp>`, suffixed `-NN` if that name is taken.
fn create_run_dir(base: &Path) -> anyhow::Result<PathBuf> {
    let base = if base.is_absolute() {
        base.to_path_buf()
    } else {
        workspace_root().join(base)
    };

    let stamp = Utc::now().format("run-%Y%m%dT%H%M%SZ").to_string();
    let run_dir = (0..100)
        .map(|n| match n {
            0 => base.join(&stamp),
            n => base.join(format!("{stamp}-{n:02}")),
        })
        .find(|dir| !dir.exists())
        .with_context(|| format!("no free run directory for {stamp} in {}", base.display()))?;

    fs::create_dir_all(&run_dir)
        .with_context(|| format!("cannot create run directory {}", run_dir.display()))?;
    Ok(run_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> SimConfig {
        SimConfig {
            t_final: 4.0,
            activate_at: 1.0,
            deactivate_at: Some(3.0),
            ..SimConfig::default()
        }
    }

    #[test]
    fn trace_is_reproducible() {
        let cfg = short_config();
        let a = simulate(&cfg).unwrap();
        let b = simulate(&cfg).unwrap();
        assert_eq!(a.records.len(), 200);
        assert_eq!(a.seed, 2023);
        for (ra, rb) in a.records.iter().zip(b.records.iter()) {
            assert_eq!(ra.offset_x_m, rb.offset_x_m);
            assert_eq!(ra.output_y_m, rb.output_y_m);
        }
    }

    #[test]
    fn output_snaps_to_leader_on_deactivate_then_holds() {
        let trace = simulate(&short_config()).unwrap();
        let idle = trace
            .records
            .iter()
            .position(|r| r.time_s > 2.0 && !r.active)
            .unwrap();
        let snap = &trace.records[idle];
        assert_eq!(
            [snap.output_x_m, snap.output_y_m, snap.output_z_m],
            [snap.leader_x_m, snap.leader_y_m, snap.leader_z_m]
        );

        for r in &trace.records[idle..] {
            assert!(!r.active);
            assert_eq!([r.offset_x_m, r.offset_y_m, r.offset_z_m], [0.0; 3]);
            assert_eq!(
                [r.output_x_m, r.output_y_m, r.output_z_m],
                [snap.output_x_m, snap.output_y_m, snap.output_z_m]
            );
        }

        // The foot keeps walking, so the held output falls behind it.
        let last = trace.records.last().unwrap();
        assert!(last.leader_x_m > snap.leader_x_m);
    }

    #[test]
    fn stance_freezes_noise_time() {
        let trace = simulate(&short_config()).unwrap();
        let window = trace.records.windows(2).filter(|w| w[0].active && w[1].active);
        for w in window {
            if w[1].grounded {
                assert_eq!(w[1].noise_time_s, w[0].noise_time_s);
            } else {
                assert!(w[1].noise_time_s > w[0].noise_time_s);
            }
        }
        // Calibration averages one full stride: between planted height and peak clearance.
        assert!(trace.ground_level_m > 0.04 && trace.ground_level_m < 0.17);
    }

    #[test]
    fn default_output_sits_at_workspace_root() {
        let dir = default_output_base_dir();
        assert!(dir.ends_with(DEFAULT_OUTPUT_DIR));
        assert!(dir.parent().unwrap().join("crates").join("posnoise-sim").exists());
    }

    #[test]
    fn repeated_runs_get_distinct_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let a = create_run_dir(tmp.path()).unwrap();
        let b = create_run_dir(tmp.path()).unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
    }

    #[test]
    fn run_writes_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = run_simulation(&short_config(), tmp.path()).unwrap();
        assert!(summary.outputs.output_dir.starts_with(tmp.path()));
        assert!(summary.outputs.csv_path.exists());
        assert!(summary.outputs.summary_path.exists());
        assert_eq!(summary.samples, 200);
        assert!(summary.active_samples > 0);
        assert!(summary.offsets.max_norm_m <= 3.0_f64.sqrt());
    }
}
