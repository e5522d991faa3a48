use std::path::PathBuf;

use clap::Parser;
use posnoise_sim::config::SimConfig;
use posnoise_sim::{default_output_base_dir, run_simulation};
use posnoise_sim::telemetry::init_tracing;

#[derive(Debug, Parser)]
#[command(author, version, about = "Multisine positional disturbance on a synthetic walking foot")]
struct Cli {
    /// TOML configuration file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory; relative paths are taken from the workspace root
    /// [default: output-posnoise-sim at the workspace root]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Fixed step in seconds
    #[arg(long)]
    dt: Option<f64>,

    /// Final simulation time in seconds
    #[arg(long)]
    t_final: Option<f64>,

    /// Top-level disturbance seed
    #[arg(long)]
    seed: Option<u64>,

    /// Global disturbance intensity, clamped to [0, 1]
    #[arg(long)]
    intensity: Option<f64>,

    /// Offset magnitude at full scale [m]
    #[arg(long)]
    max_distance: Option<f64>,

    /// Keep noise running while the foot is planted
    #[arg(long, default_value_t = false)]
    no_ground_pause: bool,
}

fn main() -> anyhow::Result<()> {
    if let Err(err) = init_tracing() {
        eprintln!("tracing disabled: {err}");
    }

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => SimConfig::from_toml_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(v) = cli.dt {
        cfg.dt = v;
    }
    if let Some(v) = cli.t_final {
        cfg.t_final = v;
    }
    if let Some(v) = cli.seed {
        cfg.disturbance.seed = Some(v);
    }
    if let Some(v) = cli.intensity {
        cfg.disturbance.intensity = v;
    }
    if let Some(v) = cli.max_distance {
        cfg.disturbance.max_distance = v;
    }
    if cli.no_ground_pause {
        cfg.disturbance.pause_on_ground = false;
    }

    let output = cli.output.unwrap_or_else(default_output_base_dir);
    let summary = run_simulation(&cfg, &output)?;

    println!(
        "Simulation complete. Samples: {} | Active: {} | Frozen: {}",
        summary.samples, summary.active_samples, summary.frozen_samples
    );
    println!("Seed: {}", summary.seed);
    println!("Run directory: {}", summary.outputs.output_dir.display());
    println!("CSV: {}", summary.outputs.csv_path.display());
    println!("Summary: {}", summary.outputs.summary_path.display());
    println!(
        "Offset RMS x/y/z: {:.4} | {:.4} | {:.4} m (max |offset| {:.4} m)",
        summary.offsets.rms_x_m,
        summary.offsets.rms_y_m,
        summary.offsets.rms_z_m,
        summary.offsets.max_norm_m
    );
    println!(
        "Ground level: {:.4} m | noise time: {:.2} s",
        summary.calibrated_ground_level_m, summary.final_noise_time_s
    );

    Ok(())
}
