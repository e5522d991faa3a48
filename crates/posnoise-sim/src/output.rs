use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::config::SimConfig;

#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub time_s: f64,
    pub active: bool,
    pub grounded: bool,
    pub noise_time_s: f64,

    pub leader_x_m: f64,
    pub leader_y_m: f64,
    pub leader_z_m: f64,

    pub offset_x_m: f64,
    pub offset_y_m: f64,
    pub offset_z_m: f64,

    pub output_x_m: f64,
    pub output_y_m: f64,
    pub output_z_m: f64,

    pub ground_level_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OffsetMetrics {
    pub rms_x_m: f64,
    pub rms_y_m: f64,
    pub rms_z_m: f64,
    pub max_abs_x_m: f64,
    pub max_abs_y_m: f64,
    pub max_abs_z_m: f64,
    pub max_norm_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub config: SimConfig,
    pub seed: u64,
    pub samples: usize,
    pub active_samples: usize,
    pub frozen_samples: usize,
    pub final_noise_time_s: f64,
    pub calibrated_ground_level_m: f64,
    pub offsets: OffsetMetrics,
    pub outputs: OutputFiles,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputFiles {
    pub output_dir: PathBuf,
    pub csv_path: PathBuf,
    pub summary_path: PathBuf,
}

impl OutputFiles {
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            csv_path: output_dir.join("trace.csv"),
            summary_path: output_dir.join("summary.json"),
        }
    }
}

/// RMS and peak offsets over the active part of a trace.
pub fn offset_metrics(records: &[TraceRecord]) -> OffsetMetrics {
    let mut sq = [0.0_f64; 3];
    let mut max_abs = [0.0_f64; 3];
    let mut max_norm = 0.0_f64;
    let mut count = 0.0_f64;

    for r in records.iter().filter(|r| r.active) {
        let axes = [r.offset_x_m, r.offset_y_m, r.offset_z_m];
        for (i, v) in axes.iter().enumerate() {
            sq[i] += v * v;
            max_abs[i] = max_abs[i].max(v.abs());
        }
        max_norm = max_norm.max(axes.iter().map(|v| v * v).sum::<f64>().sqrt());
        count += 1.0;
    }

    let n = count.max(1.0);
    OffsetMetrics {
        rms_x_m: (sq[0] / n).sqrt(),
        rms_y_m: (sq[1] / n).sqrt(),
        rms_z_m: (sq[2] / n).sqrt(),
        max_abs_x_m: max_abs[0],
        max_abs_y_m: max_abs[1],
        max_abs_z_m: max_abs[2],
        max_norm_m: max_norm,
    }
}

/// One CSV row per record, header from the field names.
pub fn write_csv(path: &Path, records: &[TraceRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot open trace {}", path.display()))?;
    records
        .iter()
        .try_for_each(|record| writer.serialize(record))
        .with_context(|| format!("cannot write trace {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Pretty-printed JSON summary.
pub fn write_summary(path: &Path, summary: &Summary) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create summary {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, summary)?;
    out.flush()?;
    Ok(())
}
