//! Single-run output files.
//!
//! Per-run directory layout, written by [`write_run_artifacts`] and read back
//! by [`read_run_artifacts`]:
//!
//! ```text
//! <out_dir>/<run_id>/timeseries.csv   time,mailly,moulin
//! <out_dir>/<run_id>/metrics.csv      unmet_mailly,…,total_bikes (one row)
//! <out_dir>/<run_id>/metadata.json    {"run_id": …, "params": {…, "seed": …}}
//! ```
//!
//! The metadata carries the resolved seed, so a run can be replayed from its
//! directory alone.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bs_core::{RunId, RunParameters};
use bs_model::{RunMetrics, RunResult, TimeseriesPoint};
use bs_sweep::RunRecord;

use crate::{OutputError, OutputResult};

pub const RUN_TIMESERIES_FILE: &str = "timeseries.csv";
pub const RUN_METRICS_FILE: &str = "metrics.csv";
pub const RUN_METADATA_FILE: &str = "metadata.json";

/// Identity and resolved inputs of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: RunId,
    pub params: RunParameters,
}

/// Write one run's three artifacts into `<out_dir>/<run_id>/`.
///
/// Returns the run directory.
pub fn write_run_artifacts(
    out_dir: &Path,
    run_id:  RunId,
    params:  &RunParameters,
    result:  &RunResult,
) -> OutputResult<PathBuf> {
    let dir = out_dir.join(run_id.0.to_string());
    fs::create_dir_all(&dir)?;

    write_timeseries_csv(&dir.join(RUN_TIMESERIES_FILE), &result.timeseries)?;

    let mut metrics = csv::Writer::from_path(dir.join(RUN_METRICS_FILE))?;
    metrics.serialize(result.metrics)?;
    metrics.flush()?;

    let meta = RunMetadata { run_id, params: params.clone() };
    let mut json = BufWriter::new(File::create(dir.join(RUN_METADATA_FILE))?);
    serde_json::to_writer_pretty(&mut json, &meta)?;
    json.write_all(b"\n")?;
    json.flush()?;

    debug!(%run_id, dir = %dir.display(), "wrote run artifacts");
    Ok(dir)
}

/// Read a run directory written by [`write_run_artifacts`].
///
/// The files must agree with each other: `steps + 1` timeseries entries,
/// the last of which matches the final counts in `metrics.csv`.
pub fn read_run_artifacts(dir: &Path) -> OutputResult<RunRecord> {
    let malformed = |reason: String| OutputError::MalformedArtifact { path: dir.to_path_buf(), reason };

    let meta: RunMetadata =
        serde_json::from_reader(BufReader::new(File::open(dir.join(RUN_METADATA_FILE))?))?;

    let timeseries: Vec<TimeseriesPoint> = csv::Reader::from_path(dir.join(RUN_TIMESERIES_FILE))?
        .deserialize()
        .collect::<Result<_, _>>()?;

    let mut metrics_rows: Vec<RunMetrics> = csv::Reader::from_path(dir.join(RUN_METRICS_FILE))?
        .deserialize()
        .collect::<Result<_, _>>()?;
    let metrics = match (metrics_rows.pop(), metrics_rows.is_empty()) {
        (Some(m), true) => m,
        _ => return Err(malformed("metrics.csv must hold exactly one row".to_owned())),
    };

    if i64::try_from(timeseries.len()).ok() != meta.params.steps.checked_add(1) {
        return Err(malformed(format!(
            "{} timeseries entries for a run of {} steps",
            timeseries.len(),
            meta.params.steps
        )));
    }
    match timeseries.last() {
        Some(last) if last.mailly == metrics.final_mailly && last.moulin == metrics.final_moulin => {}
        _ => return Err(malformed("final timeseries entry disagrees with metrics".to_owned())),
    }

    Ok(RunRecord {
        run_id:  meta.run_id,
        params:  meta.params,
        outcome: Ok(RunResult { timeseries, metrics }),
    })
}

/// Single-run output: the timeseries at `csv_path` and its metrics as
/// tab-separated `name<TAB>value` lines in `<stem>.metrics.tsv` beside it.
///
/// Returns the metrics file path.
pub fn write_single_run(csv_path: &Path, result: &RunResult) -> OutputResult<PathBuf> {
    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_timeseries_csv(csv_path, &result.timeseries)?;

    let tsv_path = csv_path.with_extension("metrics.tsv");
    let mut tsv = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(&tsv_path)?;
    for (name, value) in result.metrics.entries() {
        tsv.write_record([name, value.to_string().as_str()])?;
    }
    tsv.flush()?;
    Ok(tsv_path)
}

fn write_timeseries_csv(path: &Path, points: &[TimeseriesPoint]) -> OutputResult<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(["time", "mailly", "moulin"])?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}
