//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `metrics.csv`: one row per run
//! - `timeseries.csv`: tidy `(run_id, time, station, bikes)` rows
//!
//! Rows go to `<name>.partial` first; [`finish`](TableWriter::finish) renames
//! both files into place.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use tracing::info;

use bs_sweep::{MetricsRow, TimeseriesRow};

use crate::writer::TableWriter;
use crate::{OutputError, OutputResult};

pub const METRICS_FILE: &str = "metrics.csv";
pub const TIMESERIES_FILE: &str = "timeseries.csv";

pub const METRICS_HEADER: [&str; 13] = [
    "run_id", "init_mailly", "init_moulin", "steps", "p1", "p2", "seed",
    "unmet_mailly", "unmet_moulin", "final_mailly", "final_moulin", "final_imbalance", "total_bikes",
];
pub const TIMESERIES_HEADER: [&str; 4] = ["run_id", "time", "station", "bikes"];

/// One output file being written under a temporary name.
struct PendingFile {
    writer: Writer<File>,
    tmp:    PathBuf,
    dest:   PathBuf,
}

impl PendingFile {
    fn create(dir: &Path, name: &str, header: &[&str]) -> OutputResult<Self> {
        let dest = dir.join(name);
        let tmp = dir.join(format!("{name}.partial"));
        // Headers are written by hand so an empty table still gets one.
        let mut writer = WriterBuilder::new().has_headers(false).from_path(&tmp)?;
        writer.write_record(header)?;
        Ok(Self { writer, tmp, dest })
    }

    fn publish(mut self) -> OutputResult<PathBuf> {
        self.writer.flush()?;
        drop(self.writer);
        fs::rename(&self.tmp, &self.dest)?;
        Ok(self.dest)
    }
}

/// Writes the aggregated sweep tables to two CSV files.
pub struct CsvWriter {
    metrics:    Option<PendingFile>,
    timeseries: Option<PendingFile>,
}

impl CsvWriter {
    /// Create `dir` if needed and open both tables with their header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            metrics:    Some(PendingFile::create(dir, METRICS_FILE, &METRICS_HEADER)?),
            timeseries: Some(PendingFile::create(dir, TIMESERIES_FILE, &TIMESERIES_HEADER)?),
        })
    }
}

impl TableWriter for CsvWriter {
    fn write_metrics(&mut self, rows: &[MetricsRow]) -> OutputResult<()> {
        let file = self.metrics.as_mut().ok_or(OutputError::Finished)?;
        for row in rows {
            file.writer.serialize(row)?;
        }
        Ok(())
    }

    fn write_timeseries(&mut self, rows: &[TimeseriesRow]) -> OutputResult<()> {
        let file = self.timeseries.as_mut().ok_or(OutputError::Finished)?;
        for row in rows {
            file.writer.serialize(row)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        for file in [self.metrics.take(), self.timeseries.take()].into_iter().flatten() {
            let path = file.publish()?;
            info!(path = %path.display(), "wrote table");
        }
        Ok(())
    }
}
