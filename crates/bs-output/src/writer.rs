//! The `TableWriter` trait implemented by all backend writers.

use bs_sweep::{MetricsRow, SweepTables, TimeseriesRow};

use crate::OutputResult;

/// Trait implemented by the CSV and SQLite writers.
pub trait TableWriter {
    /// Write a batch of per-run metrics rows.
    fn write_metrics(&mut self, rows: &[MetricsRow]) -> OutputResult<()>;

    /// Write a batch of tidy timeseries rows.
    fn write_timeseries(&mut self, rows: &[TimeseriesRow]) -> OutputResult<()>;

    /// Flush, close, and publish the output.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Write both aggregated tables and finish the writer.
pub fn write_sweep<W: TableWriter>(writer: &mut W, tables: &SweepTables) -> OutputResult<()> {
    writer.write_metrics(&tables.metrics)?;
    writer.write_timeseries(&tables.timeseries)?;
    writer.finish()
}
