//! `bs-output`: writing and reading sweep results for the rust_bikeshare
//! simulator.
//!
//! | Feature   | Backend     | Files created                                |
//! |-----------|-------------|----------------------------------------------|
//! | *(none)*  | CSV         | `metrics.csv`, `timeseries.csv`              |
//! | `sqlite`  | SQLite      | `sweep.db` (`metrics`, `timeseries` tables)  |
//!
//! Both backends implement [`TableWriter`].  Aggregated tables only reach a
//! writer after [`bs_sweep::aggregate`] has certified them, and the CSV
//! backend writes to `*.partial` files that are renamed on
//! [`finish`](TableWriter::finish), so an aborted sweep never leaves a table
//! that looks complete.
//!
//! For one-process-per-run execution, [`write_run_artifacts`] stores each
//! run in its own numbered directory and [`collect_dir`] merges them back.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bs_output::{CsvWriter, write_sweep};
//!
//! let tables = bs_sweep::sweep(&table, &config)?;
//! let mut writer = CsvWriter::new(Path::new("./results"))?;
//! write_sweep(&mut writer, &tables)?;
//! ```

pub mod artifacts;
pub mod collect;
pub mod csv;
pub mod error;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use artifacts::{RunMetadata, read_run_artifacts, write_run_artifacts, write_single_run};
pub use collect::collect_dir;
pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use writer::{TableWriter, write_sweep};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
