//! Merge per-run artifact directories into sweep tables.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use bs_core::RunId;
use bs_sweep::{SweepTables, aggregate};

use crate::{OutputResult, read_run_artifacts};

/// Read every `<in_dir>/<n>/` run directory and aggregate them.
///
/// Entries whose name is not a run number are ignored.  A run directory that
/// cannot be read (missing or inconsistent files, or a `run_id` that does not
/// match its directory name) is logged and left out, so it shows up as
/// missing in the resulting [`SweepError::IncompleteSweep`].
///
/// `expected_runs` defaults to one past the highest run number found.
///
/// [`SweepError::IncompleteSweep`]: bs_sweep::SweepError::IncompleteSweep
pub fn collect_dir(in_dir: &Path, expected_runs: Option<usize>) -> OutputResult<SweepTables> {
    let mut run_dirs: Vec<(u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(in_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(n) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) {
            run_dirs.push((n, entry.path()));
        }
    }
    run_dirs.sort_by_key(|&(n, _)| n);

    let expected = expected_runs
        .unwrap_or_else(|| run_dirs.last().map_or(0, |&(n, _)| n as usize + 1));

    let mut records = Vec::with_capacity(run_dirs.len());
    for (n, dir) in &run_dirs {
        match read_run_artifacts(dir) {
            Ok(record) if record.run_id == RunId(*n) => records.push(record),
            Ok(record) => warn!(
                dir = %dir.display(),
                found = %record.run_id,
                "run directory holds a different run; skipping"
            ),
            Err(e) => warn!(dir = %dir.display(), error = %e, "skipping unreadable run directory"),
        }
    }

    info!(found = run_dirs.len(), loaded = records.len(), expected, "collected run directories");
    Ok(aggregate(records, expected)?)
}
