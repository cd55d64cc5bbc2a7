//! CSV parameter-table loader.
//!
//! # CSV format
//!
//! One row per run.  Column order is free; extra columns are ignored.
//!
//! ```csv
//! init_mailly,init_moulin,steps,p1,p2,seed
//! 10,10,200,0.3,0.3,1
//! 10,10,200,0.5,0.2,2
//! 5,15,200,0.4,0.4,
//! ```
//!
//! `seed` is optional: when the column is absent or a cell is empty, row `i`
//! gets `base_seed + i`, so every run still draws from its own stream.
//!
//! Cells that do not parse (text in a numeric column, a missing required
//! column) fail the whole load.  Values that parse but are out of range
//! (negative counts, `p1 = 1.3`) load fine and are rejected later by that
//! row's own run.
//!
//! The row position is the run's `RunId`.  Reordering or filtering the file
//! between a sweep and a later `collect` therefore changes which run an id
//! refers to.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use bs_core::{RunId, RunParameters};

use crate::TableError;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ParamRecord {
    init_mailly: i64,
    init_moulin: i64,
    steps:       i64,
    p1:          f64,
    p2:          f64,
    #[serde(default)]
    seed:        Option<i64>,
}

// ── SweepTable ────────────────────────────────────────────────────────────────

/// An ordered list of run parameters; each row's position is its `RunId`.
///
/// Holds at most `u32::MAX` rows so that every position fits in a `RunId`.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SweepTable {
    rows: Vec<RunParameters>,
}

impl SweepTable {
    /// Wrap already-resolved parameter rows.
    pub fn new(rows: Vec<RunParameters>) -> Result<Self, TableError> {
        if u32::try_from(rows.len()).is_err() {
            return Err(TableError::TooManyRows { rows: rows.len() });
        }
        Ok(Self { rows })
    }

    /// Load a parameter table from a CSV file.
    pub fn from_csv_path(path: &Path, base_seed: u64) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, base_seed)
    }

    /// Like [`from_csv_path`](Self::from_csv_path) but accepts any `Read`
    /// source (a `Cursor` in tests).
    pub fn from_reader<R: Read>(reader: R, base_seed: u64) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (row, result) in csv_reader.deserialize::<ParamRecord>().enumerate() {
            let record = result.map_err(|e| TableError::Parse { row, message: e.to_string() })?;
            let seed = match record.seed {
                Some(seed) => seed,
                None => default_seed(base_seed, row)?,
            };
            rows.push(RunParameters {
                init_mailly: record.init_mailly,
                init_moulin: record.init_moulin,
                steps:       record.steps,
                p1:          record.p1,
                p2:          record.p2,
                seed,
            });
        }

        Self::new(rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[RunParameters] {
        &self.rows
    }

    /// The parameters of one run, if `run_id` is in range.
    pub fn get(&self, run_id: RunId) -> Option<&RunParameters> {
        self.rows.get(run_id.index())
    }

    /// `(RunId, params)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (RunId, &RunParameters)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, params)| (run_id_at(i), params))
    }
}

/// `RunId` of row `i`.  In range for every row of a `SweepTable`.
#[inline]
pub(crate) fn run_id_at(i: usize) -> RunId {
    RunId(i as u32)
}

fn default_seed(base_seed: u64, row: usize) -> Result<i64, TableError> {
    base_seed
        .checked_add(row as u64)
        .and_then(|s| i64::try_from(s).ok())
        .ok_or(TableError::SeedOverflow { row })
}
