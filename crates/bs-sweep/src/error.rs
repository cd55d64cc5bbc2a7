use thiserror::Error;

use bs_core::RunId;

use crate::{GroupError, RunError, RunIdRange};

/// Errors reading a parameter table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parameter row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("parameter row {row}: base seed + row index overflows the seed range")]
    SeedOverflow { row: usize },

    #[error("parameter table has {rows} rows; at most {} are supported", u32::MAX)]
    TooManyRows { rows: usize },
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("parameter table error: {0}")]
    Table(#[from] TableError),

    #[error(
        "incomplete sweep of {expected} runs: missing [{}], duplicated {duplicated:?}, unexpected {unexpected:?}",
        join(.missing)
    )]
    IncompleteSweep {
        expected:   usize,
        /// Gaps, in ascending order.
        missing:    Vec<RunIdRange>,
        duplicated: Vec<RunId>,
        unexpected: Vec<RunId>,
    },

    #[error("{} run(s) failed, first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    RunsFailed(Vec<RunError>),

    #[error("could not start sweep worker: {0}")]
    Spawn(std::io::Error),

    #[error("sweep worker {worker} panicked outside a run")]
    WorkerPanicked { worker: usize },

    #[error("could not build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("process group error: {0}")]
    Group(#[from] GroupError),
}

pub type SweepResult<T> = Result<T, SweepError>;

fn join(ranges: &[RunIdRange]) -> String {
    ranges.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
