//! Sweep configuration: worker count, execution medium, and seed base.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use thiserror::Error;

// ── Workers ───────────────────────────────────────────────────────────────────

/// How many workers a sweep uses.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Workers {
    /// The host's available parallelism, looked up when the sweep starts.
    #[default]
    Auto,
    Fixed(NonZeroUsize),
}

impl Workers {
    /// A fixed count; `0` is treated as `1`.
    pub fn fixed(n: usize) -> Self {
        Workers::Fixed(NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN))
    }

    /// Concrete worker count.  `Auto` falls back to 1 if the host cannot
    /// report its parallelism.
    pub fn resolve(self) -> usize {
        match self {
            Workers::Fixed(n) => n.get(),
            Workers::Auto => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid worker count {0:?}: expected \"auto\" or a positive integer")]
pub struct WorkersParseError(pub String);

impl FromStr for Workers {
    type Err = WorkersParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Workers::Auto);
        }
        s.parse::<NonZeroUsize>()
            .map(Workers::Fixed)
            .map_err(|_| WorkersParseError(s.to_owned()))
    }
}

impl fmt::Display for Workers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workers::Auto => f.write_str("auto"),
            Workers::Fixed(n) => write!(f, "{n}"),
        }
    }
}

// ── ExecutionMode ─────────────────────────────────────────────────────────────

/// The medium runs execute on.  Choice affects load balance only.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ExecutionMode {
    /// Single thread, row order.  Ignores the worker count.
    Sequential,
    /// Static partition: worker `k` runs rows with `i % workers == k`.
    Striped,
    /// Workers claim the next unclaimed row from a shared counter.
    #[default]
    DynamicPull,
    /// A fixed-size Rayon thread pool.
    Pool,
    /// An in-process [`LocalGroup`](crate::LocalGroup) of `workers` ranks:
    /// rank 0 broadcasts the table, every rank runs its stripe, results are
    /// gathered back on rank 0.
    Group,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Sequential  => "sequential",
            ExecutionMode::Striped     => "striped",
            ExecutionMode::DynamicPull => "dynamic",
            ExecutionMode::Pool        => "pool",
            ExecutionMode::Group       => "group",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "serial" => Ok(ExecutionMode::Sequential),
            "striped"               => Ok(ExecutionMode::Striped),
            "dynamic" | "threads"   => Ok(ExecutionMode::DynamicPull),
            "pool"                  => Ok(ExecutionMode::Pool),
            "group" | "mpi"         => Ok(ExecutionMode::Group),
            other => Err(format!(
                "unknown execution mode {other:?}: expected sequential, striped, dynamic, pool or group"
            )),
        }
    }
}

// ── SweepConfig ───────────────────────────────────────────────────────────────

/// Everything a sweep needs besides the parameter table itself.
#[derive(Clone, Debug, Default)]
pub struct SweepConfig {
    pub workers:   Workers,
    pub mode:      ExecutionMode,
    /// Seed given to row `i` when the table has no `seed` value for it is
    /// `base_seed + i`.
    pub base_seed: u64,
}

impl SweepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: Workers) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }
}
