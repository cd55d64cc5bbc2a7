//! The single-run driver.

use bs_core::{DrawSource, RunParameters, RunRng, ValidParameters};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ModelError, ModelResult, SystemState, step};

// ── Output types ──────────────────────────────────────────────────────────────

/// Bike counts at one instant.  `time` 0 is the initial state.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub time:   u64,
    pub mailly: u64,
    pub moulin: u64,
}

/// End-of-run scalars.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RunMetrics {
    pub unmet_mailly:    u64,
    pub unmet_moulin:    u64,
    pub final_mailly:    u64,
    pub final_moulin:    u64,
    /// `final_mailly - final_moulin`.
    pub final_imbalance: i64,
    pub total_bikes:     u64,
}

impl RunMetrics {
    /// Column names in the order [`entries`](Self::entries) yields them.
    pub const NAMES: [&'static str; 6] = [
        "unmet_mailly",
        "unmet_moulin",
        "final_mailly",
        "final_moulin",
        "final_imbalance",
        "total_bikes",
    ];

    /// Derive the metrics from the state left after the last step.
    pub fn from_final_state(state: &SystemState) -> Self {
        Self {
            unmet_mailly:    state.unmet_mailly,
            unmet_moulin:    state.unmet_moulin,
            final_mailly:    state.mailly,
            final_moulin:    state.moulin,
            final_imbalance: signed_diff(state.mailly, state.moulin),
            total_bikes:     state.total(),
        }
    }

    /// `(name, value)` pairs, as the flat key/value view used by metric files.
    pub fn entries(&self) -> [(&'static str, i128); 6] {
        [
            (Self::NAMES[0], self.unmet_mailly as i128),
            (Self::NAMES[1], self.unmet_moulin as i128),
            (Self::NAMES[2], self.final_mailly as i128),
            (Self::NAMES[3], self.final_moulin as i128),
            (Self::NAMES[4], self.final_imbalance as i128),
            (Self::NAMES[5], self.total_bikes as i128),
        ]
    }
}

/// Full history and final metrics of one run.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RunResult {
    /// `steps + 1` entries; index 0 is the initial state.
    pub timeseries: Vec<TimeseriesPoint>,
    pub metrics:    RunMetrics,
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Execute one run.
///
/// Parameters are validated before anything is allocated or drawn, so an
/// invalid row fails with [`ModelError::InvalidParameters`] and no side
/// effects.  Equal `params` always yield equal results.
pub fn run(params: &RunParameters) -> ModelResult<RunResult> {
    let valid = params.validate()?;
    let mut rng = RunRng::new(valid.seed);
    debug!(seed = valid.seed, steps = valid.steps, p1 = valid.p1, p2 = valid.p2, "starting run");
    run_with(&valid, &mut rng)
}

/// Like [`run`] but with an explicit random source.
///
/// Fails only if the timeseries buffer cannot be reserved.
pub fn run_with<D: DrawSource>(params: &ValidParameters, rng: &mut D) -> ModelResult<RunResult> {
    let len = usize::try_from(params.steps)
        .ok()
        .and_then(|s| s.checked_add(1))
        .ok_or(ModelError::Allocation { steps: params.steps })?;

    let mut timeseries: Vec<TimeseriesPoint> = Vec::new();
    timeseries
        .try_reserve_exact(len)
        .map_err(|_| ModelError::Allocation { steps: params.steps })?;

    let mut state = SystemState::new(params.init_mailly, params.init_moulin);
    timeseries.push(TimeseriesPoint { time: 0, mailly: state.mailly, moulin: state.moulin });

    for t in 1..=params.steps {
        let (next, _deltas) = step(&state, params.p1, params.p2, rng);
        state = next;
        timeseries.push(TimeseriesPoint { time: t, mailly: state.mailly, moulin: state.moulin });
    }

    Ok(RunResult {
        timeseries,
        metrics: RunMetrics::from_final_state(&state),
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn signed_diff(a: u64, b: u64) -> i64 {
    // Clamps only when the two counts differ by more than i64::MAX.
    let diff = a as i128 - b as i128;
    diff.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
