//! Run parameters as they arrive from a parameter table, and their checked form.
//!
//! `RunParameters` mirrors one row of the input table.  Its integer fields are
//! signed so that a malformed row (say `init_mailly = -3`) survives parsing and
//! is rejected by [`RunParameters::validate`] against its own run, instead of
//! failing the whole table load.

use serde::{Deserialize, Serialize};

use crate::{ParamError, ParamResult};

/// One run's inputs.  Immutable once built; `(fields, seed)` fully determine
/// the run's output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub init_mailly: i64,
    pub init_moulin: i64,
    pub steps:       i64,
    /// Probability per step of a Mailly → Moulin trip request.
    pub p1:          f64,
    /// Probability per step of a Moulin → Mailly trip request.
    pub p2:          f64,
    pub seed:        i64,
}

/// Parameters that passed [`RunParameters::validate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidParameters {
    pub init_mailly: u64,
    pub init_moulin: u64,
    pub steps:       u64,
    pub p1:          f64,
    pub p2:          f64,
    pub seed:        u64,
}

impl RunParameters {
    pub fn new(init_mailly: i64, init_moulin: i64, steps: i64, p1: f64, p2: f64, seed: i64) -> Self {
        Self { init_mailly, init_moulin, steps, p1, p2, seed }
    }

    /// Check every field and return the unsigned form.
    ///
    /// Pure: nothing is allocated or drawn, so a rejected run leaves no trace.
    pub fn validate(&self) -> ParamResult<ValidParameters> {
        let init_mailly = non_negative("init_mailly", self.init_mailly)?;
        let init_moulin = non_negative("init_moulin", self.init_moulin)?;
        let steps = non_negative("steps", self.steps)?;
        let seed = non_negative("seed", self.seed)?;
        let p1 = probability("p1", self.p1)?;
        let p2 = probability("p2", self.p2)?;

        Ok(ValidParameters { init_mailly, init_moulin, steps, p1, p2, seed })
    }
}

impl ValidParameters {
    /// Bikes in the system; conserved for the whole run.
    ///
    /// Cannot overflow: both counts came from non-negative `i64`s.
    #[inline]
    pub fn total_bikes(&self) -> u64 {
        self.init_mailly + self.init_moulin
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn non_negative(field: &'static str, value: i64) -> ParamResult<u64> {
    u64::try_from(value).map_err(|_| ParamError::NegativeValue { field, value })
}

fn probability(field: &'static str, value: f64) -> ParamResult<f64> {
    // NaN fails `contains`, so it is rejected here too.
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ParamError::ProbabilityOutOfRange { field, value })
    }
}
