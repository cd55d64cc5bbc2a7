//! Per-run outcome records produced by the distributor.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use bs_core::{ParamError, RunId, RunParameters};
use bs_model::{ModelError, ModelResult, RunResult};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a run produced no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunErrorKind {
    #[error("invalid parameters: {0}")]
    InvalidParameters(ParamError),

    #[error("run failed: {0}")]
    Failure(String),
}

/// A failed run, attributed to its row.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{run_id}: {kind}")]
pub struct RunError {
    pub run_id: RunId,
    pub kind:   RunErrorKind,
}

/// One executed run: its identity, its inputs, and what came out.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub run_id:  RunId,
    pub params:  RunParameters,
    pub outcome: Result<RunResult, RunError>,
}

impl RunRecord {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Run one row through `runner`, turning errors and panics into a record.
///
/// A panic inside `runner` is caught here so that it is charged to `run_id`
/// and the calling worker keeps claiming rows.
pub(crate) fn execute<F>(run_id: RunId, params: &RunParameters, runner: &F) -> RunRecord
where
    F: Fn(&RunParameters) -> ModelResult<RunResult> + Sync,
{
    debug!(%run_id, "executing run");
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| runner(params))) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(ModelError::InvalidParameters(e))) => Err(RunErrorKind::InvalidParameters(e)),
        Ok(Err(e)) => Err(RunErrorKind::Failure(e.to_string())),
        Err(payload) => Err(RunErrorKind::Failure(panic_message(payload.as_ref()))),
    };

    let outcome = outcome.map_err(|kind| {
        warn!(%run_id, error = %kind, "run failed");
        RunError { run_id, kind }
    });

    RunRecord { run_id, params: params.clone(), outcome }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_owned()
    }
}
