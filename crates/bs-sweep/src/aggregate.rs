//! The result aggregator: merge unordered run records into ordered tables.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bs_core::{RunId, RunParameters, Station};
use bs_model::RunResult;

use crate::{RunRecord, SweepError, SweepResult};

// ── Row types ─────────────────────────────────────────────────────────────────

/// One run's parameters and final metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub run_id:          RunId,
    pub init_mailly:     i64,
    pub init_moulin:     i64,
    pub steps:           i64,
    pub p1:              f64,
    pub p2:              f64,
    pub seed:            i64,
    pub unmet_mailly:    u64,
    pub unmet_moulin:    u64,
    pub final_mailly:    u64,
    pub final_moulin:    u64,
    pub final_imbalance: i64,
    pub total_bikes:     u64,
}

impl MetricsRow {
    pub fn new(run_id: RunId, params: &RunParameters, result: &RunResult) -> Self {
        let m = &result.metrics;
        Self {
            run_id,
            init_mailly:     params.init_mailly,
            init_moulin:     params.init_moulin,
            steps:           params.steps,
            p1:              params.p1,
            p2:              params.p2,
            seed:            params.seed,
            unmet_mailly:    m.unmet_mailly,
            unmet_moulin:    m.unmet_moulin,
            final_mailly:    m.final_mailly,
            final_moulin:    m.final_moulin,
            final_imbalance: m.final_imbalance,
            total_bikes:     m.total_bikes,
        }
    }
}

/// One bike count: a single (run, time, station) observation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeseriesRow {
    pub run_id:  RunId,
    pub time:    u64,
    pub station: Station,
    pub bikes:   u64,
}

impl TimeseriesRow {
    /// Unpivot one run's timeseries: two rows per time step, Mailly first.
    pub fn tidy(run_id: RunId, result: &RunResult) -> impl Iterator<Item = TimeseriesRow> + '_ {
        result.timeseries.iter().flat_map(move |p| {
            Station::ALL.map(|station| TimeseriesRow {
                run_id,
                time: p.time,
                station,
                bikes: match station {
                    Station::Mailly => p.mailly,
                    Station::Moulin => p.moulin,
                },
            })
        })
    }
}

/// The two aggregated tables, both in ascending `RunId` order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepTables {
    pub metrics:    Vec<MetricsRow>,
    pub timeseries: Vec<TimeseriesRow>,
}

/// An inclusive span of consecutive run ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunIdRange {
    pub first: RunId,
    pub last:  RunId,
}

impl RunIdRange {
    /// Span `first..=last` of row positions.  Positions past `u32::MAX`
    /// cannot name a run and are clamped.
    pub fn between(first: usize, last: usize) -> Self {
        let id = |i: usize| RunId(u32::try_from(i).unwrap_or(u32::MAX));
        Self { first: id(first), last: id(last) }
    }

    pub fn single(id: RunId) -> Self {
        Self { first: id, last: id }
    }

    /// Number of ids in the span.
    pub fn len(&self) -> u64 {
        u64::from(self.last.0) - u64::from(self.first.0) + 1
    }

    pub fn contains(&self, id: RunId) -> bool {
        (self.first..=self.last).contains(&id)
    }
}

impl fmt::Display for RunIdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}..={}", self.first, self.last)
        }
    }
}

// ── aggregate ─────────────────────────────────────────────────────────────────

/// Merge records from any execution medium into [`SweepTables`].
///
/// The records must cover `RunId`s `0..expected_runs` exactly once each;
/// otherwise nothing is emitted and [`SweepError::IncompleteSweep`] lists the
/// missing ids (as ranges), duplicated ids and out-of-range ids.  If the set is complete but some
/// runs failed, [`SweepError::RunsFailed`] carries every failure.
pub fn aggregate(mut records: Vec<RunRecord>, expected_runs: usize) -> SweepResult<SweepTables> {
    records.sort_by_key(|r| r.run_id);
    check_complete(&records, expected_runs)?;

    let failures: Vec<_> = records
        .iter()
        .filter_map(|r| r.outcome.as_ref().err().cloned())
        .collect();
    if !failures.is_empty() {
        warn!(failed = failures.len(), "sweep has failed runs; refusing to emit tables");
        return Err(SweepError::RunsFailed(failures));
    }

    let mut tables = SweepTables {
        metrics:    Vec::with_capacity(records.len()),
        timeseries: Vec::new(),
    };
    for record in &records {
        // Failures were ruled out above.
        let Ok(result) = &record.outcome else { continue };
        tables.metrics.push(MetricsRow::new(record.run_id, &record.params, result));
        tables.timeseries.extend(TimeseriesRow::tidy(record.run_id, result));
    }

    info!(
        runs = tables.metrics.len(),
        timeseries_rows = tables.timeseries.len(),
        "aggregated sweep"
    );
    Ok(tables)
}

/// `records` must already be sorted by `run_id`.
///
/// Work and memory grow with the number of records, not with
/// `expected_runs`: gaps are reported as ranges.
fn check_complete(records: &[RunRecord], expected_runs: usize) -> SweepResult<()> {
    let mut missing = Vec::new();
    let mut duplicated: Vec<RunId> = Vec::new();
    let mut unexpected: Vec<RunId> = Vec::new();

    // Lowest in-range index not yet accounted for.
    let mut next = 0usize;
    let mut prev: Option<RunId> = None;
    for r in records {
        let id = r.run_id;
        if id.index() >= expected_runs {
            if unexpected.last() != Some(&id) {
                unexpected.push(id);
            }
        } else if prev == Some(id) {
            if duplicated.last() != Some(&id) {
                duplicated.push(id);
            }
        } else {
            if id.index() > next {
                missing.push(RunIdRange::between(next, id.index() - 1));
            }
            next = id.index() + 1;
        }
        prev = Some(id);
    }
    if next < expected_runs {
        missing.push(RunIdRange::between(next, expected_runs - 1));
    }

    if missing.is_empty() && duplicated.is_empty() && unexpected.is_empty() {
        return Ok(());
    }
    warn!(
        expected = expected_runs,
        missing = missing.iter().map(RunIdRange::len).sum::<u64>(),
        duplicated = duplicated.len(),
        unexpected = unexpected.len(),
        "incomplete sweep"
    );
    Err(SweepError::IncompleteSweep { expected: expected_runs, missing, duplicated, unexpected })
}
