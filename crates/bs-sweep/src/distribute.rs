//! The work distributor: execute every row of a [`SweepTable`] exactly once.
//!
//! All media return an unordered `Vec<RunRecord>` holding one record per
//! row.  Failed runs are records too (with an `Err` outcome), never dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use bs_core::RunParameters;
use bs_model::{ModelResult, RunResult};

use crate::record::execute;
use crate::table::run_id_at;
use crate::{
    ExecutionMode, LocalGroup, ProcessGroup, RunRecord, SweepConfig, SweepError, SweepResult,
    SweepTable, SweepTables, Workers, aggregate,
};

/// Execute every row with [`bs_model::run`].
pub fn distribute(
    table:   &SweepTable,
    workers: Workers,
    mode:    ExecutionMode,
) -> SweepResult<Vec<RunRecord>> {
    distribute_with(table, workers, mode, bs_model::run)
}

/// Execute every row with a caller-supplied run function.
///
/// `workers` is resolved once, here.  More workers than rows is fine: the
/// surplus would get no work and is not started.
pub fn distribute_with<F>(
    table:   &SweepTable,
    workers: Workers,
    mode:    ExecutionMode,
    runner:  F,
) -> SweepResult<Vec<RunRecord>>
where
    F: Fn(&RunParameters) -> ModelResult<RunResult> + Sync,
{
    let workers = workers.resolve();
    let started = Instant::now();
    info!(runs = table.len(), workers, %mode, "distributing sweep");

    let records = match mode {
        ExecutionMode::Sequential  => run_sequential(table, &runner),
        ExecutionMode::Striped     => run_striped(table, workers, &runner)?,
        ExecutionMode::DynamicPull => run_dynamic(table, workers, &runner)?,
        ExecutionMode::Pool        => run_pool(table, workers, &runner)?,
        ExecutionMode::Group       => run_local_group(table, workers, &runner)?,
    };

    let failed = records.iter().filter(|r| !r.is_ok()).count();
    info!(
        runs = records.len(),
        failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "sweep runs finished"
    );
    Ok(records)
}

/// Distribute then aggregate: the whole sweep in one call.
pub fn sweep(table: &SweepTable, config: &SweepConfig) -> SweepResult<SweepTables> {
    let records = distribute(table, config.workers, config.mode)?;
    aggregate(records, table.len())
}

/// Group-collective distribution, called by every rank of `group`.
///
/// The `root` rank passes `Some(table)`; it is broadcast whole, each rank
/// runs the rows with `i % size == rank`, and the partial record lists are
/// gathered on `root`.  The root returns `Some(records)`, every other rank
/// returns `None`.
pub fn distribute_group<G, F>(
    group:  &G,
    root:   usize,
    table:  Option<SweepTable>,
    runner: F,
) -> SweepResult<Option<Vec<RunRecord>>>
where
    G: ProcessGroup,
    F: Fn(&RunParameters) -> ModelResult<RunResult> + Sync,
{
    let table = group.broadcast(root, table)?;
    let (rank, size) = (group.rank(), group.size());

    let local: Vec<RunRecord> = table
        .iter()
        .skip(rank)
        .step_by(size)
        .map(|(run_id, params)| execute(run_id, params, &runner))
        .collect();
    debug!(rank, size, runs = local.len(), "rank finished its stripe");

    let gathered = group.gather(root, local)?;
    Ok(gathered.map(|parts| parts.into_iter().flatten().collect()))
}

// ── Media ─────────────────────────────────────────────────────────────────────

fn run_sequential<F>(table: &SweepTable, runner: &F) -> Vec<RunRecord>
where
    F: Fn(&RunParameters) -> ModelResult<RunResult> + Sync,
{
    table
        .iter()
        .map(|(run_id, params)| execute(run_id, params, runner))
        .collect()
}

fn run_striped<F>(table: &SweepTable, workers: usize, runner: &F) -> SweepResult<Vec<RunRecord>>
where
    F: Fn(&RunParameters) -> ModelResult<RunResult> + Sync,
{
    let active = workers.min(table.len());
    run_scoped(active, "stripe", |k| {
        table
            .iter()
            .skip(k)
            .step_by(workers)
            .map(|(run_id, params)| execute(run_id, params, runner))
            .collect()
    })
}

fn run_dynamic<F>(table: &SweepTable, workers: usize, runner: &F) -> SweepResult<Vec<RunRecord>>
where
    F: Fn(&RunParameters) -> ModelResult<RunResult> + Sync,
{
    let rows = table.rows();
    let next = AtomicUsize::new(0);

    run_scoped(workers.min(rows.len()), "pull", |_| {
        let mut local = Vec::new();
        loop {
            // Each fetch_add hands out a distinct index, so every row is
            // claimed by exactly one worker.
            let i = next.fetch_add(1, Ordering::Relaxed);
            let Some(params) = rows.get(i) else {
                break;
            };
            local.push(execute(run_id_at(i), params, runner));
        }
        local
    })
}

fn run_pool<F>(table: &SweepTable, workers: usize, runner: &F) -> SweepResult<Vec<RunRecord>>
where
    F: Fn(&RunParameters) -> ModelResult<RunResult> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("sweep-pool-{i}"))
        .build()?;

    Ok(pool.install(|| {
        table
            .rows()
            .par_iter()
            .enumerate()
            .map(|(i, params)| execute(run_id_at(i), params, runner))
            .collect()
    }))
}

fn run_local_group<F>(table: &SweepTable, workers: usize, runner: &F) -> SweepResult<Vec<RunRecord>>
where
    F: Fn(&RunParameters) -> ModelResult<RunResult> + Sync,
{
    const ROOT: usize = 0;

    let per_rank = LocalGroup::launch(group_size(workers, table.len()), |member| {
        let table = (member.rank() == ROOT).then(|| table.clone());
        distribute_group(&member, ROOT, table, runner)
    })?;

    let mut root_records = None;
    for (rank, result) in per_rank.into_iter().enumerate() {
        let records = result?;
        if rank == ROOT {
            root_records = records;
        }
    }
    // The root always returns Some when its gather succeeded.
    Ok(root_records.unwrap_or_default())
}

/// Ranks to start for `rows` rows.  A group needs at least its root, even
/// for an empty table.
pub(crate) fn group_size(workers: usize, rows: usize) -> usize {
    workers.min(rows).max(1)
}

/// Run `work(k)` for `k in 0..n` on scoped OS threads and concatenate the
/// per-worker record lists.  Joins every worker before returning.
fn run_scoped<W>(n: usize, label: &str, work: W) -> SweepResult<Vec<RunRecord>>
where
    W: Fn(usize) -> Vec<RunRecord> + Sync,
{
    thread::scope(|s| {
        let work = &work;
        let mut handles = Vec::with_capacity(n);
        for k in 0..n {
            let handle = thread::Builder::new()
                .name(format!("sweep-{label}-{k}"))
                .spawn_scoped(s, move || work(k))
                .map_err(SweepError::Spawn)?;
            handles.push(handle);
        }

        let mut records = Vec::new();
        for (worker, handle) in handles.into_iter().enumerate() {
            let part = handle.join().map_err(|_| SweepError::WorkerPanicked { worker })?;
            records.extend(part);
        }
        Ok(records)
    })
}
