//! bikeshare: two-station bike-share simulator.
//!
//! # Example
//!
//! ```bash
//! # One run, timeseries to run.csv and metrics to run.metrics.tsv
//! bikeshare single --steps 60 --p1 0.3 --p2 0.2 --init-mailly 10 --init-moulin 2 --out-csv run.csv
//!
//! # A whole parameter table on 8 workers
//! bikeshare sweep --params params.csv --out-dir results --workers 8
//!
//! # One process per row, merged afterwards
//! bikeshare run-one --params params.csv --row-index 3 --out-dir runs
//! bikeshare collect --in-dir runs --out-dir results --expected 16
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bs_core::{RunId, RunParameters};
use bs_output::{
    CsvWriter, OutputError, TableWriter, collect_dir, write_run_artifacts, write_single_run,
    write_sweep,
};
use bs_sweep::{ExecutionMode, SweepConfig, SweepError, SweepTable, SweepTables, Workers};

#[derive(Parser, Debug)]
#[command(name = "bikeshare")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate one parameter set
    Single {
        /// Number of time steps
        #[arg(long)]
        steps: i64,

        /// Probability a rider wants to go Mailly -> Moulin in one step
        #[arg(long)]
        p1: f64,

        /// Probability a rider wants to go Moulin -> Mailly in one step
        #[arg(long)]
        p2: f64,

        /// Bikes docked at Mailly at time 0
        #[arg(long)]
        init_mailly: i64,

        /// Bikes docked at Moulin at time 0
        #[arg(long)]
        init_moulin: i64,

        #[arg(long, default_value = "0")]
        seed: i64,

        /// Timeseries CSV; metrics go to `<stem>.metrics.tsv` beside it
        #[arg(long)]
        out_csv: PathBuf,
    },

    /// Run every row of a parameter table and write the aggregated tables
    Sweep {
        /// CSV with columns init_mailly,init_moulin,steps,p1,p2[,seed]
        #[arg(long)]
        params: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,

        /// "auto" or a positive integer
        #[arg(long, default_value = "auto")]
        workers: Workers,

        /// sequential, striped, dynamic, pool or group
        #[arg(long, default_value = "dynamic")]
        mode: ExecutionMode,

        /// Row i without a seed gets base_seed + i
        #[arg(long, default_value = "0")]
        base_seed: u64,

        /// Write sweep.db instead of CSV files
        #[arg(long)]
        sqlite: bool,
    },

    /// Run a single row of a parameter table into <out-dir>/<row-index>/
    RunOne {
        #[arg(long)]
        params: PathBuf,

        #[arg(long)]
        row_index: u32,

        #[arg(long)]
        out_dir: PathBuf,

        #[arg(long, default_value = "0")]
        base_seed: u64,
    },

    /// Merge run-one directories into sweep tables
    Collect {
        #[arg(long)]
        in_dir: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,

        /// Number of runs the sweep had; defaults to highest run + 1
        #[arg(long)]
        expected: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("warn,bs_sweep=info,bs_output=info,bikeshare=info")
            }),
        )
        .init();

    match Args::parse().command {
        Command::Single { steps, p1, p2, init_mailly, init_moulin, seed, out_csv } => {
            let params = RunParameters::new(init_mailly, init_moulin, steps, p1, p2, seed);
            run_single(&params, &out_csv)
        }
        Command::Sweep { params, out_dir, workers, mode, base_seed, sqlite } => {
            let config = SweepConfig::new()
                .with_workers(workers)
                .with_mode(mode)
                .with_base_seed(base_seed);
            run_sweep(&params, &out_dir, &config, sqlite)
        }
        Command::RunOne { params, row_index, out_dir, base_seed } => {
            run_one(&params, RunId(row_index), &out_dir, base_seed)
        }
        Command::Collect { in_dir, out_dir, expected } => run_collect(&in_dir, &out_dir, expected),
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn run_single(params: &RunParameters, out_csv: &Path) -> Result<()> {
    let result = bs_model::run(params)?;
    let tsv = write_single_run(out_csv, &result)?;

    println!("{:<16} {:>12}", "metric", "value");
    println!("{}", "-".repeat(29));
    for (name, value) in result.metrics.entries() {
        println!("{name:<16} {value:>12}");
    }
    println!();
    println!("timeseries : {}", out_csv.display());
    println!("metrics    : {}", tsv.display());
    Ok(())
}

fn run_sweep(params: &Path, out_dir: &Path, config: &SweepConfig, sqlite: bool) -> Result<()> {
    let table = SweepTable::from_csv_path(params, config.base_seed)
        .with_context(|| format!("loading {}", params.display()))?;

    let t0 = Instant::now();
    let tables = match bs_sweep::sweep(&table, config) {
        Ok(tables) => tables,
        Err(e) => return Err(report(e)),
    };
    info!(runs = tables.metrics.len(), elapsed_s = t0.elapsed().as_secs_f64(), "sweep complete");

    if sqlite {
        write_sqlite(out_dir, &tables)?;
    } else {
        write_tables(CsvWriter::new(out_dir)?, &tables)?;
    }
    println!("{} runs written to {}", tables.metrics.len(), out_dir.display());
    Ok(())
}

fn run_one(params: &Path, run_id: RunId, out_dir: &Path, base_seed: u64) -> Result<()> {
    let table = SweepTable::from_csv_path(params, base_seed)
        .with_context(|| format!("loading {}", params.display()))?;
    let Some(row) = table.get(run_id) else {
        bail!("row index {} out of range: table has {} rows", run_id.0, table.len());
    };

    let result = bs_model::run(row).with_context(|| format!("{run_id} failed"))?;
    let dir = write_run_artifacts(out_dir, run_id, row, &result)?;
    info!(%run_id, dir = %dir.display(), "run written");
    Ok(())
}

fn run_collect(in_dir: &Path, out_dir: &Path, expected: Option<usize>) -> Result<()> {
    let tables = match collect_dir(in_dir, expected) {
        Ok(tables) => tables,
        Err(OutputError::Sweep(e)) => return Err(report(e)),
        Err(e) => return Err(e).with_context(|| format!("collecting {}", in_dir.display())),
    };
    write_tables(CsvWriter::new(out_dir)?, &tables)?;
    println!("{} runs collected into {}", tables.metrics.len(), out_dir.display());
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn write_tables<W: TableWriter>(mut writer: W, tables: &SweepTables) -> Result<()> {
    write_sweep(&mut writer, tables)?;
    Ok(())
}

#[cfg(feature = "sqlite")]
fn write_sqlite(out_dir: &Path, tables: &SweepTables) -> Result<()> {
    write_tables(bs_output::SqliteWriter::new(out_dir)?, tables)
}

#[cfg(not(feature = "sqlite"))]
fn write_sqlite(_out_dir: &Path, _tables: &SweepTables) -> Result<()> {
    bail!("--sqlite needs a build with the `sqlite` feature")
}

/// Print every failed or missing run, then hand back the error for `main`.
fn report(err: SweepError) -> anyhow::Error {
    match &err {
        SweepError::RunsFailed(failures) => {
            eprintln!("{} run(s) failed:", failures.len());
            for failure in failures {
                eprintln!("  {failure}");
            }
        }
        SweepError::IncompleteSweep { expected, missing, duplicated, unexpected } => {
            eprintln!("sweep of {expected} runs is incomplete:");
            let missing = missing.iter().map(|r| {
                if r.first == r.last {
                    r.first.0.to_string()
                } else {
                    format!("{}-{}", r.first.0, r.last.0)
                }
            });
            let duplicated = duplicated.iter().map(|id| id.0.to_string());
            let unexpected = unexpected.iter().map(|id| id.0.to_string());
            for (label, ids) in [
                ("missing", missing.collect::<Vec<_>>()),
                ("duplicated", duplicated.collect()),
                ("unexpected", unexpected.collect()),
            ] {
                if !ids.is_empty() {
                    eprintln!("  {label}: {}", ids.join(", "));
                }
            }
        }
        _ => {}
    }
    anyhow::Error::new(err).context("no tables written")
}
