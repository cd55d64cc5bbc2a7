//! Tests for the table writers, per-run artifacts, and directory collection.

use bs_core::{RunId, RunParameters};
use bs_model::run;
use bs_sweep::{SweepConfig, SweepTable, SweepTables, sweep};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn params(i: i64) -> RunParameters {
    RunParameters::new(3 + i, 5, 12 + i, 0.35, 0.2 + 0.1 * i as f64, 40 + i)
}

fn sample_tables(n: i64) -> SweepTables {
    let table = SweepTable::new((0..n).map(params).collect()).unwrap();
    sweep(&table, &SweepConfig::new()).unwrap()
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path).unwrap().lines().map(str::to_owned).collect()
}

// ── CSV writer ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;
    use crate::csv::{METRICS_FILE, METRICS_HEADER, TIMESERIES_FILE, TIMESERIES_HEADER};
    use crate::{CsvWriter, OutputError, TableWriter, write_sweep};

    #[test]
    fn writes_headers_and_one_metrics_row_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let tables = sample_tables(3);
        let mut writer = CsvWriter::new(dir.path()).unwrap();
        write_sweep(&mut writer, &tables).unwrap();

        let metrics = read_lines(&dir.path().join(METRICS_FILE));
        assert_eq!(metrics[0], METRICS_HEADER.join(","));
        assert_eq!(metrics.len(), 1 + 3);
        assert!(metrics[1].starts_with("0,3,5,12,0.35,0.2,40,"));

        let timeseries = read_lines(&dir.path().join(TIMESERIES_FILE));
        assert_eq!(timeseries[0], TIMESERIES_HEADER.join(","));
        assert_eq!(timeseries.len(), 1 + tables.timeseries.len());
        assert_eq!(timeseries[1], "0,0,mailly,3");
        assert_eq!(timeseries[2], "0,0,moulin,5");
    }

    #[test]
    fn tables_stay_partial_until_finish() {
        let dir = tempfile::tempdir().unwrap();
        let tables = sample_tables(2);
        let mut writer = CsvWriter::new(dir.path()).unwrap();
        writer.write_metrics(&tables.metrics).unwrap();
        writer.write_timeseries(&tables.timeseries).unwrap();

        assert!(!dir.path().join(METRICS_FILE).exists());
        assert!(dir.path().join(format!("{METRICS_FILE}.partial")).exists());

        writer.finish().unwrap();
        assert!(dir.path().join(METRICS_FILE).exists());
        assert!(dir.path().join(TIMESERIES_FILE).exists());
        assert!(!dir.path().join(format!("{METRICS_FILE}.partial")).exists());
        assert!(!dir.path().join(format!("{TIMESERIES_FILE}.partial")).exists());
    }

    #[test]
    fn empty_tables_still_get_headers() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CsvWriter::new(dir.path()).unwrap();
        write_sweep(&mut writer, &SweepTables::default()).unwrap();
        assert_eq!(read_lines(&dir.path().join(METRICS_FILE)), [METRICS_HEADER.join(",")]);
    }

    #[test]
    fn finish_is_idempotent_and_closes_the_writer() {
        let dir = tempfile::tempdir().unwrap();
        let tables = sample_tables(1);
        let mut writer = CsvWriter::new(dir.path()).unwrap();
        write_sweep(&mut writer, &tables).unwrap();
        writer.finish().unwrap();

        let err = writer.write_metrics(&tables.metrics).unwrap_err();
        assert!(matches!(err, OutputError::Finished));
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut writer = CsvWriter::new(&nested).unwrap();
        writer.finish().unwrap();
        assert!(nested.join(METRICS_FILE).exists());
    }
}

// ── Single-run output and per-run artifacts ───────────────────────────────────

#[cfg(test)]
mod artifact_tests {
    use std::fs;

    use super::*;
    use crate::artifacts::{RUN_METADATA_FILE, RUN_METRICS_FILE, RUN_TIMESERIES_FILE};
    use crate::{OutputError, RunMetadata, read_run_artifacts, write_run_artifacts, write_single_run};

    #[test]
    fn single_run_writes_timeseries_and_metrics_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("run.csv");
        let result = run(&params(0)).unwrap();

        let tsv_path = write_single_run(&csv_path, &result).unwrap();
        assert_eq!(tsv_path, dir.path().join("run.metrics.tsv"));

        let lines = read_lines(&csv_path);
        assert_eq!(lines[0], "time,mailly,moulin");
        assert_eq!(lines[1], "0,3,5");
        assert_eq!(lines.len(), 1 + 13);

        let tsv = read_lines(&tsv_path);
        assert_eq!(tsv.len(), 6);
        assert_eq!(tsv[5], "total_bikes\t8");
        let imbalance = result.metrics.final_imbalance;
        assert_eq!(tsv[4], format!("final_imbalance\t{imbalance}"));
    }

    #[test]
    fn run_directory_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let p = params(2);
        let result = run(&p).unwrap();

        let run_dir = write_run_artifacts(dir.path(), RunId(7), &p, &result).unwrap();
        assert_eq!(run_dir, dir.path().join("7"));
        for file in [RUN_TIMESERIES_FILE, RUN_METRICS_FILE, RUN_METADATA_FILE] {
            assert!(run_dir.join(file).exists(), "{file} missing");
        }

        let record = read_run_artifacts(&run_dir).unwrap();
        assert_eq!(record.run_id, RunId(7));
        assert_eq!(record.params, p);
        assert_eq!(record.outcome, Ok(result));
    }

    #[test]
    fn metadata_records_the_resolved_seed() {
        let dir = tempfile::tempdir().unwrap();
        let p = params(1);
        let run_dir = write_run_artifacts(dir.path(), RunId(0), &p, &run(&p).unwrap()).unwrap();

        let text = fs::read_to_string(run_dir.join(RUN_METADATA_FILE)).unwrap();
        let meta: RunMetadata = serde_json::from_str(&text).unwrap();
        assert_eq!(meta.params.seed, 41);
    }

    #[test]
    fn truncated_timeseries_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let p = params(0);
        let run_dir = write_run_artifacts(dir.path(), RunId(0), &p, &run(&p).unwrap()).unwrap();

        let ts_path = run_dir.join(RUN_TIMESERIES_FILE);
        let mut lines = read_lines(&ts_path);
        lines.pop();
        fs::write(&ts_path, lines.join("\n") + "\n").unwrap();

        let err = read_run_artifacts(&run_dir).unwrap_err();
        assert!(matches!(err, OutputError::MalformedArtifact { .. }), "{err}");
    }

    #[test]
    fn missing_metadata_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = params(0);
        let run_dir = write_run_artifacts(dir.path(), RunId(0), &p, &run(&p).unwrap()).unwrap();
        fs::remove_file(run_dir.join(RUN_METADATA_FILE)).unwrap();

        assert!(matches!(read_run_artifacts(&run_dir), Err(OutputError::Io(_))));
    }
}

// ── collect_dir ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod collect_tests {
    use std::fs;

    use bs_sweep::{RunIdRange, SweepError};

    use super::*;
    use crate::artifacts::RUN_METRICS_FILE;
    use crate::{OutputError, collect_dir, write_run_artifacts};

    fn write_runs(out: &std::path::Path, ids: &[u32]) {
        for &id in ids {
            let p = params(id as i64);
            write_run_artifacts(out, RunId(id), &p, &run(&p).unwrap()).unwrap();
        }
    }

    #[test]
    fn collected_tables_match_in_process_sweep() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), &[2, 0, 1, 3]);

        let collected = collect_dir(dir.path(), Some(4)).unwrap();
        assert_eq!(collected, sample_tables(4));
    }

    #[test]
    fn expected_defaults_to_highest_run_plus_one() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), &[0, 1, 2]);
        assert_eq!(collect_dir(dir.path(), None).unwrap().metrics.len(), 3);
    }

    #[test]
    fn ignores_non_numeric_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), &[0, 1]);
        fs::create_dir(dir.path().join("logs")).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(collect_dir(dir.path(), Some(2)).unwrap().metrics.len(), 2);
    }

    #[test]
    fn missing_run_directory_reports_incomplete_sweep() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), &[0, 2]);

        match collect_dir(dir.path(), Some(3)) {
            Err(OutputError::Sweep(SweepError::IncompleteSweep { missing, .. })) => {
                assert_eq!(missing, [RunIdRange::single(RunId(1))]);
            }
            other => panic!("expected IncompleteSweep, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_run_directory_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), &[0, 1, 2]);
        fs::remove_file(dir.path().join("1").join(RUN_METRICS_FILE)).unwrap();

        match collect_dir(dir.path(), None) {
            Err(OutputError::Sweep(SweepError::IncompleteSweep { missing, .. })) => {
                assert_eq!(missing, [RunIdRange::single(RunId(1))]);
            }
            other => panic!("expected IncompleteSweep, got {other:?}"),
        }
    }

    #[test]
    fn stray_high_numbered_directory_reports_one_gap() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), &[0, 1]);
        fs::create_dir(dir.path().join("4000000000")).unwrap();

        match collect_dir(dir.path(), None) {
            Err(OutputError::Sweep(SweepError::IncompleteSweep { expected, missing, .. })) => {
                assert_eq!(expected, 4_000_000_001);
                assert_eq!(missing, [RunIdRange::between(2, 4_000_000_000)]);
            }
            other => panic!("expected IncompleteSweep, got {other:?}"),
        }
    }

    #[test]
    fn misplaced_run_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), &[0, 1]);
        fs::rename(dir.path().join("1"), dir.path().join("2")).unwrap();

        match collect_dir(dir.path(), Some(2)) {
            Err(OutputError::Sweep(SweepError::IncompleteSweep { missing, .. })) => {
                assert_eq!(missing, [RunIdRange::single(RunId(1))]);
            }
            other => panic!("expected IncompleteSweep, got {other:?}"),
        }
    }
}

// ── SQLite writer ─────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use rusqlite::Connection;

    use super::*;
    use crate::sqlite::DB_FILE;
    use crate::{OutputError, SqliteWriter, TableWriter, write_sweep};

    fn count(path: &std::path::Path, table: &str) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let tables = sample_tables(3);
        let mut writer = SqliteWriter::new(dir.path()).unwrap();
        write_sweep(&mut writer, &tables).unwrap();
        writer.finish().unwrap();

        let conn = Connection::open(dir.path().join("sweep.db")).unwrap();
        let runs: i64 = conn.query_row("SELECT COUNT(*) FROM metrics", [], |r| r.get(0)).unwrap();
        assert_eq!(runs, 3);
        let points: i64 = conn.query_row("SELECT COUNT(*) FROM timeseries", [], |r| r.get(0)).unwrap();
        assert_eq!(points as usize, tables.timeseries.len());
        let station: String = conn
            .query_row(
                "SELECT station FROM timeseries WHERE run_id = 0 AND time = 0 ORDER BY station LIMIT 1",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(station, "mailly");
    }

    #[test]
    fn rerun_replaces_earlier_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = SqliteWriter::new(dir.path()).unwrap();
        write_sweep(&mut first, &sample_tables(3)).unwrap();

        let second_tables = sample_tables(2);
        let mut second = SqliteWriter::new(dir.path()).unwrap();
        write_sweep(&mut second, &second_tables).unwrap();

        let db = dir.path().join(DB_FILE);
        assert_eq!(count(&db, "metrics"), 2);
        assert_eq!(count(&db, "timeseries") as usize, second_tables.timeseries.len());
    }

    #[test]
    fn database_stays_partial_until_finish() {
        let dir = tempfile::tempdir().unwrap();
        let tables = sample_tables(2);
        let mut writer = SqliteWriter::new(dir.path()).unwrap();
        writer.write_metrics(&tables.metrics).unwrap();

        assert!(!dir.path().join(DB_FILE).exists());
        assert!(dir.path().join(format!("{DB_FILE}.partial")).exists());

        writer.write_timeseries(&tables.timeseries).unwrap();
        writer.finish().unwrap();
        assert!(dir.path().join(DB_FILE).exists());
        assert!(!dir.path().join(format!("{DB_FILE}.partial")).exists());
    }

    #[test]
    fn abandoned_writer_leaves_earlier_results_intact() {
        let dir = tempfile::tempdir().unwrap();
        let mut done = SqliteWriter::new(dir.path()).unwrap();
        write_sweep(&mut done, &sample_tables(3)).unwrap();

        let mut abandoned = SqliteWriter::new(dir.path()).unwrap();
        abandoned.write_metrics(&sample_tables(1).metrics).unwrap();
        drop(abandoned);

        assert_eq!(count(&dir.path().join(DB_FILE), "metrics"), 3);
    }

    #[test]
    fn finish_is_idempotent_and_closes_the_writer() {
        let dir = tempfile::tempdir().unwrap();
        let tables = sample_tables(1);
        let mut writer = SqliteWriter::new(dir.path()).unwrap();
        write_sweep(&mut writer, &tables).unwrap();
        writer.finish().unwrap();

        let err = writer.write_metrics(&tables.metrics).unwrap_err();
        assert!(matches!(err, OutputError::Finished));
    }
}
