//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `sweep.db` file in the configured output directory with
//! two tables: `metrics` and `timeseries`.
//!
//! The database is built as `sweep.db.partial` and renamed over any earlier
//! `sweep.db` by [`finish`](TableWriter::finish), so a rerun replaces the old
//! results and an interrupted sweep never leaves a database that looks
//! complete.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::info;

use bs_sweep::{MetricsRow, TimeseriesRow};

use crate::writer::TableWriter;
use crate::{OutputError, OutputResult};

pub const DB_FILE: &str = "sweep.db";

/// Writes the aggregated sweep tables to an SQLite database.
pub struct SqliteWriter {
    /// `None` once finished.
    conn: Option<Connection>,
    tmp:  PathBuf,
    dest: PathBuf,
}

impl SqliteWriter {
    /// Create a fresh `sweep.db.partial` in `dir` with an empty schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;
        let dest = dir.join(DB_FILE);
        let tmp = dir.join(format!("{DB_FILE}.partial"));
        // Leftovers of an aborted run.
        for stale in [tmp.clone(), dir.join(format!("{DB_FILE}.partial-journal"))] {
            if stale.exists() {
                fs::remove_file(&stale)?;
            }
        }
        let conn = Connection::open(&tmp)?;

        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             CREATE TABLE metrics (
                 run_id          INTEGER PRIMARY KEY,
                 init_mailly     INTEGER NOT NULL,
                 init_moulin     INTEGER NOT NULL,
                 steps           INTEGER NOT NULL,
                 p1              REAL    NOT NULL,
                 p2              REAL    NOT NULL,
                 seed            INTEGER NOT NULL,
                 unmet_mailly    INTEGER NOT NULL,
                 unmet_moulin    INTEGER NOT NULL,
                 final_mailly    INTEGER NOT NULL,
                 final_moulin    INTEGER NOT NULL,
                 final_imbalance INTEGER NOT NULL,
                 total_bikes     INTEGER NOT NULL
             );
             CREATE TABLE timeseries (
                 run_id  INTEGER NOT NULL,
                 time    INTEGER NOT NULL,
                 station TEXT    NOT NULL,
                 bikes   INTEGER NOT NULL,
                 PRIMARY KEY (run_id, time, station)
             );",
        )?;

        Ok(Self { conn: Some(conn), tmp, dest })
    }
}

impl TableWriter for SqliteWriter {
    fn write_metrics(&mut self, rows: &[MetricsRow]) -> OutputResult<()> {
        let conn = self.conn.as_ref().ok_or(OutputError::Finished)?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO metrics \
                 (run_id, init_mailly, init_moulin, steps, p1, p2, seed, \
                  unmet_mailly, unmet_moulin, final_mailly, final_moulin, final_imbalance, total_bikes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for row in rows {
                // SQLite INTEGER is i64; counts derived from i64 inputs fit
                // except a total of two near-max counts, which saturates.
                stmt.execute(rusqlite::params![
                    row.run_id.0,
                    row.init_mailly,
                    row.init_moulin,
                    row.steps,
                    row.p1,
                    row.p2,
                    row.seed,
                    to_sql_int(row.unmet_mailly),
                    to_sql_int(row.unmet_moulin),
                    to_sql_int(row.final_mailly),
                    to_sql_int(row.final_moulin),
                    row.final_imbalance,
                    to_sql_int(row.total_bikes),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_timeseries(&mut self, rows: &[TimeseriesRow]) -> OutputResult<()> {
        let conn = self.conn.as_ref().ok_or(OutputError::Finished)?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO timeseries (run_id, time, station, bikes) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.run_id.0,
                    to_sql_int(row.time),
                    row.station.as_str(),
                    to_sql_int(row.bikes),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| e)?;
        fs::rename(&self.tmp, &self.dest)?;
        info!(path = %self.dest.display(), "wrote database");
        Ok(())
    }
}

fn to_sql_int(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
