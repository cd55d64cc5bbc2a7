//! `bs-sweep`: run many independent simulations and merge their results.
//!
//! # Pipeline
//!
//! ```text
//! params.csv ──► SweepTable ──► distribute ──► Vec<RunRecord> ──► aggregate ──► SweepTables
//!                (RunId = row)   (any medium,     (unordered)       (sorted by RunId,
//!                                 exactly once)                      completeness checked)
//! ```
//!
//! # Execution media
//!
//! | `ExecutionMode` | Work claiming                                          |
//! |-----------------|--------------------------------------------------------|
//! | `Sequential`    | one thread, row order                                  |
//! | `Striped`       | scoped threads; worker `k` takes rows `i % n == k`     |
//! | `DynamicPull`   | scoped threads; shared atomic "next row" counter       |
//! | `Pool`          | fixed-size Rayon pool, work-stealing queue             |
//! | `Group`         | [`ProcessGroup`] ranks: broadcast table, stripe, gather |
//!
//! Every run owns its RNG, so the medium and worker count never change a
//! run's value; [`aggregate`] sorts by `RunId`, so they never change the
//! output order either.

pub mod aggregate;
pub mod config;
pub mod distribute;
pub mod error;
pub mod group;
pub mod record;
pub mod table;


pub use aggregate::{MetricsRow, RunIdRange, SweepTables, TimeseriesRow, aggregate};
pub use config::{ExecutionMode, SweepConfig, Workers, WorkersParseError};
pub use distribute::{distribute, distribute_group, distribute_with, sweep};
pub use error::{SweepError, SweepResult, TableError};
pub use group::{GroupError, GroupResult, LocalGroup, LocalMember, ProcessGroup};
pub use record::{RunError, RunErrorKind, RunRecord};
pub use table::SweepTable;
