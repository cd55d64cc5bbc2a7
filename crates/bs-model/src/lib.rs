//! `bs-model`: the Mailly/Moulin station-pair model and its run driver.
//!
//! # One step
//!
//! ```text
//! draw ① < p1 ?  Mailly > 0 ? move Mailly → Moulin : unmet_mailly += 1
//! draw ② < p2 ?  Moulin > 0 ? move Moulin → Mailly : unmet_moulin += 1
//! ```
//!
//! Both draws are taken every step, in that order, whatever the outcome of
//! the first.  The draw sequence for a `(seed, steps)` pair is therefore fixed.
//!
//! # One run
//!
//! [`run`] validates a [`bs_core::RunParameters`], seeds a fresh
//! [`bs_core::RunRng`], applies [`step`] `steps` times and returns the full
//! history plus final metrics.
//!
//! ```rust
//! use bs_core::RunParameters;
//!
//! let result = bs_model::run(&RunParameters::new(5, 0, 5, 1.0, 0.0, 0)).unwrap();
//! assert_eq!(result.metrics.final_mailly, 0);
//! assert_eq!(result.metrics.final_moulin, 5);
//! ```

pub mod error;
pub mod run;
pub mod state;
pub mod step;


pub use error::{ModelError, ModelResult};
pub use run::{RunMetrics, RunResult, TimeseriesPoint, run, run_with};
pub use state::{MetricDeltas, SystemState};
pub use step::step;
