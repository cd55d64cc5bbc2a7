//! `bs-core`: foundational types for the `rust_bikeshare` simulator.
//!
//! This crate is a dependency of every other `bs-*` crate.  It has no `bs-*`
//! dependencies and only a handful of external ones (`rand`, `rand_chacha`,
//! `thiserror`, `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `RunId`, `Station`                                    |
//! | [`params`]      | `RunParameters` (raw input), `ValidParameters`        |
//! | [`rng`]         | `DrawSource` trait, `RunRng` (per-run ChaCha8 stream) |
//! | [`error`]       | `ParamError`, `ParamResult`                           |

pub mod error;
pub mod ids;
pub mod params;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{ParamError, ParamResult};
pub use ids::{RunId, Station};
pub use params::{RunParameters, ValidParameters};
pub use rng::{DrawSource, RunRng};
