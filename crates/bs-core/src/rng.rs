//! Deterministic per-run random source.
//!
//! # Determinism strategy
//!
//! Every run owns one `RunRng`, seeded only from its parameter row's `seed`.
//! There is no process-wide generator, so a run's draws never depend on which
//! worker executed it or what ran before it on that worker.
//!
//! The stream is `ChaCha8Rng` rather than `SmallRng`: ChaCha output is
//! specified and portable, so a given seed yields the same draw sequence on
//! every platform and across `rand` releases.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ── DrawSource ────────────────────────────────────────────────────────────────

/// Anything that can hand out uniform draws in `[0, 1)`.
///
/// The station model takes `&mut impl DrawSource` so tests can script the
/// exact draws a step sees.
pub trait DrawSource {
    /// One uniform draw in `[0, 1)`.  Each call advances the stream by one.
    fn draw(&mut self) -> f64;
}

// ── RunRng ────────────────────────────────────────────────────────────────────

/// The random source of a single run.
///
/// Not `Clone`: two copies of one stream would silently replay draws.
pub struct RunRng(ChaCha8Rng);

impl RunRng {
    pub fn new(seed: u64) -> Self {
        RunRng(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl DrawSource for RunRng {
    #[inline]
    fn draw(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }
}

