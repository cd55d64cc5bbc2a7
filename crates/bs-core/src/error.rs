//! Parameter validation errors.
//!
//! `ParamError` is the "invalid parameters" condition: it is raised before any
//! simulation step runs and is always local to a single run.  Downstream
//! crates wrap it in their own error enums via `#[from]`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeValue { field: &'static str, value: i64 },

    #[error("{field} must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },
}

/// Shorthand result type for parameter checks.
pub type ParamResult<T> = Result<T, ParamError>;
