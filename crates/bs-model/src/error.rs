use bs_core::ParamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParamError),

    #[error("cannot allocate a timeseries of {steps} steps")]
    Allocation { steps: u64 },
}

pub type ModelResult<T> = Result<T, ModelError>;
