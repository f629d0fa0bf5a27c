//! Store-scoped error type, converting into `souq_core::Error` at the
//! crate boundary (spec §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<StoreError> for souq_core::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(e) => souq_core::Error::StoreUnavailable(e.to_string()),
            StoreError::DimensionMismatch { .. } => souq_core::Error::Config(err.to_string()),
            StoreError::Invariant(msg) => souq_core::Error::InternalInvariantViolation(msg),
        }
    }
}
