//! Error types for kgof

use thiserror::Error;

/// kgof error type
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error (bad parameters, shape mismatch, invalid covariance)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Optional capability not provided by this object
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
