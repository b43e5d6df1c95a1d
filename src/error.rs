use thiserror::Error;

/// Failures reported by the ordered-map contract.
///
/// All of these are recoverable: a failed operation leaves the map exactly as
/// it was before the call.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No stored key satisfies a predecessor/successor query.
    #[error("no matching key")]
    NotFound,

    /// A fixed-width structure was given a key of the wrong byte length.
    #[error("expected a key of {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Bulk build input was not strictly sorted or contained duplicates.
    #[error("input must be strictly sorted with unique keys")]
    InvalidInput,

    /// A select index at or beyond the population count.
    #[error("select index {index} out of range ({available} bits available)")]
    OutOfRange { index: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
