//! Error types for the hybrid index.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when setting up an index.
///
/// Lookups report absence through `Option`, never through an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// `key_len` was zero.
    #[error("Key length must be at least one byte")]
    ZeroKeyLength,

    /// `merge_ratio` was zero.
    #[error("Merge ratio must be at least 1")]
    ZeroMergeRatio,

    /// `dense_threshold` was above 256.
    #[error("Dense threshold {0} exceeds the 256-way fan-out")]
    DenseThresholdTooLarge(usize),
}
