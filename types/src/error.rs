//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for domain primitives.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RatingsError {
    #[error("rating must be between 1 and 5 stars, got {0}")]
    InvalidRating(u8),

    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("invalid service id: {0}")]
    InvalidServiceId(String),
}
