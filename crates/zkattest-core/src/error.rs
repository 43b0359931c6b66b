//! # Error Types
//!
//! Errors raised by the foundational types. Higher crates wrap these in
//! their own `thiserror` enums via `#[from]`.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Fractional numbers have no single canonical integer form. Schema
    /// bounds and literals must be whole numbers.
    #[error("fractional numbers are not permitted in canonical documents: {0}")]
    FractionalNumber(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error parsing a `sha256:<hex>` digest string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DigestParseError {
    /// Missing or unsupported `<algorithm>:` prefix.
    #[error("unsupported digest algorithm in {0:?}")]
    UnsupportedAlgorithm(String),

    /// The hex part is not 64 lowercase-or-uppercase hex characters.
    #[error("invalid digest hex {0:?}")]
    InvalidHex(String),
}

/// Error constructing or manipulating a [`Timestamp`](crate::Timestamp).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemporalError {
    /// The string is not valid RFC 3339.
    #[error("invalid RFC 3339 timestamp {0:?}")]
    InvalidFormat(String),

    /// Unix seconds outside chrono's representable range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(i64),
}
