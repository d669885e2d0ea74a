//! # Core Error Types
//!
//! Structured errors for the parsing constructors in `sigsale-core`.
//! Uses `thiserror` for ergonomic error definitions with diagnostic context.

use thiserror::Error;

/// Errors from constructing core protocol primitives.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Hex string contains non-hexadecimal characters.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Decoded byte length does not match the fixed width of the type.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
