//! Error types for data parsing in govee-types.

use thiserror::Error;

/// Errors that can occur when parsing H5075 sensor payloads.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in govee-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A payload was shorter than the format requires.
    #[error("payload requires {expected} bytes, got {actual}")]
    InsufficientBytes { expected: usize, actual: usize },
}

/// Result type alias using govee-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
