//! Error types for govee-core.
//!
//! Failures fall into a few classes with different handling:
//!
//! - Transport failures (connect, subscribe, write) abort the current
//!   device attempt and are retried by the sync orchestrator up to its
//!   configured bound.
//! - Format failures ([`Error::Parse`], [`Error::InvalidTimeExpression`])
//!   are surfaced immediately and never retried.
//! - A completion-wait timeout inside a history session is *not* an error;
//!   the session returns the records collected so far.
//! - Cleanup failures (unsubscribe/disconnect) are swallowed by the session
//!   and logged at debug level.

use std::time::Duration;

use thiserror::Error;

use govee_types::ParseError;

/// Errors that can occur when communicating with H5075 devices.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// No Bluetooth adapter is available on this host.
    #[error("no Bluetooth adapter available")]
    NoAdapter,

    /// Device not found during scan or connection.
    #[error("device '{0}' not found")]
    DeviceNotFound(String),

    /// Connection could not be established or confirmed live.
    #[error("unable to connect to {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    /// Notification setup (characteristic lookup or subscribe) failed.
    #[error("setup failed for {address}: {reason}")]
    SetupFailed { address: String, reason: String },

    /// The history request write was rejected by the transport.
    #[error("history request failed for {address}: {reason}")]
    WriteFailed { address: String, reason: String },

    /// Operation timed out.
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    /// Malformed payload.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A past-time expression could not be parsed.
    #[error("invalid time expression '{0}': use hhh:mm or plain minutes")]
    InvalidTimeExpression(String),
}

impl Error {
    /// Create a connection failure for a specific address.
    pub fn connection_failed(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConnectionFailed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a setup failure for a specific address.
    pub fn setup_failed(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::SetupFailed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a write failure for a specific address.
    pub fn write_failed(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::WriteFailed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }
}

/// Result type alias using govee-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DeviceNotFound("a4:c1:38:aa:bb:cc".to_string());
        assert!(err.to_string().contains("a4:c1:38:aa:bb:cc"));

        let err = Error::connection_failed("a4:c1:38:aa:bb:cc", "unable to connect");
        assert!(err.to_string().contains("unable to connect"));

        let err = Error::timeout("connect", Duration::from_secs(20));
        assert!(err.to_string().contains("connect"));
        assert!(err.to_string().contains("20s"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse = ParseError::InsufficientBytes {
            expected: 4,
            actual: 2,
        };
        let err: Error = parse.into();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("4 bytes"));
    }

    #[test]
    fn test_invalid_time_expression_display() {
        let err = Error::InvalidTimeExpression("abc".to_string());
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("hhh:mm"));
    }
}
