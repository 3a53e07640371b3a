//! Retry logic for per-device BLE attempts.
//!
//! H5075 radios are flaky: connects fail, subscriptions drop, writes get
//! rejected. Transport-level failures are worth retrying after a short
//! settle delay; format errors are not, since re-running the same decode
//! cannot change the outcome.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Configuration for per-device retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 means a single attempt).
    pub max_retries: u32,
    /// Fixed pause between attempts, letting the device's radio settle.
    pub settle_delay: Duration,
    /// Whether to add up to 25% jitter to the settle delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            settle_delay: Duration::from_millis(500),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Create a retry config with the given retry bound.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// No retries.
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Set the settle delay between attempts.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    fn delay(&self) -> Duration {
        if self.jitter {
            let factor = 1.0 + rand::rng().random::<f64>() * 0.25;
            self.settle_delay.mul_f64(factor)
        } else {
            self.settle_delay
        }
    }
}

/// Execute an async operation with bounded retries.
///
/// Runs the operation up to `max_retries + 1` times, pausing between
/// attempts. Non-retryable errors (format errors) abort immediately;
/// otherwise the last error is returned once the bound is exhausted.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("{operation_name} succeeded after {attempt} retries");
                }
                return Ok(result);
            }
            Err(e) => {
                if !is_retryable(&e) {
                    return Err(e);
                }

                if attempt < config.max_retries {
                    let delay = config.delay();
                    warn!(
                        "{operation_name} failed (attempt {}/{}): {e}; retrying in {delay:?}",
                        attempt + 1,
                        config.max_retries + 1,
                    );
                    sleep(delay).await;
                }

                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        Error::connection_failed("unknown", "operation failed with no error")
    }))
}

/// Check if an error is worth retrying.
pub fn is_retryable(error: &Error) -> bool {
    match error {
        // Transport failures are often transient
        Error::Bluetooth(_)
        | Error::DeviceNotFound(_)
        | Error::ConnectionFailed { .. }
        | Error::SetupFailed { .. }
        | Error::WriteFailed { .. }
        | Error::Timeout { .. } => true,
        // Format errors cannot succeed on a second pass
        Error::Parse(_) | Error::InvalidTimeExpression(_) => false,
        // A missing adapter will not appear by retrying
        Error::NoAdapter => false,
    }
}
