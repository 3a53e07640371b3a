//! Multi-device history sync orchestration.
//!
//! Visits each target address in sequence — the local adapter is a shared,
//! exclusively-owned resource, so only one GATT session runs at a time —
//! retries failed attempts with a settle delay, and aggregates results
//! without letting one device's failure abort the batch.

use serde::Serialize;
use tracing::{info, warn};

use btleplug::platform::Adapter;

use govee_types::HistoryPoint;

use crate::error::Result;
use crate::history::{HistoryOptions, read_history};
use crate::retry::{RetryConfig, with_retry};
use crate::scan::{ScanOptions, discover_targets};

/// Aggregated result of a sync run across all targets.
///
/// A device that exhausted its retries contributes one
/// `"<address>: <message>"` entry to `failures`; a device that completed
/// (even with zero records) contributes its points.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncOutcome {
    /// All history points from devices that completed an attempt.
    pub points: Vec<HistoryPoint>,
    /// One entry per device whose every attempt failed.
    pub failures: Vec<String>,
}

impl SyncOutcome {
    /// True when no device produced a point and nothing failed — an empty
    /// but clean run (typically: no targets in range).
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.failures.is_empty()
    }
}

/// Run one attempt-per-target loop over an arbitrary attempt function.
///
/// The per-address attempt is injected so the retry/aggregation behavior is
/// independent of the transport: the first attempt that completes without
/// an error is accepted as-is (even when it returned nothing), and a target
/// whose attempts all fail is recorded without affecting the others.
pub async fn collect_targets<F, Fut>(
    targets: &[String],
    retry: &RetryConfig,
    attempt: F,
) -> SyncOutcome
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<HistoryPoint>>>,
{
    let mut outcome = SyncOutcome::default();

    for address in targets {
        match with_retry(retry, address, || attempt(address.clone())).await {
            Ok(points) => {
                info!("{address}: collected {} record(s)", points.len());
                outcome.points.extend(points);
            }
            Err(e) => {
                warn!("{address}: giving up: {e}");
                outcome.failures.push(format!("{address}: {e}"));
            }
        }
    }

    outcome
}

/// Discover targets and retrieve history from each of them.
///
/// Discovery errors (no adapter, scan failure) are the only errors this
/// returns; per-device failures end up in the outcome's failure list.
pub async fn sync_history(
    adapter: &Adapter,
    scan: &ScanOptions,
    history: &HistoryOptions,
    retry: &RetryConfig,
) -> Result<SyncOutcome> {
    let targets = discover_targets(adapter, scan).await?;

    if targets.is_empty() {
        info!("No matching devices discovered");
        return Ok(SyncOutcome::default());
    }

    info!("Syncing history from {} device(s)", targets.len());
    Ok(collect_targets(&targets, retry, |address| async move {
        read_history(adapter, &address, history).await
    })
    .await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use time::OffsetDateTime;

    fn point(address: &str, minutes: i64) -> HistoryPoint {
        HistoryPoint {
            address: address.to_string(),
            name: "H5075".to_string(),
            measured_at: OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(minutes),
            temperature_c: 21.0,
            humidity_pct: 40.0,
        }
    }

    fn quick_retry(max_retries: u32) -> RetryConfig {
        RetryConfig::new(max_retries).settle_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_failures_do_not_affect_other_targets() {
        let targets: Vec<String> = ["aa:01", "aa:02", "aa:03", "aa:04"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let outcome = collect_targets(&targets, &quick_retry(1), |address| async move {
            match address.as_str() {
                "aa:02" | "aa:04" => Err(Error::connection_failed(address, "out of range")),
                _ => Ok(vec![point(&address, 1), point(&address, 2)]),
            }
        })
        .await;

        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.failures[0].starts_with("aa:02: "));
        assert!(outcome.failures[1].starts_with("aa:04: "));

        assert_eq!(outcome.points.len(), 4);
        assert!(
            outcome
                .points
                .iter()
                .all(|p| p.address == "aa:01" || p.address == "aa:03")
        );
    }

    #[tokio::test]
    async fn test_empty_attempt_is_accepted_without_retry() {
        let attempts = Mutex::new(0u32);
        let targets = vec!["aa:01".to_string()];

        let outcome = collect_targets(&targets, &quick_retry(3), |_| {
            *attempts.lock().unwrap() += 1;
            async { Ok(Vec::new()) }
        })
        .await;

        assert!(outcome.is_empty());
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_each_target_retries_independently() {
        let attempts: Mutex<HashMap<String, u32>> = Mutex::new(HashMap::new());
        let targets = vec!["aa:01".to_string(), "aa:02".to_string()];

        let outcome = collect_targets(&targets, &quick_retry(2), |address| {
            *attempts.lock().unwrap().entry(address.clone()).or_default() += 1;
            async move { Err(Error::connection_failed(address, "busy")) }
        })
        .await;

        assert_eq!(outcome.failures.len(), 2);
        let attempts = attempts.lock().unwrap();
        assert_eq!(attempts["aa:01"], 3);
        assert_eq!(attempts["aa:02"], 3);
    }

    #[tokio::test]
    async fn test_recovery_on_retry() {
        let attempts = Mutex::new(0u32);
        let targets = vec!["aa:01".to_string()];

        let outcome = collect_targets(&targets, &quick_retry(2), |address| {
            let attempt = {
                let mut guard = attempts.lock().unwrap();
                *guard += 1;
                *guard
            };
            async move {
                if attempt < 2 {
                    Err(Error::connection_failed(address, "busy"))
                } else {
                    Ok(vec![point(&address, 5)])
                }
            }
        })
        .await;

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.points.len(), 1);
        assert_eq!(*attempts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_outcome_serializes_for_reporting() {
        let outcome = SyncOutcome {
            points: vec![point("aa:01", 1)],
            failures: vec!["aa:02: unable to connect".to_string()],
        };

        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("aa:02: unable to connect"));
        assert!(json.contains("\"temperature_c\":21.0"));
    }
}
