//! Core BLE library for Govee H5075 hygrometers.
//!
//! This crate covers the device-facing half of the toolkit:
//!
//! - **Passive readings**: decode temperature/humidity/battery from
//!   advertisement manufacturer data, no connection required
//! - **Historical data**: retrieve up to 20 days of minute-resolution
//!   samples from on-device storage over a GATT notification exchange
//! - **Discovery**: resolve target devices by explicit address or by
//!   name-filtered scan
//! - **Sync orchestration**: visit many devices sequentially with bounded
//!   retries, aggregating per-device failures instead of aborting
//!
//! # Quick start
//!
//! ```no_run
//! use govee_core::{HistoryOptions, RetryConfig, ScanOptions, scan, sync};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), govee_core::Error> {
//!     let adapter = scan::get_adapter().await?;
//!
//!     // Read current values straight from advertisements
//!     let readings = scan::scan_readings(&adapter, &ScanOptions::default()).await?;
//!     for reading in &readings {
//!         println!("{}: {:.1}°C", reading.name, reading.temperature_c);
//!     }
//!
//!     // Pull stored history from every H5075 in range
//!     let outcome = sync::sync_history(
//!         &adapter,
//!         &ScanOptions::default(),
//!         &HistoryOptions::default(),
//!         &RetryConfig::default(),
//!     )
//!     .await?;
//!     println!("{} record(s), {} failure(s)", outcome.points.len(), outcome.failures.len());
//!
//!     Ok(())
//! }
//! ```

pub mod advertisement;
pub mod codec;
pub mod commands;
pub mod error;
pub mod history;
pub mod retry;
pub mod scan;
pub mod sync;

pub use error::{Error, Result};
pub use history::{HistoryOptions, parse_past_minutes, read_history};
pub use retry::{RetryConfig, is_retryable, with_retry};
pub use scan::{
    ScanOptions, discover_targets, get_adapter, normalize_address, scan_readings, scan_snapshots,
};
pub use sync::{SyncOutcome, collect_targets, sync_history};

// Re-export the shared data types for downstream convenience
pub use govee_types::uuid as uuids;
pub use govee_types::{AdvertisementSnapshot, HistoryPoint, ParseError, Reading};
