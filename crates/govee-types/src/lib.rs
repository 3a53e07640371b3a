//! Platform-agnostic types for Govee H5075 hygrometer data.
//!
//! This crate provides the shared data types used by the BLE layer
//! (`govee-core`) and the persistence layer (`govee-store`):
//!
//! - Sensor reading and history structures
//! - Device alias and sync-job state
//! - BLE UUID and manufacturer-id constants
//! - Error types for payload parsing

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use types::{AdvertisementSnapshot, DeviceAlias, HistoryPoint, Reading, SyncStatus};
pub use uuid as uuids;
