//! Core types for Govee H5075 sensor data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use time::OffsetDateTime;

/// A single temperature/humidity observation decoded from a BLE
/// advertisement.
///
/// Produced fresh per advertisement; the address is the device MAC as
/// reported by the platform.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Device address (MAC on Linux/Windows, CoreBluetooth UUID on macOS).
    pub address: String,
    /// Advertised local name, `"H5075"` when the device did not advertise one.
    pub name: String,
    /// Temperature in degrees Celsius, tenths resolution.
    pub temperature_c: f64,
    /// Relative humidity percentage, tenths resolution.
    pub humidity_pct: f64,
    /// Battery level percentage (0-100).
    pub battery_pct: u8,
    /// Sensor error flag from the payload.
    pub error: bool,
    /// RSSI in dBm at observation time, if the platform reported one.
    pub rssi: Option<i16>,
}

/// A [`Reading`] together with the raw advertisement it was decoded from.
///
/// The persistence key for snapshots is
/// `(address, manufacturer_id, payload_hex)`: identical raw payloads from
/// the same device are the same snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdvertisementSnapshot {
    pub address: String,
    pub name: String,
    /// Manufacturer id the payload arrived under.
    pub manufacturer_id: u16,
    /// Lowercase hex encoding of the full 6-byte manufacturer payload.
    pub payload_hex: String,
    /// Advertised service UUIDs, in advertisement order.
    pub service_uuids: Vec<String>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub battery_pct: u8,
    pub error: bool,
    pub rssi: Option<i16>,
}

/// One historical sample retrieved from on-device storage.
///
/// History frames carry only temperature and humidity; battery and error
/// state are not recorded by the device. The persistence key is
/// `(address, measured_at)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryPoint {
    pub address: String,
    pub name: String,
    /// Absolute sample time, reconstructed from the device's minutes-back
    /// encoding against the moment the history request was issued.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub measured_at: OffsetDateTime,
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// A stored device alias row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceAlias {
    /// Normalized lowercase device address, unique per row.
    pub address: String,
    /// User-assigned label, if any.
    pub alias: Option<String>,
    /// Last advertised name observed for this address.
    pub detected_name: String,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub updated_at: OffsetDateTime,
}

impl DeviceAlias {
    /// Resolve the display name: alias, then detected name, then address.
    pub fn display_name(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias,
            _ if !self.detected_name.is_empty() => &self.detected_name,
            _ => &self.address,
        }
    }
}

/// Status of a named sync job.
///
/// Invariant maintained by the store: `Success` implies a recorded
/// last-success time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum SyncStatus {
    /// The job has never run.
    Never,
    /// An attempt is currently in flight (or was interrupted mid-run).
    Running,
    /// The last attempt completed successfully.
    Success,
    /// The last attempt failed.
    Error,
}

impl SyncStatus {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Never => "never",
            SyncStatus::Running => "running",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }

    /// Parse the stored string form; unknown values fall back to `Never`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "running" => SyncStatus::Running,
            "success" => SyncStatus::Success,
            "error" => SyncStatus::Error,
            _ => SyncStatus::Never,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias_row(alias: Option<&str>, detected: &str) -> DeviceAlias {
        DeviceAlias {
            address: "a4:c1:38:aa:bb:cc".to_string(),
            alias: alias.map(str::to_string),
            detected_name: detected.to_string(),
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_display_name_prefers_alias() {
        let row = alias_row(Some("Bedroom"), "GVH5075_AABB");
        assert_eq!(row.display_name(), "Bedroom");
    }

    #[test]
    fn test_display_name_falls_back_to_detected_name() {
        let row = alias_row(None, "GVH5075_AABB");
        assert_eq!(row.display_name(), "GVH5075_AABB");

        // Empty alias counts as unset
        let row = alias_row(Some(""), "GVH5075_AABB");
        assert_eq!(row.display_name(), "GVH5075_AABB");
    }

    #[test]
    fn test_display_name_falls_back_to_address() {
        let row = alias_row(None, "");
        assert_eq!(row.display_name(), "a4:c1:38:aa:bb:cc");
    }

    #[test]
    fn test_sync_status_round_trip() {
        for status in [
            SyncStatus::Never,
            SyncStatus::Running,
            SyncStatus::Success,
            SyncStatus::Error,
        ] {
            assert_eq!(SyncStatus::from_str_lossy(status.as_str()), status);
        }

        // Unknown stored values degrade to Never rather than failing
        assert_eq!(SyncStatus::from_str_lossy("garbage"), SyncStatus::Never);
    }

    #[test]
    fn test_sync_status_display() {
        assert_eq!(SyncStatus::Success.to_string(), "success");
        assert_eq!(SyncStatus::Never.to_string(), "never");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_reading_serialization() {
        let reading = Reading {
            address: "a4:c1:38:aa:bb:cc".to_string(),
            name: "GVH5075_AABB".to_string(),
            temperature_c: 23.4,
            humidity_pct: 56.7,
            battery_pct: 85,
            error: false,
            rssi: Some(-61),
        };

        let json = serde_json::to_string(&reading).unwrap();
        assert!(json.contains("\"temperature_c\":23.4"));
        assert!(json.contains("\"rssi\":-61"));

        let back: Reading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reading);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_history_point_serialization_uses_rfc3339() {
        let point = HistoryPoint {
            address: "a4:c1:38:aa:bb:cc".to_string(),
            name: "H5075".to_string(),
            measured_at: OffsetDateTime::UNIX_EPOCH,
            temperature_c: 20.1,
            humidity_pct: 44.0,
        };

        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("1970-01-01T00:00:00Z"));
    }
}
