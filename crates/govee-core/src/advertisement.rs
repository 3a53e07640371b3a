//! BLE advertisement classification for passive monitoring.
//!
//! H5075 hygrometers broadcast their current reading in a 6-byte
//! manufacturer-data payload, so temperature and humidity can be observed
//! without ever connecting. This module decides whether a raw advertisement
//! is an H5075 reading and decodes it into typed data.
//!
//! Classification is pure: bad input yields `None`, never an error.

use std::fmt::Write as _;

use govee_types::uuid::MANUFACTURER_ID;
use govee_types::{AdvertisementSnapshot, Reading};

use crate::codec::decode_reading_payload;

/// Substring that identifies an H5075 by its advertised name
/// (e.g. `GVH5075_AABB`). Matched case-sensitively, as broadcast.
pub const NAME_MARKER: &str = "H5075";

/// Fallback name when a device advertises no local name.
pub const DEFAULT_NAME: &str = "H5075";

/// Expected manufacturer payload length for H5075 advertisements.
const PAYLOAD_LEN: usize = 6;

/// Plausible temperature band; decoded values outside it are treated as
/// misclassified vendor payloads.
const MIN_TEMP_C: f64 = -40.0;
const MAX_TEMP_C: f64 = 100.0;

/// Classify a manufacturer-data payload as an H5075 reading.
///
/// Accepts only 6-byte payloads from devices whose advertised name contains
/// [`NAME_MARKER`] or whose manufacturer id is the Govee vendor id. The
/// decoded temperature must fall within a plausible range; anything else is
/// rejected as a lookalike payload from another vendor.
pub fn parse_manufacturer_data(
    address: &str,
    local_name: &str,
    manufacturer_id: u16,
    data: &[u8],
    rssi: Option<i16>,
) -> Option<Reading> {
    let is_h5075_name = local_name.contains(NAME_MARKER);
    if data.len() != PAYLOAD_LEN || !(is_h5075_name || manufacturer_id == MANUFACTURER_ID) {
        return None;
    }

    // Byte 0 is reserved; bytes 1..5 carry the reading.
    let (temperature_c, humidity_pct, battery_pct, error) =
        decode_reading_payload(&data[1..5]).ok()?;

    if !(MIN_TEMP_C..=MAX_TEMP_C).contains(&temperature_c) {
        return None;
    }

    let name = if local_name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        local_name.to_string()
    };

    Some(Reading {
        address: address.to_string(),
        name,
        temperature_c,
        humidity_pct,
        battery_pct,
        error,
        rssi,
    })
}

/// Classify an advertisement and keep the raw payload alongside the decoded
/// reading, for snapshot storage.
pub fn parse_advertisement(
    address: &str,
    local_name: &str,
    manufacturer_id: u16,
    data: &[u8],
    rssi: Option<i16>,
    service_uuids: &[String],
) -> Option<AdvertisementSnapshot> {
    let reading = parse_manufacturer_data(address, local_name, manufacturer_id, data, rssi)?;

    Some(AdvertisementSnapshot {
        address: reading.address,
        name: reading.name,
        manufacturer_id,
        payload_hex: hex_encode(data),
        service_uuids: service_uuids.to_vec(),
        temperature_c: reading.temperature_c,
        humidity_pct: reading.humidity_pct,
        battery_pct: reading.battery_pct,
        error: reading.error,
        rssi: reading.rssi,
    })
}

fn hex_encode(data: &[u8]) -> String {
    data.iter().fold(String::with_capacity(data.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Classification never panics on arbitrary payload bytes.
        #[test]
        fn parse_manufacturer_data_never_panics(data: Vec<u8>, manufacturer_id: u16) {
            let _ = parse_manufacturer_data("aa:bb", "GVH5075_TEST", manufacturer_id, &data, None);
        }

        /// Every accepted reading has a plausible temperature.
        #[test]
        fn accepted_readings_are_in_range(data in proptest::collection::vec(any::<u8>(), 6)) {
            if let Some(reading) = parse_manufacturer_data("aa:bb", "", MANUFACTURER_ID, &data, None) {
                prop_assert!((-40.0..=100.0).contains(&reading.temperature_c));
            }
        }
    }
}
