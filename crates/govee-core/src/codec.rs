//! H5075 payload codec.
//!
//! The H5075 packs temperature and humidity into a single 24-bit
//! big-endian integer: bit 23 is the temperature sign, the remaining
//! 23 bits encode `abs(temp_c) * 1000 + humidity_pct * 10`. The same
//! encoding is used in advertisement payloads and in history frames.
//!
//! All functions here are pure; validation of where the bytes came from
//! belongs to the callers.

use govee_types::{ParseError, ParseResult};

/// Decode a 3-byte temperature/humidity chunk.
///
/// Returns `(temperature_c, humidity_pct)` in tenths resolution.
///
/// The integer division by 1000 truncates before the final /10.0; this is
/// the device's own encoding convention and must not be replaced with
/// rounding.
pub fn decode_temp_humidity(b0: u8, b1: u8, b2: u8) -> (f64, f64) {
    let base = (u32::from(b0) << 16) | (u32::from(b1) << 8) | u32::from(b2);
    let is_negative = base & 0x80_0000 != 0;
    let magnitude = base & 0x7F_FFFF;

    let mut temperature_c = f64::from(magnitude / 1000) / 10.0;
    let humidity_pct = f64::from(magnitude % 1000) / 10.0;

    if is_negative {
        temperature_c = -temperature_c;
    }

    (temperature_c, humidity_pct)
}

/// Decode the battery/error status byte: battery level in the low 7 bits,
/// error flag in the high bit.
pub fn decode_battery_and_error(byte: u8) -> (u8, bool) {
    (byte & 0x7F, byte & 0x80 != 0)
}

/// Decode a 4-byte reading payload: a temperature/humidity chunk followed
/// by the battery/error byte.
///
/// The battery byte is taken from the *last* byte supplied, so a longer
/// slice still decodes its trailing status byte.
pub fn decode_reading_payload(payload: &[u8]) -> ParseResult<(f64, f64, u8, bool)> {
    if payload.len() < 4 {
        return Err(ParseError::InsufficientBytes {
            expected: 4,
            actual: payload.len(),
        });
    }

    let (temperature_c, humidity_pct) = decode_temp_humidity(payload[0], payload[1], payload[2]);
    let (battery_pct, error) = decode_battery_and_error(payload[payload.len() - 1]);

    Ok((temperature_c, humidity_pct, battery_pct, error))
}
