//! Wire format for the H5075 history protocol.
//!
//! The retrieval exchange is a single 20-byte command written to the
//! command characteristic, followed by a burst of notification frames on
//! the data characteristic and a 2-byte terminator on the command
//! characteristic. Everything here is pure byte manipulation; the session
//! driver lives in [`crate::history`].

use bytes::Buf;

use crate::codec::decode_temp_humidity;

/// History request opcode.
pub const HISTORY_REQUEST: [u8; 2] = [0x33, 0x01];

/// Command-channel notification prefix signalling the device has finished
/// transmitting records.
pub const TRANSFER_COMPLETE: [u8; 2] = [0xEE, 0x01];

/// Largest supported minutes-in-the-past value (20 days of storage).
pub const MAX_MINUTES_BACK: u16 = 28_800;

/// Total history request packet length, checksum included.
pub const REQUEST_LEN: usize = 20;

/// Minimum valid data frame length; shorter frames are discarded unread.
const FRAME_MIN_LEN: usize = 20;

/// Number of 3-byte sample slots per data frame.
const SLOTS_PER_FRAME: usize = 6;

/// First byte of an empty sample slot.
const EMPTY_SLOT: u8 = 0xFF;

/// Build the 20-byte history request packet.
///
/// Layout: opcode, `start_minutes` and `end_minutes` as big-endian u16
/// ("minutes into the past", start being the older bound), zero padding to
/// 19 bytes, and a final checksum byte equal to the XOR of the preceding 19.
///
/// Inputs are clamped to [`MAX_MINUTES_BACK`] and swapped if supplied out
/// of order, so the packet is always well-formed.
pub fn build_history_request(start_minutes: u16, end_minutes: u16) -> [u8; REQUEST_LEN] {
    let start = start_minutes.min(MAX_MINUTES_BACK);
    let end = end_minutes.min(MAX_MINUTES_BACK);
    let (start, end) = if start < end { (end, start) } else { (start, end) };

    let mut packet = [0u8; REQUEST_LEN];
    packet[0..2].copy_from_slice(&HISTORY_REQUEST);
    packet[2..4].copy_from_slice(&start.to_be_bytes());
    packet[4..6].copy_from_slice(&end.to_be_bytes());

    let checksum = packet[..REQUEST_LEN - 1].iter().fold(0, |acc, b| acc ^ b);
    packet[REQUEST_LEN - 1] = checksum;
    packet
}

/// Check whether a command-channel notification is the transfer terminator.
/// Trailing bytes, if any, are ignored.
pub fn is_transfer_complete(data: &[u8]) -> bool {
    data.len() >= 2 && data[0..2] == TRANSFER_COMPLETE
}

/// One sample decoded from a history data frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    /// Minutes before the moment the history request was issued.
    pub minutes_back: i64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// Decode a history data frame into its non-empty samples.
///
/// A frame carries `minutes_back` (big-endian u16, the age of the first
/// slot) followed by six consecutive 3-byte slots; slot `i` is aged
/// `minutes_back - i`. Slots starting with `0xFF` recorded nothing and are
/// skipped. Frames shorter than 20 bytes return no samples.
pub fn parse_history_frame(data: &[u8]) -> Vec<FrameSample> {
    if data.len() < FRAME_MIN_LEN {
        return Vec::new();
    }

    let mut header = &data[0..2];
    let minutes_back = i64::from(header.get_u16());

    let mut samples = Vec::with_capacity(SLOTS_PER_FRAME);
    for i in 0..SLOTS_PER_FRAME {
        let slot = &data[2 + 3 * i..5 + 3 * i];
        if slot[0] == EMPTY_SLOT {
            continue;
        }

        let (temperature_c, humidity_pct) = decode_temp_humidity(slot[0], slot[1], slot[2]);
        samples.push(FrameSample {
            minutes_back: minutes_back - i as i64,
            temperature_c,
            humidity_pct,
        });
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_layout_full_window() {
        // 28800 = 0x7080
        let packet = build_history_request(28_800, 0);
        assert_eq!(packet.len(), REQUEST_LEN);
        assert_eq!(&packet[0..2], &[0x33, 0x01]);
        assert_eq!(packet[2], 0x70);
        assert_eq!(packet[3], 0x80);
        assert_eq!(&packet[4..6], &[0x00, 0x00]);
        assert!(packet[6..19].iter().all(|&b| b == 0x00));

        let checksum = packet[..19].iter().fold(0u8, |acc, b| acc ^ b);
        assert_eq!(packet[19], checksum);
    }

    #[test]
    fn test_request_clamps_and_orders_bounds() {
        // Oversized values clamp to the 20-day maximum
        let packet = build_history_request(u16::MAX, 40_000);
        assert_eq!(u16::from_be_bytes([packet[2], packet[3]]), MAX_MINUTES_BACK);
        assert_eq!(u16::from_be_bytes([packet[4], packet[5]]), MAX_MINUTES_BACK);

        // Swapped bounds are reordered so start >= end
        let packet = build_history_request(60, 600);
        assert_eq!(u16::from_be_bytes([packet[2], packet[3]]), 600);
        assert_eq!(u16::from_be_bytes([packet[4], packet[5]]), 60);
    }

    #[test]
    fn test_transfer_complete_detection() {
        assert!(is_transfer_complete(&[0xEE, 0x01]));
        // Trailing bytes are ignored
        assert!(is_transfer_complete(&[0xEE, 0x01, 0xAA, 0xBB]));

        assert!(!is_transfer_complete(&[0xEE]));
        assert!(!is_transfer_complete(&[0xEE, 0x02]));
        assert!(!is_transfer_complete(&[0x33, 0x01]));
        assert!(!is_transfer_complete(&[]));
    }

    /// A frame with the given minutes_back and six copies of one chunk.
    fn frame(minutes_back: u16, chunk: [u8; 3]) -> Vec<u8> {
        let mut data = minutes_back.to_be_bytes().to_vec();
        for _ in 0..6 {
            data.extend_from_slice(&chunk);
        }
        data
    }

    #[test]
    fn test_frame_slot_ages_decrease_by_index() {
        let samples = parse_history_frame(&frame(100, [0x03, 0x94, 0x47]));
        assert_eq!(samples.len(), 6);

        // Slot i is (minutes_back - i) minutes old: ages are strictly
        // decreasing, so timestamps within a frame are non-decreasing.
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(sample.minutes_back, 100 - i as i64);
            assert!((sample.temperature_c - 23.4).abs() < 1e-9);
            assert!((sample.humidity_pct - 56.7).abs() < 1e-9);
        }
    }

    #[test]
    fn test_frame_skips_empty_slots() {
        let mut data = frame(100, [0x03, 0x94, 0x47]);
        // Mark slot 3 empty; the remaining five keep their ages
        data[2 + 3 * 3] = 0xFF;

        let samples = parse_history_frame(&data);
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.minutes_back != 97));
        assert!(samples.iter().any(|s| s.minutes_back == 96));
    }

    #[test]
    fn test_short_frame_discarded() {
        let mut data = frame(100, [0x03, 0x94, 0x47]);
        data.truncate(19);
        assert!(parse_history_frame(&data).is_empty());
        assert!(parse_history_frame(&[]).is_empty());
    }

    #[test]
    fn test_all_empty_frame_yields_nothing() {
        assert!(parse_history_frame(&frame(50, [0xFF, 0x00, 0x00])).is_empty());
    }
}
