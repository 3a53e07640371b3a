//! Small output helpers shared by the commands.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Format a timestamp for display (RFC 3339).
pub fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Format an optional RSSI value.
pub fn format_rssi(rssi: Option<i16>) -> String {
    match rssi {
        Some(value) => value.to_string(),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(OffsetDateTime::UNIX_EPOCH),
            "1970-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_format_rssi() {
        assert_eq!(format_rssi(Some(-61)), "-61");
        assert_eq!(format_rssi(None), "n/a");
    }
}
