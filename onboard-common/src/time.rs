//! Timestamp utilities
//!
//! Completion timestamps are persisted as RFC 3339 text with millisecond
//! precision and a `Z` suffix. Parsing also accepts SQLite's
//! `YYYY-MM-DD HH:MM:SS[.fff]` form (read as UTC) so rows written by other
//! tools still aggregate.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp in the persisted text form
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted timestamp, returning `None` when the text is not a
/// recognizable instant
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_format_uses_millis_and_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 8, 1, 9, 10, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-08-01T09:10:00.000Z");
    }

    #[test]
    fn test_parse_round_trips_formatted_value() {
        let ts = Utc.with_ymd_and_hms(2024, 8, 1, 23, 59, 59).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(ts)), Some(ts));
    }

    #[test]
    fn test_parse_normalizes_offsets_to_utc() {
        let parsed = parse_timestamp("2024-08-01T14:40:00+05:30").unwrap();
        assert_eq!(parsed.hour(), 9);
        assert_eq!(parsed.minute(), 10);
    }

    #[test]
    fn test_parse_accepts_sqlite_timestamp_text() {
        let parsed = parse_timestamp("2024-08-01 09:10:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 8, 1, 9, 10, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday morning"), None);
        assert_eq!(parse_timestamp("2024-13-45T99:00:00Z"), None);
    }
}
