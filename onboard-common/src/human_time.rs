//! Human-readable duration formatting
//!
//! Durations between checkpoint completions are shown at minute resolution:
//! `Xh Ym` once a duration reaches an hour, `Ym` below that. Seconds are
//! truncated, never rounded up.

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// Format a millisecond duration as hours and minutes.
///
/// # Examples
///
/// ```
/// use onboard_common::human_time::format_hours_minutes;
///
/// assert_eq!(format_hours_minutes(0), "0m");
/// assert_eq!(format_hours_minutes(59_999), "0m");
/// assert_eq!(format_hours_minutes(45 * 60_000), "45m");
/// assert_eq!(format_hours_minutes(3_600_000 + 5 * 60_000), "1h 5m");
/// assert_eq!(format_hours_minutes(26 * 3_600_000), "26h 0m");
/// ```
pub fn format_hours_minutes(millis: i64) -> String {
    // Negative durations only show up on corrupted input
    let is_negative = millis < 0;
    let abs_millis = millis.unsigned_abs() as i64;

    let hours = abs_millis / MILLIS_PER_HOUR;
    let minutes = (abs_millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;

    let formatted = if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    };

    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Convert a (possibly fractional) millisecond duration to whole minutes,
/// rounding half away from zero.
pub fn millis_to_rounded_minutes(millis: f64) -> i64 {
    (millis / MILLIS_PER_MINUTE as f64).round() as i64
}
