//! Time-of-day bucketing
//!
//! Splits the 24-hour clock into equal buckets. Only hour and minute are
//! used, so completions on different days at the same clock time share a
//! bucket.

use crate::{Error, Result};
use chrono::{NaiveTime, Timelike};
use serde::Serialize;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// A validated bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntervalWidth(u32);

impl IntervalWidth {
    /// Accepted widths in minutes; each divides a day evenly
    pub const ALLOWED_MINUTES: [u32; 4] = [15, 30, 45, 60];

    pub fn from_minutes(minutes: u32) -> Result<Self> {
        if Self::ALLOWED_MINUTES.contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(Error::InvalidArgument(format!(
                "invalid interval {} (must be 15, 30, 45 or 60 minutes)",
                minutes
            )))
        }
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn buckets_per_day(self) -> usize {
        (MINUTES_PER_DAY / self.0) as usize
    }
}

/// Bucket holding `time`
pub fn bucket_index(time: NaiveTime, width: IntervalWidth) -> usize {
    let minute_of_day = time.hour() * 60 + time.minute();
    (minute_of_day / width.minutes()) as usize
}

/// `HH:00` for hourly buckets, `HH:MM - HH:MM` otherwise
pub fn label(index: usize, width: IntervalWidth) -> String {
    let start = index as u32 * width.minutes();
    if width.minutes() == 60 {
        return format!("{:02}:00", start / 60);
    }

    let end = start + width.minutes();
    format!(
        "{:02}:{:02} - {:02}:{:02}",
        start / 60,
        start % 60,
        end / 60,
        end % 60
    )
}
