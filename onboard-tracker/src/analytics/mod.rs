//! Analytics aggregation
//!
//! Every view is a pure fold over a fresh full scan of the store; nothing is
//! cached or patched incrementally. The `compute` functions in the
//! submodules take a record slice so they can be exercised without a store.
//!
//! Per-record problems (a done checkpoint without a usable timestamp or
//! attribution) skip that single contribution and are counted in the view's
//! [`Diagnostics`]. Only a store failure aborts a view.

pub mod leaderboard;
pub mod peak;
pub mod pending;
pub mod summary;
pub mod timing;

use crate::bucket::IntervalWidth;
use crate::checkpoint::Checkpoint;
use crate::journey::{self, JourneyView};
use crate::record::PersonRecord;
use crate::store::RecordStore;
use crate::{Error, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use leaderboard::LeaderboardView;
pub use peak::PeakView;
pub use pending::PendingView;
pub use summary::SummaryView;
pub use timing::TimingView;

/// Per-view data quality counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Contributions dropped because a record's data could not be used
    pub skipped_contributions: u64,
}

impl Diagnostics {
    pub(crate) fn skip(&mut self, view: &str, person_id: &str, checkpoint: Checkpoint, reason: &str) {
        self.skipped_contributions += 1;
        warn!(view, person_id, %checkpoint, reason, "Skipped record contribution");
    }
}

/// `part / whole * 100` rounded to one decimal, 0 when `whole` is 0
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 1)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Computes the derived views from the record store
pub struct AnalyticsAggregator<S: ?Sized> {
    store: Arc<S>,
    utc_offset: FixedOffset,
}

impl<S: RecordStore + ?Sized> AnalyticsAggregator<S> {
    /// Aggregator reading time-of-day in UTC
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            utc_offset: Utc.fix(),
        }
    }

    /// Read time-of-day at a fixed offset from UTC
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Result<Self> {
        let out_of_range =
            || Error::InvalidArgument(format!("UTC offset of {} minutes is out of range", minutes));
        let seconds = minutes.checked_mul(60).ok_or_else(out_of_range)?;
        self.utc_offset = FixedOffset::east_opt(seconds).ok_or_else(out_of_range)?;
        Ok(self)
    }

    async fn snapshot(&self, view: &'static str) -> Result<Vec<PersonRecord>> {
        let records = self.store.scan_all().await?;
        debug!(view, records = records.len(), "Loaded snapshot");
        Ok(records)
    }

    /// Done counts, completion rates and funnel drop-off
    pub async fn summary(&self) -> Result<SummaryView> {
        let records = self.snapshot("summary").await?;
        let view = summary::compute(&records);
        info!(
            total_records = view.total_records,
            total_scans = view.total_scans,
            unique_attributors = view.unique_attributors,
            "Computed summary"
        );
        Ok(view)
    }

    /// First-unmet-checkpoint partition
    pub async fn pending_counts(&self) -> Result<PendingView> {
        let records = self.snapshot("pending").await?;
        let view = pending::compute(&records);
        info!(
            total_records = view.total_records,
            most_bottlenecked = ?view.most_bottlenecked,
            "Computed pending counts"
        );
        Ok(view)
    }

    /// Time-of-day histogram per checkpoint; `width_minutes` must be 15, 30, 45 or 60
    pub async fn peak_time_of_day(&self, width_minutes: u32) -> Result<PeakView> {
        let width = IntervalWidth::from_minutes(width_minutes)?;
        let records = self.snapshot("peak").await?;
        let view = peak::compute(&records, width, self.utc_offset);
        info!(
            width_minutes,
            total_completions = view.total_completions,
            overall_peak = %view.overall_peak.label,
            skipped = view.diagnostics.skipped_contributions,
            "Computed peak time of day"
        );
        Ok(view)
    }

    /// Inter-checkpoint duration statistics and bottleneck
    pub async fn stage_timing(&self) -> Result<TimingView> {
        let records = self.snapshot("timing").await?;
        let view = timing::compute(&records);
        info!(
            records_analyzed = view.records_analyzed,
            average_journey = %view.average_journey,
            skipped = view.diagnostics.skipped_contributions,
            "Computed stage timing"
        );
        Ok(view)
    }

    /// Attributor tallies sorted by total
    pub async fn leaderboard(&self) -> Result<LeaderboardView> {
        let records = self.snapshot("leaderboard").await?;
        let view = leaderboard::compute(&records);
        info!(
            total_attributors = view.total_attributors,
            total_completions = view.total_completions,
            skipped = view.diagnostics.skipped_contributions,
            "Computed leaderboard"
        );
        Ok(view)
    }

    /// Journey view of every record, ordered by person id
    pub async fn journeys(&self) -> Result<Vec<JourneyView>> {
        let records = self.snapshot("journeys").await?;
        Ok(records.iter().map(journey::project).collect())
    }

    /// Journey view of one record
    pub async fn journey(&self, person_id: &str) -> Result<Option<JourneyView>> {
        let record = self.store.get(person_id).await?;
        Ok(record.as_ref().map(journey::project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(50, 100), 50.0);
        assert_eq!(percentage(10, 10), 100.0);
    }

    #[test]
    fn test_percentage_of_zero_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_diagnostics_count_skips() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.skip("test", "S-1", Checkpoint::Arrival, "missing timestamp");
        diagnostics.skip("test", "S-2", Checkpoint::Kit, "unparsable timestamp");
        assert_eq!(diagnostics.skipped_contributions, 2);
    }
}
