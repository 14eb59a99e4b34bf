//! Peak time-of-day histograms
//!
//! Completion instants are shifted to the configured UTC offset and bucketed
//! by clock time only. Checkpoints that are open contribute nothing; done
//! checkpoints whose timestamp is missing or unparsable are skipped and
//! counted.

use super::Diagnostics;
use crate::bucket::{self, IntervalWidth};
use crate::checkpoint::CheckpointMap;
use crate::record::{PersonRecord, Stamp};
use chrono::FixedOffset;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCount {
    pub index: usize,
    pub count: u64,
    pub label: String,
}

/// Buckets of one checkpoint, in index order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub buckets: Vec<BucketCount>,
    pub peak: BucketCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakView {
    pub width_minutes: u32,
    pub buckets_per_day: usize,
    pub utc_offset_minutes: i32,
    pub histograms: CheckpointMap<Histogram>,
    pub totals: CheckpointMap<u64>,
    /// Peak of the per-bucket sum over all checkpoints
    pub overall_peak: BucketCount,
    pub total_completions: u64,
    pub diagnostics: Diagnostics,
}

fn histogram(counts: &[u64], width: IntervalWidth) -> Histogram {
    let buckets: Vec<BucketCount> = counts
        .iter()
        .enumerate()
        .map(|(index, &count)| BucketCount {
            index,
            count,
            label: bucket::label(index, width),
        })
        .collect();

    Histogram {
        peak: peak_of(&buckets),
        buckets,
    }
}

/// Highest bucket; lowest index wins ties, bucket 0 when everything is zero
fn peak_of(buckets: &[BucketCount]) -> BucketCount {
    let mut best = &buckets[0];
    for candidate in &buckets[1..] {
        if candidate.count > best.count {
            best = candidate;
        }
    }
    best.clone()
}

pub fn compute(records: &[PersonRecord], width: IntervalWidth, utc_offset: FixedOffset) -> PeakView {
    let buckets_per_day = width.buckets_per_day();
    let mut counts: CheckpointMap<Vec<u64>> = CheckpointMap::from_fn(|_| vec![0; buckets_per_day]);
    let mut diagnostics = Diagnostics::default();

    for record in records {
        for (checkpoint, state) in record.checkpoints.iter() {
            match state.stamp() {
                Stamp::Open => {}
                Stamp::Missing => {
                    diagnostics.skip("peak", &record.person_id, checkpoint, "missing timestamp");
                }
                Stamp::Unparsable(_) => {
                    diagnostics.skip("peak", &record.person_id, checkpoint, "unparsable timestamp");
                }
                Stamp::At(ts) => {
                    let local = ts.with_timezone(&utc_offset).time();
                    counts.get_mut(checkpoint)[bucket::bucket_index(local, width)] += 1;
                }
            }
        }
    }

    let totals = counts.map(|_, buckets| buckets.iter().sum::<u64>());
    let total_completions = totals.iter().map(|(_, &n)| n).sum();

    let combined: Vec<u64> = (0..buckets_per_day)
        .map(|i| counts.iter().map(|(_, buckets)| buckets[i]).sum())
        .collect();
    let overall_peak = histogram(&combined, width).peak;

    PeakView {
        width_minutes: width.minutes(),
        buckets_per_day,
        utc_offset_minutes: utc_offset.local_minus_utc() / 60,
        histograms: counts.map(|_, buckets| histogram(buckets, width)),
        totals,
        overall_peak,
        total_completions,
        diagnostics,
    }
}
