//! Pending-bucket partition
//!
//! Each record lands in exactly one bucket, chosen by its first unmet
//! checkpoint in journey order. A record with arrival open is `notArrived`
//! even if later checkpoints are done.

use super::percentage;
use crate::checkpoint::Checkpoint;
use crate::record::PersonRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PendingBucket {
    NotArrived,
    PendingHostel,
    PendingDocuments,
    PendingKit,
    Completed,
}

impl PendingBucket {
    /// Buckets that represent a person waiting on a checkpoint after arrival
    pub const BOTTLENECK_CANDIDATES: [PendingBucket; 3] = [
        PendingBucket::PendingHostel,
        PendingBucket::PendingDocuments,
        PendingBucket::PendingKit,
    ];

    /// Bucket for a person whose first open checkpoint is `checkpoint`
    fn waiting_on(checkpoint: Checkpoint) -> Self {
        match checkpoint {
            Checkpoint::Arrival => PendingBucket::NotArrived,
            Checkpoint::Hostel => PendingBucket::PendingHostel,
            Checkpoint::Documents => PendingBucket::PendingDocuments,
            Checkpoint::Kit => PendingBucket::PendingKit,
        }
    }

    pub fn of(record: &PersonRecord) -> Self {
        Checkpoint::ALL
            .into_iter()
            .find(|&c| !record.is_done(c))
            .map_or(PendingBucket::Completed, Self::waiting_on)
    }
}

/// One value per pending bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTally<T> {
    pub not_arrived: T,
    pub pending_hostel: T,
    pub pending_documents: T,
    pub pending_kit: T,
    pub completed: T,
}

impl<T> PendingTally<T> {
    pub fn get(&self, bucket: PendingBucket) -> &T {
        match bucket {
            PendingBucket::NotArrived => &self.not_arrived,
            PendingBucket::PendingHostel => &self.pending_hostel,
            PendingBucket::PendingDocuments => &self.pending_documents,
            PendingBucket::PendingKit => &self.pending_kit,
            PendingBucket::Completed => &self.completed,
        }
    }

    fn get_mut(&mut self, bucket: PendingBucket) -> &mut T {
        match bucket {
            PendingBucket::NotArrived => &mut self.not_arrived,
            PendingBucket::PendingHostel => &mut self.pending_hostel,
            PendingBucket::PendingDocuments => &mut self.pending_documents,
            PendingBucket::PendingKit => &mut self.pending_kit,
            PendingBucket::Completed => &mut self.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingView {
    pub total_records: u64,
    pub counts: PendingTally<u64>,
    pub percentages: PendingTally<f64>,
    pub most_bottlenecked: PendingBucket,
}

pub fn compute(records: &[PersonRecord]) -> PendingView {
    let total_records = records.len() as u64;

    let mut counts: PendingTally<u64> = PendingTally::default();
    for record in records {
        *counts.get_mut(PendingBucket::of(record)) += 1;
    }

    let percentages = PendingTally {
        not_arrived: percentage(counts.not_arrived, total_records),
        pending_hostel: percentage(counts.pending_hostel, total_records),
        pending_documents: percentage(counts.pending_documents, total_records),
        pending_kit: percentage(counts.pending_kit, total_records),
        completed: percentage(counts.completed, total_records),
    };

    // Strict comparison keeps the earlier bucket on ties
    let most_bottlenecked = PendingBucket::BOTTLENECK_CANDIDATES
        .into_iter()
        .skip(1)
        .fold(PendingBucket::PendingHostel, |best, candidate| {
            if counts.get(candidate) > counts.get(best) {
                candidate
            } else {
                best
            }
        });

    PendingView {
        total_records,
        counts,
        percentages,
        most_bottlenecked,
    }
}
