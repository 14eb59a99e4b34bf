//! Summary and funnel view

use super::percentage;
use crate::checkpoint::{Checkpoint, CheckpointMap, Transition};
use crate::record::PersonRecord;
use serde::Serialize;
use std::collections::BTreeSet;

/// Conditional completion rate of each checkpoint given the previous one
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelRates {
    pub hostel_from_arrival: f64,
    pub documents_from_hostel: f64,
    pub kit_from_documents: f64,
}

impl FunnelRates {
    pub fn rate(&self, transition: Transition) -> f64 {
        match transition {
            Transition::ArrivalToHostel => self.hostel_from_arrival,
            Transition::HostelToDocuments => self.documents_from_hostel,
            Transition::DocumentsToKit => self.kit_from_documents,
            // Not part of the funnel; end-to-end conversion
            Transition::ArrivalToKit => 0.0,
        }
    }
}

/// The funnel step that keeps the smallest share of people
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropOff {
    pub transition: Transition,
    pub label: String,
    pub rate: f64,
}

/// Population per stage derived from successive done-count differences
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDistribution {
    pub not_started: u64,
    pub arrival: u64,
    pub hostel: u64,
    pub documents: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub total_records: u64,
    pub done_counts: CheckpointMap<u64>,
    pub completion_rates: CheckpointMap<f64>,
    /// Checkpoint completions, not distinct people
    pub total_scans: u64,
    pub unique_attributors: u64,
    pub funnel: FunnelRates,
    pub biggest_drop_off: DropOff,
    pub overall_completion_rate: f64,
    pub stage_distribution: StageDistribution,
}

pub fn compute(records: &[PersonRecord]) -> SummaryView {
    let total_records = records.len() as u64;

    let mut done_counts: CheckpointMap<u64> = CheckpointMap::default();
    let mut attributors: BTreeSet<&str> = BTreeSet::new();

    for record in records {
        for (checkpoint, state) in record.checkpoints.iter() {
            if state.done {
                *done_counts.get_mut(checkpoint) += 1;
            }
            if let Some(name) = state.attributor() {
                attributors.insert(name);
            }
        }
    }

    let completion_rates = done_counts.map(|_, &count| percentage(count, total_records));
    let total_scans = done_counts.iter().map(|(_, &count)| count).sum();

    let funnel = FunnelRates {
        hostel_from_arrival: percentage(done_counts.hostel, done_counts.arrival),
        documents_from_hostel: percentage(done_counts.documents, done_counts.hostel),
        kit_from_documents: percentage(done_counts.kit, done_counts.documents),
    };

    // Strict comparison keeps the earliest transition on ties
    let worst = Transition::ADJACENT
        .into_iter()
        .skip(1)
        .fold(Transition::ArrivalToHostel, |worst, candidate| {
            if funnel.rate(candidate) < funnel.rate(worst) {
                candidate
            } else {
                worst
            }
        });
    let biggest_drop_off = DropOff {
        transition: worst,
        label: worst.label(),
        rate: funnel.rate(worst),
    };

    // Out-of-order completions can make a later count exceed an earlier one
    let stage_distribution = StageDistribution {
        not_started: total_records.saturating_sub(done_counts.arrival),
        arrival: done_counts.arrival.saturating_sub(done_counts.hostel),
        hostel: done_counts.hostel.saturating_sub(done_counts.documents),
        documents: done_counts.documents.saturating_sub(done_counts.kit),
        completed: done_counts.kit,
    };

    SummaryView {
        total_records,
        overall_completion_rate: *completion_rates.get(Checkpoint::Kit),
        done_counts,
        completion_rates,
        total_scans,
        unique_attributors: attributors.len() as u64,
        funnel,
        biggest_drop_off,
        stage_distribution,
    }
}
