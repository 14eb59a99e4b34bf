//! Stage timing statistics
//!
//! Only records with a usable arrival timestamp are analyzed. Within one, a
//! duration sample exists for a transition only when both checkpoints carry
//! a usable timestamp and the later one is strictly after the earlier one.
//! Out-of-order completions therefore produce no sample for that pair, and
//! each analyzed record adds at most one sample per transition.

use super::{round_to, Diagnostics};
use crate::checkpoint::{Checkpoint, CheckpointMap, Transition};
use crate::record::{PersonRecord, Stamp};
use chrono::{DateTime, Utc};
use onboard_common::human_time::{format_hours_minutes, millis_to_rounded_minutes};
use serde::Serialize;

const NOT_AVAILABLE: &str = "N/A";

/// Summary of one transition's duration samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationStats {
    pub count: u64,
    pub average: String,
    pub min: String,
    pub max: String,
    /// Rounded average; `None` when there are no samples
    pub average_minutes: Option<i64>,
}

impl DurationStats {
    fn from_samples(samples: &[i64]) -> Self {
        let (Some(&min), Some(&max)) = (samples.iter().min(), samples.iter().max()) else {
            return Self {
                count: 0,
                average: NOT_AVAILABLE.to_string(),
                min: NOT_AVAILABLE.to_string(),
                max: NOT_AVAILABLE.to_string(),
                average_minutes: None,
            };
        };

        let average = samples.iter().map(|&ms| ms as f64).sum::<f64>() / samples.len() as f64;

        Self {
            count: samples.len() as u64,
            average: format_hours_minutes(average as i64),
            min: format_hours_minutes(min),
            max: format_hours_minutes(max),
            average_minutes: Some(millis_to_rounded_minutes(average)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    pub arrival_to_hostel: DurationStats,
    pub hostel_to_documents: DurationStats,
    pub documents_to_kit: DurationStats,
    pub overall_journey: DurationStats,
}

impl StageTimings {
    pub fn get(&self, transition: Transition) -> &DurationStats {
        match transition {
            Transition::ArrivalToHostel => &self.arrival_to_hostel,
            Transition::HostelToDocuments => &self.hostel_to_documents,
            Transition::DocumentsToKit => &self.documents_to_kit,
            Transition::ArrivalToKit => &self.overall_journey,
        }
    }
}

/// Share of analyzed records that have a sample for each adjacent transition,
/// keyed by the checkpoint reached
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRatios {
    pub hostel: f64,
    pub documents: f64,
    pub kit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingView {
    /// Records with a usable arrival timestamp
    pub records_analyzed: u64,
    pub stage_timings: StageTimings,
    pub bottleneck: Transition,
    pub bottleneck_label: String,
    pub average_journey: String,
    pub completion_ratios: CompletionRatios,
    pub diagnostics: Diagnostics,
}

#[derive(Default)]
struct Samples {
    arrival_to_hostel: Vec<i64>,
    hostel_to_documents: Vec<i64>,
    documents_to_kit: Vec<i64>,
    arrival_to_kit: Vec<i64>,
}

impl Samples {
    fn get_mut(&mut self, transition: Transition) -> &mut Vec<i64> {
        match transition {
            Transition::ArrivalToHostel => &mut self.arrival_to_hostel,
            Transition::HostelToDocuments => &mut self.hostel_to_documents,
            Transition::DocumentsToKit => &mut self.documents_to_kit,
            Transition::ArrivalToKit => &mut self.arrival_to_kit,
        }
    }
}

/// Usable instants of one record; bad stamps are reported and dropped
fn instants(record: &PersonRecord, diagnostics: &mut Diagnostics) -> CheckpointMap<Option<DateTime<Utc>>> {
    CheckpointMap::from_fn(|checkpoint| match record.checkpoint(checkpoint).stamp() {
        Stamp::Open => None,
        Stamp::At(ts) => Some(ts),
        Stamp::Missing => {
            diagnostics.skip("timing", &record.person_id, checkpoint, "missing timestamp");
            None
        }
        Stamp::Unparsable(_) => {
            diagnostics.skip("timing", &record.person_id, checkpoint, "unparsable timestamp");
            None
        }
    })
}

fn ratio(samples: u64, analyzed: u64) -> f64 {
    if analyzed == 0 {
        return 0.0;
    }
    round_to(samples as f64 / analyzed as f64, 3)
}

pub fn compute(records: &[PersonRecord]) -> TimingView {
    let mut diagnostics = Diagnostics::default();
    let mut samples = Samples::default();
    let mut records_analyzed = 0u64;

    for record in records {
        let at = instants(record, &mut diagnostics);
        if at.get(Checkpoint::Arrival).is_none() {
            continue;
        }
        records_analyzed += 1;

        for transition in Transition::ALL {
            if let (Some(earlier), Some(later)) = (at.get(transition.from()), at.get(transition.to())) {
                if later > earlier {
                    let millis = (*later - *earlier).num_milliseconds();
                    samples.get_mut(transition).push(millis);
                }
            }
        }
    }

    let stage_timings = StageTimings {
        arrival_to_hostel: DurationStats::from_samples(&samples.arrival_to_hostel),
        hostel_to_documents: DurationStats::from_samples(&samples.hostel_to_documents),
        documents_to_kit: DurationStats::from_samples(&samples.documents_to_kit),
        overall_journey: DurationStats::from_samples(&samples.arrival_to_kit),
    };

    // Empty sets weigh 0; strict comparison keeps the earlier pair on ties
    let weight = |t: Transition| stage_timings.get(t).average_minutes.unwrap_or(0);
    let bottleneck = Transition::ADJACENT
        .into_iter()
        .skip(1)
        .fold(Transition::ArrivalToHostel, |slowest, candidate| {
            if weight(candidate) > weight(slowest) {
                candidate
            } else {
                slowest
            }
        });

    let completion_ratios = CompletionRatios {
        hostel: ratio(stage_timings.arrival_to_hostel.count, records_analyzed),
        documents: ratio(stage_timings.hostel_to_documents.count, records_analyzed),
        kit: ratio(stage_timings.documents_to_kit.count, records_analyzed),
    };

    TimingView {
        records_analyzed,
        bottleneck,
        bottleneck_label: bottleneck.label(),
        average_journey: stage_timings.overall_journey.average.clone(),
        stage_timings,
        completion_ratios,
        diagnostics,
    }
}
