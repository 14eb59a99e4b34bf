//! Journey projection
//!
//! Reduces a record to a single "current stage" label: the furthest
//! checkpoint in journey order that is done, whether or not the earlier ones
//! are. A record with only documents done reports `Documents`.

use crate::checkpoint::{Checkpoint, CheckpointMap};
use crate::record::PersonRecord;
use serde::Serialize;

/// Furthest-reached stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CurrentStage {
    NotStarted,
    Arrival,
    Hostel,
    Documents,
    Kit,
}

impl From<Checkpoint> for CurrentStage {
    fn from(checkpoint: Checkpoint) -> Self {
        match checkpoint {
            Checkpoint::Arrival => CurrentStage::Arrival,
            Checkpoint::Hostel => CurrentStage::Hostel,
            Checkpoint::Documents => CurrentStage::Documents,
            Checkpoint::Kit => CurrentStage::Kit,
        }
    }
}

/// Display view of one person's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyView {
    pub person_id: String,
    pub name: String,
    pub current_stage: CurrentStage,
    pub stage_progress: CheckpointMap<bool>,
    pub completed_at: CheckpointMap<Option<String>>,
    pub completed_by: CheckpointMap<Option<String>>,
    pub visitor_count: u32,
}

/// Priority fold over the four flags: the last done checkpoint wins
pub fn current_stage(progress: &CheckpointMap<bool>) -> CurrentStage {
    progress
        .iter()
        .fold(CurrentStage::NotStarted, |stage, (checkpoint, &done)| {
            if done {
                checkpoint.into()
            } else {
                stage
            }
        })
}

/// Project a record into its journey view
pub fn project(record: &PersonRecord) -> JourneyView {
    let stage_progress = record.progress();

    JourneyView {
        person_id: record.person_id.clone(),
        name: record.name.clone(),
        current_stage: current_stage(&stage_progress),
        stage_progress,
        completed_at: record.checkpoints.map(|_, s| s.completed_at.clone()),
        completed_by: record.checkpoints.map(|_, s| s.completed_by.clone()),
        visitor_count: record.visitor_count,
    }
}
