//! Attributor leaderboard

use super::Diagnostics;
use crate::checkpoint::CheckpointMap;
use crate::record::PersonRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Completions credited to one attributor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributorTally {
    pub name: String,
    pub total: u64,
    pub per_checkpoint: CheckpointMap<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardView {
    /// Sorted by total descending, then name ascending
    pub entries: Vec<AttributorTally>,
    pub total_attributors: u64,
    pub total_completions: u64,
    pub top: Option<AttributorTally>,
    pub diagnostics: Diagnostics,
}

pub fn compute(records: &[PersonRecord]) -> LeaderboardView {
    let mut tallies: BTreeMap<&str, AttributorTally> = BTreeMap::new();
    let mut diagnostics = Diagnostics::default();

    for record in records {
        for (checkpoint, state) in record.checkpoints.iter() {
            if !state.done {
                continue;
            }
            let Some(name) = state.attributor() else {
                diagnostics.skip("leaderboard", &record.person_id, checkpoint, "missing attribution");
                continue;
            };

            let tally = tallies.entry(name).or_insert_with(|| AttributorTally {
                name: name.to_string(),
                ..Default::default()
            });
            tally.total += 1;
            *tally.per_checkpoint.get_mut(checkpoint) += 1;
        }
    }

    // BTreeMap iteration is name-ascending; the stable sort keeps that on ties
    let mut entries: Vec<AttributorTally> = tallies.into_values().collect();
    entries.sort_by(|a, b| b.total.cmp(&a.total));

    LeaderboardView {
        total_attributors: entries.len() as u64,
        total_completions: entries.iter().map(|e| e.total).sum(),
        top: entries.first().cloned(),
        entries,
        diagnostics,
    }
}
