//! Person record model
//!
//! One record per tracked person. Each checkpoint carries a `done` flag, the
//! completion timestamp as persisted text, and the attribution. The guard
//! keeps `completed_at` present exactly when `done` is true; records written
//! by other tools may not, so readers go through [`CheckpointState::stamp`].

use crate::checkpoint::{Checkpoint, CheckpointMap};
use chrono::{DateTime, Utc};
use onboard_common::time::parse_timestamp;
use serde::{Deserialize, Serialize};

/// State of a single checkpoint on a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointState {
    pub done: bool,
    pub completed_at: Option<String>,
    pub completed_by: Option<String>,
}

/// Completion time of a checkpoint as seen by the analytics views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp<'a> {
    /// Not done; contributes nothing
    Open,
    /// Done but no timestamp stored
    Missing,
    /// Done with a timestamp that does not parse
    Unparsable(&'a str),
    /// Done at this instant
    At(DateTime<Utc>),
}

impl CheckpointState {
    /// A completed checkpoint
    pub fn completed(completed_at: impl Into<String>, completed_by: impl Into<String>) -> Self {
        Self {
            done: true,
            completed_at: Some(completed_at.into()),
            completed_by: Some(completed_by.into()),
        }
    }

    /// Classify the stored completion time
    pub fn stamp(&self) -> Stamp<'_> {
        if !self.done {
            return Stamp::Open;
        }
        match self.completed_at.as_deref() {
            None => Stamp::Missing,
            Some(raw) => match parse_timestamp(raw) {
                Some(ts) => Stamp::At(ts),
                None => Stamp::Unparsable(raw),
            },
        }
    }

    /// Attribution, if present and not blank
    pub fn attributor(&self) -> Option<&str> {
        self.completed_by
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// `done` iff a timestamp is present
    pub fn is_consistent(&self) -> bool {
        self.done == self.completed_at.is_some()
    }
}

/// One tracked person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub person_id: String,
    pub name: String,
    pub group_tag: Option<String>,
    pub visitor_count: u32,
    #[serde(flatten)]
    pub checkpoints: CheckpointMap<CheckpointState>,
}

impl PersonRecord {
    /// A freshly registered person with every checkpoint open
    pub fn new(person_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            person_id: person_id.into(),
            name: name.into(),
            group_tag: None,
            visitor_count: 0,
            checkpoints: CheckpointMap::default(),
        }
    }

    pub fn with_group(mut self, group_tag: impl Into<String>) -> Self {
        self.group_tag = Some(group_tag.into());
        self
    }

    /// Mark a checkpoint complete; used to seed records, not by the guard
    pub fn with_completed(
        mut self,
        checkpoint: Checkpoint,
        completed_at: impl Into<String>,
        completed_by: impl Into<String>,
    ) -> Self {
        *self.checkpoints.get_mut(checkpoint) = CheckpointState::completed(completed_at, completed_by);
        self
    }

    pub fn checkpoint(&self, checkpoint: Checkpoint) -> &CheckpointState {
        self.checkpoints.get(checkpoint)
    }

    pub fn is_done(&self, checkpoint: Checkpoint) -> bool {
        self.checkpoint(checkpoint).done
    }

    /// The four done flags
    pub fn progress(&self) -> CheckpointMap<bool> {
        self.checkpoints.map(|_, state| state.done)
    }

    /// Every checkpoint has a timestamp exactly when it is done
    pub fn is_consistent(&self) -> bool {
        self.checkpoints.iter().all(|(_, state)| state.is_consistent())
    }
}
