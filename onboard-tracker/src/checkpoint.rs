//! Checkpoint identifiers and per-checkpoint containers
//!
//! The four checkpoints have a fixed display order (arrival, hostel,
//! documents, kit). That order drives labels, tie-breaks and the journey
//! fold; it is never enforced on writes.

use crate::{Error, Result};
use onboard_common::db::CHECKPOINT_COLUMN_PREFIXES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four onboarding checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checkpoint {
    Arrival,
    Hostel,
    Documents,
    Kit,
}

impl Checkpoint {
    /// All checkpoints in journey order
    pub const ALL: [Checkpoint; 4] = [
        Checkpoint::Arrival,
        Checkpoint::Hostel,
        Checkpoint::Documents,
        Checkpoint::Kit,
    ];

    /// Position in journey order (0-based)
    pub fn index(self) -> usize {
        match self {
            Checkpoint::Arrival => 0,
            Checkpoint::Hostel => 1,
            Checkpoint::Documents => 2,
            Checkpoint::Kit => 3,
        }
    }

    /// Lowercase wire name, as accepted by [`FromStr`]
    pub fn as_str(self) -> &'static str {
        match self {
            Checkpoint::Arrival => "arrival",
            Checkpoint::Hostel => "hostel",
            Checkpoint::Documents => "documents",
            Checkpoint::Kit => "kit",
        }
    }

    /// Capitalized display label
    pub fn label(self) -> &'static str {
        match self {
            Checkpoint::Arrival => "Arrival",
            Checkpoint::Hostel => "Hostel",
            Checkpoint::Documents => "Documents",
            Checkpoint::Kit => "Kit",
        }
    }

    /// Column prefix in the `people` table
    pub fn column_prefix(self) -> &'static str {
        CHECKPOINT_COLUMN_PREFIXES[self.index()]
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Checkpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Checkpoint::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown checkpoint '{}' (expected arrival, hostel, documents or kit)",
                    s
                ))
            })
    }
}

/// A value per checkpoint, serialized as an object keyed by checkpoint name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMap<T> {
    pub arrival: T,
    pub hostel: T,
    pub documents: T,
    pub kit: T,
}

impl<T> CheckpointMap<T> {
    /// Build a map by evaluating `f` once per checkpoint, in journey order
    pub fn from_fn(mut f: impl FnMut(Checkpoint) -> T) -> Self {
        Self {
            arrival: f(Checkpoint::Arrival),
            hostel: f(Checkpoint::Hostel),
            documents: f(Checkpoint::Documents),
            kit: f(Checkpoint::Kit),
        }
    }

    pub fn get(&self, checkpoint: Checkpoint) -> &T {
        match checkpoint {
            Checkpoint::Arrival => &self.arrival,
            Checkpoint::Hostel => &self.hostel,
            Checkpoint::Documents => &self.documents,
            Checkpoint::Kit => &self.kit,
        }
    }

    pub fn get_mut(&mut self, checkpoint: Checkpoint) -> &mut T {
        match checkpoint {
            Checkpoint::Arrival => &mut self.arrival,
            Checkpoint::Hostel => &mut self.hostel,
            Checkpoint::Documents => &mut self.documents,
            Checkpoint::Kit => &mut self.kit,
        }
    }

    /// Iterate `(checkpoint, value)` pairs in journey order
    pub fn iter(&self) -> impl Iterator<Item = (Checkpoint, &T)> + '_ {
        Checkpoint::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Transform every value, keeping checkpoint keys
    pub fn map<U>(&self, mut f: impl FnMut(Checkpoint, &T) -> U) -> CheckpointMap<U> {
        CheckpointMap::from_fn(|c| f(c, self.get(c)))
    }
}

/// A pair of checkpoints compared by the funnel and timing views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    ArrivalToHostel,
    HostelToDocuments,
    DocumentsToKit,
    /// End-to-end journey; never a bottleneck candidate
    ArrivalToKit,
}

impl Transition {
    /// Adjacent transitions in tie-break order
    pub const ADJACENT: [Transition; 3] = [
        Transition::ArrivalToHostel,
        Transition::HostelToDocuments,
        Transition::DocumentsToKit,
    ];

    /// Adjacent transitions followed by the end-to-end journey
    pub const ALL: [Transition; 4] = [
        Transition::ArrivalToHostel,
        Transition::HostelToDocuments,
        Transition::DocumentsToKit,
        Transition::ArrivalToKit,
    ];

    pub fn from(self) -> Checkpoint {
        match self {
            Transition::ArrivalToHostel | Transition::ArrivalToKit => Checkpoint::Arrival,
            Transition::HostelToDocuments => Checkpoint::Hostel,
            Transition::DocumentsToKit => Checkpoint::Documents,
        }
    }

    pub fn to(self) -> Checkpoint {
        match self {
            Transition::ArrivalToHostel => Checkpoint::Hostel,
            Transition::HostelToDocuments => Checkpoint::Documents,
            Transition::DocumentsToKit | Transition::ArrivalToKit => Checkpoint::Kit,
        }
    }

    /// Display label, e.g. `Hostel → Documents`
    pub fn label(self) -> String {
        format!("{} → {}", self.from().label(), self.to().label())
    }
}
