//! onboard-tracker library
//!
//! Tracks people through the four onboarding checkpoints (arrival, hostel,
//! documents, kit) and derives analytics from the completion timestamps.
//!
//! - [`guard::StageGuard`] accepts or rejects a single checkpoint scan
//! - [`journey::project`] reduces a record to its furthest-reached stage
//! - [`bucket`] maps clock times onto fixed-width time-of-day buckets
//! - [`analytics::AnalyticsAggregator`] recomputes the derived views from a
//!   full scan of the store

pub mod analytics;
pub mod bucket;
pub mod checkpoint;
pub mod error;
pub mod guard;
pub mod journey;
pub mod record;
pub mod store;

pub use analytics::AnalyticsAggregator;
pub use checkpoint::{Checkpoint, CheckpointMap, Transition};
pub use error::{Error, Result};
pub use guard::{ScanOutcome, StageGuard, VisitorCountOutcome};
pub use record::{CheckpointState, PersonRecord};
pub use store::{ConditionalWrite, MemoryRecordStore, RecordStore, SqliteRecordStore};
