//! Record store contract
//!
//! The guard and the aggregator only need keyed reads, full scans and two
//! conditional writes. The conditional writes carry the concurrency
//! guarantee: a checkpoint completion applies only while the checkpoint is
//! still open, so of several racing scans exactly one is applied.

use crate::checkpoint::Checkpoint;
use crate::record::PersonRecord;
use crate::Result;
use async_trait::async_trait;

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

/// Result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalWrite {
    /// Predicate held and the row was updated
    Applied,
    /// Row exists but the predicate did not hold; nothing changed
    PredicateFailed,
    /// No row for this key
    Missing,
}

/// Durable keyed storage of person records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read one record
    async fn get(&self, person_id: &str) -> Result<Option<PersonRecord>>;

    /// Create a record; fails with `InvalidArgument` if the key exists
    async fn insert(&self, record: &PersonRecord) -> Result<()>;

    /// Set `done`, `completed_at` and `completed_by` for one checkpoint,
    /// only if that checkpoint is not yet done
    async fn complete_checkpoint(
        &self,
        person_id: &str,
        checkpoint: Checkpoint,
        completed_at: &str,
        completed_by: &str,
    ) -> Result<ConditionalWrite>;

    /// Overwrite the visitor count, only if arrival is done
    async fn set_visitor_count(&self, person_id: &str, count: u32) -> Result<ConditionalWrite>;

    /// Every record, ordered by person id
    async fn scan_all(&self) -> Result<Vec<PersonRecord>>;
}
