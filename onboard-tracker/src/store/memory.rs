//! In-process record store
//!
//! Conditional writes run under the map's write lock, which gives the same
//! single-winner behavior as the SQLite store within one process.

use super::{ConditionalWrite, RecordStore};
use crate::checkpoint::Checkpoint;
use crate::record::{CheckpointState, PersonRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Record store backed by an ordered in-memory map
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<String, PersonRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with records
    pub fn with_records(records: impl IntoIterator<Item = PersonRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.person_id.clone(), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, person_id: &str) -> Result<Option<PersonRecord>> {
        Ok(self.records.read().await.get(person_id).cloned())
    }

    async fn insert(&self, record: &PersonRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.person_id) {
            return Err(Error::InvalidArgument(format!(
                "person '{}' already exists",
                record.person_id
            )));
        }
        records.insert(record.person_id.clone(), record.clone());
        Ok(())
    }

    async fn complete_checkpoint(
        &self,
        person_id: &str,
        checkpoint: Checkpoint,
        completed_at: &str,
        completed_by: &str,
    ) -> Result<ConditionalWrite> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(person_id) else {
            return Ok(ConditionalWrite::Missing);
        };

        let state = record.checkpoints.get_mut(checkpoint);
        if state.done {
            return Ok(ConditionalWrite::PredicateFailed);
        }
        *state = CheckpointState::completed(completed_at, completed_by);
        Ok(ConditionalWrite::Applied)
    }

    async fn set_visitor_count(&self, person_id: &str, count: u32) -> Result<ConditionalWrite> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(person_id) else {
            return Ok(ConditionalWrite::Missing);
        };

        if !record.is_done(Checkpoint::Arrival) {
            return Ok(ConditionalWrite::PredicateFailed);
        }
        record.visitor_count = count;
        Ok(ConditionalWrite::Applied)
    }

    async fn scan_all(&self) -> Result<Vec<PersonRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
