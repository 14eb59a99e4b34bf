//! Stage progression guard
//!
//! Decides whether a checkpoint scan is recorded or rejected as a duplicate.
//! Checkpoints are independent: hostel may be completed before arrival. The
//! only rule is that a done checkpoint is never re-stamped, and that rule is
//! enforced by the store's conditional write rather than by the preliminary
//! read, so concurrent duplicate scans cannot both succeed.

use crate::checkpoint::Checkpoint;
use crate::record::{CheckpointState, PersonRecord};
use crate::store::{ConditionalWrite, RecordStore};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use onboard_common::time::format_timestamp;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a checkpoint scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum ScanOutcome {
    /// The checkpoint was open and is now recorded
    Accepted { record: PersonRecord },

    /// The checkpoint was already done; nothing changed
    AlreadyCompleted {
        record: PersonRecord,
        #[serde(rename = "priorCompletedAt")]
        prior_completed_at: Option<String>,
        #[serde(rename = "priorCompletedBy")]
        prior_completed_by: Option<String>,
    },

    /// No record for this person id
    NotFound {
        #[serde(rename = "personId")]
        person_id: String,
    },
}

/// Result of a visitor count update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum VisitorCountOutcome {
    Updated {
        record: PersonRecord,
    },
    NotFound {
        #[serde(rename = "personId")]
        person_id: String,
    },
    /// Arrival has not been recorded yet
    PreconditionFailed {
        #[serde(rename = "personId")]
        person_id: String,
        reason: String,
    },
}

/// Accept/reject logic for checkpoint scans
pub struct StageGuard<S: ?Sized> {
    store: Arc<S>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: RecordStore + ?Sized> StageGuard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clock: onboard_common::time::now,
        }
    }

    /// Replace the completion-time source
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Record `checkpoint` as completed by `attributor`, unless already done
    pub async fn apply(
        &self,
        person_id: &str,
        checkpoint: Checkpoint,
        attributor: &str,
    ) -> Result<ScanOutcome> {
        let attributor = attributor.trim();
        if attributor.is_empty() {
            return Err(Error::InvalidArgument("attributor must not be empty".to_string()));
        }
        if person_id.trim().is_empty() {
            return Err(Error::InvalidArgument("person id must not be empty".to_string()));
        }

        let Some(record) = self.store.get(person_id).await? else {
            warn!(person_id, %checkpoint, "Scan for unknown person");
            return Ok(ScanOutcome::NotFound {
                person_id: person_id.to_string(),
            });
        };

        if record.is_done(checkpoint) {
            return Ok(already_completed(record, checkpoint, attributor));
        }

        let completed_at = format_timestamp((self.clock)());
        let write = self
            .store
            .complete_checkpoint(person_id, checkpoint, &completed_at, attributor)
            .await?;

        match write {
            ConditionalWrite::Applied => {
                info!(
                    person_id,
                    %checkpoint,
                    attributor,
                    completed_at = %completed_at,
                    "Checkpoint recorded"
                );
                let updated = match self.store.get(person_id).await? {
                    Some(current) => current,
                    None => {
                        let mut patched = record;
                        *patched.checkpoints.get_mut(checkpoint) =
                            CheckpointState::completed(completed_at, attributor);
                        patched
                    }
                };
                Ok(ScanOutcome::Accepted { record: updated })
            }
            ConditionalWrite::PredicateFailed => {
                // Lost a race against a concurrent scan; report the winner's values
                let current = self.store.get(person_id).await?.unwrap_or(record);
                Ok(already_completed(current, checkpoint, attributor))
            }
            ConditionalWrite::Missing => {
                warn!(person_id, %checkpoint, "Person disappeared before update");
                Ok(ScanOutcome::NotFound {
                    person_id: person_id.to_string(),
                })
            }
        }
    }

    /// Overwrite the visitor count; requires arrival to be recorded
    pub async fn set_visitor_count(&self, person_id: &str, count: i64) -> Result<VisitorCountOutcome> {
        let count = u32::try_from(count).map_err(|_| {
            Error::InvalidArgument(format!("visitor count must be between 0 and {}, got {}", u32::MAX, count))
        })?;

        match self.store.set_visitor_count(person_id, count).await? {
            ConditionalWrite::Applied => {
                info!(person_id, count, "Visitor count updated");
                match self.store.get(person_id).await? {
                    Some(record) => Ok(VisitorCountOutcome::Updated { record }),
                    None => Ok(VisitorCountOutcome::NotFound {
                        person_id: person_id.to_string(),
                    }),
                }
            }
            ConditionalWrite::PredicateFailed => {
                warn!(person_id, count, "Visitor count set before arrival");
                Ok(VisitorCountOutcome::PreconditionFailed {
                    person_id: person_id.to_string(),
                    reason: "arrival must be recorded before setting visitor count".to_string(),
                })
            }
            ConditionalWrite::Missing => {
                warn!(person_id, "Visitor count for unknown person");
                Ok(VisitorCountOutcome::NotFound {
                    person_id: person_id.to_string(),
                })
            }
        }
    }
}

fn already_completed(record: PersonRecord, checkpoint: Checkpoint, attempted_by: &str) -> ScanOutcome {
    let state = record.checkpoint(checkpoint);
    let prior_completed_at = state.completed_at.clone();
    let prior_completed_by = state.completed_by.clone();

    warn!(
        person_id = %record.person_id,
        %checkpoint,
        attempted_by,
        prior_completed_at = prior_completed_at.as_deref().unwrap_or("-"),
        prior_completed_by = prior_completed_by.as_deref().unwrap_or("-"),
        "Checkpoint already completed"
    );

    ScanOutcome::AlreadyCompleted {
        record,
        prior_completed_at,
        prior_completed_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use chrono::TimeZone;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 9, 10, 0).unwrap()
    }

    fn guard_with(records: Vec<PersonRecord>) -> StageGuard<MemoryRecordStore> {
        StageGuard::new(Arc::new(MemoryRecordStore::with_records(records))).with_clock(fixed_clock)
    }

    #[tokio::test]
    async fn test_accepts_open_checkpoint() {
        let guard = guard_with(vec![PersonRecord::new("S-1", "Asha")]);

        let outcome = guard.apply("S-1", Checkpoint::Arrival, "Ravi").await.unwrap();

        let ScanOutcome::Accepted { record } = outcome else {
            panic!("expected Accepted, got {:?}", outcome);
        };
        let arrival = record.checkpoint(Checkpoint::Arrival);
        assert!(arrival.done);
        assert_eq!(arrival.completed_at.as_deref(), Some("2024-08-01T09:10:00.000Z"));
        assert_eq!(arrival.completed_by.as_deref(), Some("Ravi"));
        assert!(record.is_consistent());
    }

    #[tokio::test]
    async fn test_second_scan_reports_prior_values() {
        let guard = guard_with(vec![PersonRecord::new("S-1", "Asha")]);

        guard.apply("S-1", Checkpoint::Documents, "Ravi").await.unwrap();
        let outcome = guard.apply("S-1", Checkpoint::Documents, "Meera").await.unwrap();

        match outcome {
            ScanOutcome::AlreadyCompleted {
                prior_completed_at,
                prior_completed_by,
                ..
            } => {
                assert_eq!(prior_completed_at.as_deref(), Some("2024-08-01T09:10:00.000Z"));
                assert_eq!(prior_completed_by.as_deref(), Some("Ravi"));
            }
            other => panic!("expected AlreadyCompleted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_person_is_not_found() {
        let guard = guard_with(vec![]);
        let outcome = guard.apply("ghost", Checkpoint::Kit, "Ravi").await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::NotFound {
                person_id: "ghost".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_blank_attributor_rejected_before_store() {
        let guard = guard_with(vec![PersonRecord::new("S-1", "Asha")]);
        let err = guard.apply("S-1", Checkpoint::Hostel, "  ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        // Nothing was written
        let record = guard.store.get("S-1").await.unwrap().unwrap();
        assert!(!record.is_done(Checkpoint::Hostel));
    }

    #[tokio::test]
    async fn test_attributor_is_trimmed() {
        let guard = guard_with(vec![PersonRecord::new("S-1", "Asha")]);
        let outcome = guard.apply("S-1", Checkpoint::Hostel, "  Ravi ").await.unwrap();
        let ScanOutcome::Accepted { record } = outcome else {
            panic!("expected Accepted");
        };
        assert_eq!(record.checkpoint(Checkpoint::Hostel).completed_by.as_deref(), Some("Ravi"));
    }

    #[tokio::test]
    async fn test_out_of_order_completion_allowed() {
        let guard = guard_with(vec![PersonRecord::new("S-1", "Asha")]);

        let outcome = guard.apply("S-1", Checkpoint::Kit, "Ravi").await.unwrap();
        let ScanOutcome::Accepted { record } = outcome else {
            panic!("expected Accepted");
        };
        assert!(record.is_done(Checkpoint::Kit));
        assert!(!record.is_done(Checkpoint::Arrival));
    }

    #[tokio::test]
    async fn test_visitor_count_flow() {
        let guard = guard_with(vec![PersonRecord::new("S-1", "Asha")]);

        let before = guard.set_visitor_count("S-1", 2).await.unwrap();
        assert!(matches!(before, VisitorCountOutcome::PreconditionFailed { .. }));

        guard.apply("S-1", Checkpoint::Arrival, "Ravi").await.unwrap();

        for count in [2, 5, 0] {
            let outcome = guard.set_visitor_count("S-1", count).await.unwrap();
            let VisitorCountOutcome::Updated { record } = outcome else {
                panic!("expected Updated");
            };
            assert_eq!(record.visitor_count as i64, count);
        }
    }

    #[tokio::test]
    async fn test_negative_visitor_count_rejected() {
        let guard = guard_with(vec![PersonRecord::new("S-1", "Asha")]);
        let err = guard.set_visitor_count("S-1", -1).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_visitor_count_unknown_person() {
        let guard = guard_with(vec![]);
        let outcome = guard.set_visitor_count("ghost", 1).await.unwrap();
        assert!(matches!(outcome, VisitorCountOutcome::NotFound { .. }));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = ScanOutcome::AlreadyCompleted {
            record: PersonRecord::new("S-1", "Asha"),
            prior_completed_at: Some("2024-08-01T09:10:00.000Z".to_string()),
            prior_completed_by: Some("Ravi".to_string()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "AlreadyCompleted");
        assert_eq!(json["priorCompletedBy"], "Ravi");
        assert_eq!(json["record"]["personId"], "S-1");
    }
}
