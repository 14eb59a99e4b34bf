//! SQLite record store
//!
//! Checkpoint completion is a single `UPDATE ... WHERE <c>_done = 0`
//! statement. SQLite serializes writers, so when several connections race on
//! the same row only the first update matches; the rest affect zero rows and
//! are reported as `PredicateFailed`.

use super::{ConditionalWrite, RecordStore};
use crate::checkpoint::{Checkpoint, CheckpointMap};
use crate::record::{CheckpointState, PersonRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::debug;

const SELECT_COLUMNS: &str = r#"
    person_id, name, group_tag, visitor_count,
    arrival_done, arrival_at, arrival_by,
    hostel_done, hostel_at, hostel_by,
    documents_done, documents_at, documents_by,
    kit_done, kit_at, kit_by
"#;

/// Record store on the `people` table
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Wrap an already initialized pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file and its schema
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = onboard_common::db::init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn exists(&self, person_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM people WHERE person_id = ?")
            .bind(person_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Distinguish "row missing" from "predicate failed" after a zero-row update
    async fn classify_miss(&self, person_id: &str) -> Result<ConditionalWrite> {
        if self.exists(person_id).await? {
            Ok(ConditionalWrite::PredicateFailed)
        } else {
            Ok(ConditionalWrite::Missing)
        }
    }
}

fn checkpoint_from_row(row: &SqliteRow, checkpoint: Checkpoint) -> Result<CheckpointState> {
    let prefix = checkpoint.column_prefix();
    Ok(CheckpointState {
        done: row.try_get(format!("{}_done", prefix).as_str())?,
        completed_at: row.try_get(format!("{}_at", prefix).as_str())?,
        completed_by: row.try_get(format!("{}_by", prefix).as_str())?,
    })
}

fn record_from_row(row: &SqliteRow) -> Result<PersonRecord> {
    let visitor_count: i64 = row.try_get("visitor_count")?;

    Ok(PersonRecord {
        person_id: row.try_get("person_id")?,
        name: row.try_get("name")?,
        group_tag: row.try_get("group_tag")?,
        visitor_count: visitor_count.clamp(0, u32::MAX as i64) as u32,
        checkpoints: CheckpointMap {
            arrival: checkpoint_from_row(row, Checkpoint::Arrival)?,
            hostel: checkpoint_from_row(row, Checkpoint::Hostel)?,
            documents: checkpoint_from_row(row, Checkpoint::Documents)?,
            kit: checkpoint_from_row(row, Checkpoint::Kit)?,
        },
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, person_id: &str) -> Result<Option<PersonRecord>> {
        debug!(person_id, "SELECT people");

        let sql = format!("SELECT {} FROM people WHERE person_id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(person_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn insert(&self, record: &PersonRecord) -> Result<()> {
        debug!(person_id = %record.person_id, "INSERT people");

        let cp = &record.checkpoints;
        sqlx::query(
            r#"
            INSERT INTO people (
                person_id, name, group_tag, visitor_count,
                arrival_done, arrival_at, arrival_by,
                hostel_done, hostel_at, hostel_by,
                documents_done, documents_at, documents_by,
                kit_done, kit_at, kit_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.person_id)
        .bind(&record.name)
        .bind(&record.group_tag)
        .bind(record.visitor_count as i64)
        .bind(cp.arrival.done)
        .bind(&cp.arrival.completed_at)
        .bind(&cp.arrival.completed_by)
        .bind(cp.hostel.done)
        .bind(&cp.hostel.completed_at)
        .bind(&cp.hostel.completed_by)
        .bind(cp.documents.done)
        .bind(&cp.documents.completed_at)
        .bind(&cp.documents.completed_by)
        .bind(cp.kit.done)
        .bind(&cp.kit.completed_at)
        .bind(&cp.kit.completed_by)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // The primary key decides duplicates, including concurrent inserts
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::InvalidArgument(format!("person '{}' already exists", record.person_id))
            }
            other => Error::from(other),
        })?;

        Ok(())
    }

    async fn complete_checkpoint(
        &self,
        person_id: &str,
        checkpoint: Checkpoint,
        completed_at: &str,
        completed_by: &str,
    ) -> Result<ConditionalWrite> {
        let prefix = checkpoint.column_prefix();
        debug!(person_id, checkpoint = prefix, "UPDATE people (conditional)");

        let sql = format!(
            "UPDATE people SET {p}_done = 1, {p}_at = ?, {p}_by = ? \
             WHERE person_id = ? AND {p}_done = 0",
            p = prefix
        );
        let result = sqlx::query(&sql)
            .bind(completed_at)
            .bind(completed_by)
            .bind(person_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            Ok(ConditionalWrite::Applied)
        } else {
            self.classify_miss(person_id).await
        }
    }

    async fn set_visitor_count(&self, person_id: &str, count: u32) -> Result<ConditionalWrite> {
        debug!(person_id, count, "UPDATE people visitor_count");

        let result = sqlx::query(
            "UPDATE people SET visitor_count = ? WHERE person_id = ? AND arrival_done = 1",
        )
        .bind(count as i64)
        .bind(person_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(ConditionalWrite::Applied)
        } else {
            self.classify_miss(person_id).await
        }
    }

    async fn scan_all(&self) -> Result<Vec<PersonRecord>> {
        debug!("SELECT people (full scan)");

        let sql = format!("SELECT {} FROM people ORDER BY person_id", SELECT_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(record_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, SqliteRecordStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteRecordStore::open(&dir.path().join("onboard.db"))
            .await
            .expect("open store");
        (dir, store)
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trips_fields() {
        let (_dir, store) = open_store().await;
        let record = PersonRecord::new("S-1", "Asha")
            .with_group("Batch A")
            .with_completed(Checkpoint::Documents, "2024-08-01T11:00:00.000Z", "Meera");

        store.insert(&record).await.unwrap();
        let loaded = store.get("S-1").await.unwrap().expect("record exists");

        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_invalid_argument() {
        let (_dir, store) = open_store().await;
        store.insert(&PersonRecord::new("S-1", "Asha")).await.unwrap();

        let err = store.insert(&PersonRecord::new("S-1", "Bilal")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "got {:?}", err);

        let kept = store.get("S-1").await.unwrap().expect("record exists");
        assert_eq!(kept.name, "Asha");
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let (_dir, store) = open_store().await;
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conditional_update_touches_one_checkpoint() {
        let (_dir, store) = open_store().await;
        store.insert(&PersonRecord::new("S-1", "Asha")).await.unwrap();

        let write = store
            .complete_checkpoint("S-1", Checkpoint::Kit, "2024-08-01T12:00:00.000Z", "Ravi")
            .await
            .unwrap();
        assert_eq!(write, ConditionalWrite::Applied);

        let loaded = store.get("S-1").await.unwrap().unwrap();
        assert!(loaded.is_done(Checkpoint::Kit));
        for other in [Checkpoint::Arrival, Checkpoint::Hostel, Checkpoint::Documents] {
            assert_eq!(loaded.checkpoint(other), &CheckpointState::default());
        }
    }

    #[tokio::test]
    async fn test_second_update_fails_predicate_and_keeps_first_values() {
        let (_dir, store) = open_store().await;
        store.insert(&PersonRecord::new("S-1", "Asha")).await.unwrap();

        store
            .complete_checkpoint("S-1", Checkpoint::Arrival, "2024-08-01T09:00:00.000Z", "Ravi")
            .await
            .unwrap();
        let second = store
            .complete_checkpoint("S-1", Checkpoint::Arrival, "2024-08-01T09:30:00.000Z", "Meera")
            .await
            .unwrap();

        assert_eq!(second, ConditionalWrite::PredicateFailed);
        let arrival = store.get("S-1").await.unwrap().unwrap().checkpoints.arrival;
        assert_eq!(arrival.completed_at.as_deref(), Some("2024-08-01T09:00:00.000Z"));
        assert_eq!(arrival.completed_by.as_deref(), Some("Ravi"));
    }

    #[tokio::test]
    async fn test_missing_row_reported() {
        let (_dir, store) = open_store().await;
        let write = store
            .complete_checkpoint("ghost", Checkpoint::Hostel, "2024-08-01T09:00:00.000Z", "Ravi")
            .await
            .unwrap();
        assert_eq!(write, ConditionalWrite::Missing);
    }

    #[tokio::test]
    async fn test_visitor_count_predicate() {
        let (_dir, store) = open_store().await;
        store.insert(&PersonRecord::new("S-1", "Asha")).await.unwrap();

        assert_eq!(
            store.set_visitor_count("S-1", 2).await.unwrap(),
            ConditionalWrite::PredicateFailed
        );

        store
            .complete_checkpoint("S-1", Checkpoint::Arrival, "2024-08-01T09:00:00.000Z", "Ravi")
            .await
            .unwrap();
        assert_eq!(store.set_visitor_count("S-1", 2).await.unwrap(), ConditionalWrite::Applied);
        assert_eq!(store.set_visitor_count("S-1", 0).await.unwrap(), ConditionalWrite::Applied);
        assert_eq!(store.get("S-1").await.unwrap().unwrap().visitor_count, 0);
    }

    #[tokio::test]
    async fn test_scan_all_ordered() {
        let (_dir, store) = open_store().await;
        for id in ["S-2", "S-10", "S-1"] {
            store.insert(&PersonRecord::new(id, id)).await.unwrap();
        }
        let ids: Vec<_> = store
            .scan_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.person_id)
            .collect();
        assert_eq!(ids, vec!["S-1", "S-10", "S-2"]);
    }

    #[tokio::test]
    async fn test_closed_pool_is_store_unavailable() {
        let (_dir, store) = open_store().await;
        store.pool().close().await;

        let err = store.scan_all().await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
