use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::classifier::SentimentLabel;

/// Failures at the storage boundary, split so callers can tell a rejected
/// write from a failed read and degrade accordingly.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open record store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to write record: {0}")]
    Write(#[source] rusqlite::Error),
    #[error("failed to read records: {0}")]
    Read(#[source] rusqlite::Error),
    /// A stored row holds a label string neither variant recognizes.
    /// Surfaced instead of silently defaulting a sentiment.
    #[error("record store holds an unrecognized label: {0}")]
    Corrupt(String),
}

/// One durably stored complaint with its classification outcome. Immutable
/// once appended; the store never updates or deletes rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintRecord {
    pub submitter_id: String,
    pub text: String,
    pub label: SentimentLabel,
    /// Percentage with two-decimal precision, e.g. `"90.00"`. Stored as
    /// text so what reviewers see is exactly what was computed.
    pub confidence: String,
}

/// Append-and-query store over a single SQLite table. Every call opens and
/// closes its own connection; SQLite's transactional guarantees serialize
/// concurrent writers, and no long-lived handle can pin a lock across
/// requests.
#[derive(Debug, Clone)]
pub struct RecordStore {
    db_path: PathBuf,
}

impl RecordStore {
    /// Human-facing column labels for tabular display of `list_all`
    /// results, in projection order.
    pub const DISPLAY_COLUMNS: [&'static str; 4] =
        ["Author", "Complaint", "Sentiment", "Confidence"];

    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.db_path).map_err(|source| StoreError::Open {
            path: self.db_path.clone(),
            source,
        })?;
        // Concurrent writers queue on SQLite's lock instead of surfacing
        // SQLITE_BUSY to the caller.
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|source| StoreError::Open {
                path: self.db_path.clone(),
                source,
            })?;
        Ok(conn)
    }

    /// Creates the complaints table if it does not exist. Idempotent; safe
    /// to call on every process start.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS complaints(
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                label TEXT NOT NULL,
                confidence TEXT NOT NULL
            )",
            [],
        )
        .map_err(StoreError::Write)?;
        debug!("record store schema ensured at {:?}", self.db_path);
        Ok(())
    }

    /// Durably appends one record. A single-statement SQLite insert either
    /// fully commits or leaves the table unchanged; there is no partial-row
    /// outcome.
    pub fn append(&self, record: &ComplaintRecord) -> Result<(), StoreError> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO complaints(id, text, label, confidence) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.submitter_id,
                record.text,
                record.label.to_string(),
                record.confidence
            ],
        )
        .map_err(StoreError::Write)?;
        Ok(())
    }

    /// Returns every record in insertion order. A full scan; the expected
    /// volume is a reviewer submitting complaints over time, not a firehose.
    pub fn list_all(&self) -> Result<Vec<ComplaintRecord>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT id, text, label, confidence FROM complaints ORDER BY rowid")
            .map_err(StoreError::Read)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(StoreError::Read)?;

        let mut records = Vec::new();
        for row in rows {
            let (submitter_id, text, label, confidence) = row.map_err(StoreError::Read)?;
            let label = label
                .parse::<SentimentLabel>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            records.push(ComplaintRecord {
                submitter_id,
                text,
                label,
                confidence,
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = RecordStore::new(dir.path().join("complaints.db"));
        store.ensure_schema().expect("Failed to create schema");
        (dir, store)
    }

    fn sample_record(id: &str) -> ComplaintRecord {
        ComplaintRecord {
            submitter_id: id.to_string(),
            text: "Muito bom atendimento".to_string(),
            label: SentimentLabel::Positive,
            confidence: "90.00".to_string(),
        }
    }

    #[test]
    fn test_schema_is_idempotent() {
        let (_dir, store) = scratch_store();
        assert!(store.ensure_schema().is_ok());
        assert!(store.ensure_schema().is_ok());
    }

    #[test]
    fn test_append_then_list_round_trips() {
        let (_dir, store) = scratch_store();
        let record = sample_record("SIGU000001");
        store.append(&record).unwrap();

        let records = store.list_all().unwrap();
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let (_dir, store) = scratch_store();
        for i in 0..5 {
            let mut record = sample_record(&format!("SIGU00000{}", i));
            record.confidence = format!("{}.00", 10 + i);
            store.append(&record).unwrap();
        }

        let ids: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.submitter_id)
            .collect();
        assert_eq!(
            ids,
            ["SIGU000000", "SIGU000001", "SIGU000002", "SIGU000003", "SIGU000004"]
        );
    }

    #[test]
    fn test_repeat_submitters_are_allowed() {
        let (_dir, store) = scratch_store();
        store.append(&sample_record("SIGU000001")).unwrap();
        store.append(&sample_record("SIGU000001")).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_unrecognized_label_surfaces_corrupt() {
        let (_dir, store) = scratch_store();
        let conn = Connection::open(store.db_path()).unwrap();
        conn.execute(
            "INSERT INTO complaints(id, text, label, confidence) VALUES (?1, ?2, ?3, ?4)",
            params!["SIGU000001", "texto", "Neutral", "50.00"],
        )
        .unwrap();

        let err = store.list_all().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_write_to_unwritable_path_fails() {
        let store = RecordStore::new("/nonexistent-dir/complaints.db");
        let err = store.ensure_schema().unwrap_err();
        assert!(matches!(err, StoreError::Open { .. }));
    }
}
