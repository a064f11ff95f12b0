//! Florilegium Storage Layer
//!
//! Implements the [`CandidateStore`] trait on SQLite.
//!
//! # Architecture
//!
//! - One `candidates` row and one `approvals` row per quote, written together
//! - `(source_identifier, quote_text)` is a UNIQUE index; inserts use
//!   `ON CONFLICT DO NOTHING` so re-extraction never duplicates a quote
//! - Status transitions are conditional updates (`WHERE status = 'PENDING'`),
//!   so APPROVED and DECLINED rows can never flip
//! - `groups` and `memberships` are written per group in a single transaction
//! - `checkpoints` holds one resume marker per document
//!
//! # Examples
//!
//! ```no_run
//! use florilegium_store::SqliteStore;
//!
//! let store = SqliteStore::new("florilegium.db").unwrap();
//! // Store is now ready for candidate operations
//! ```

#![warn(missing_docs)]

use florilegium_domain::traits::{CandidateStore, InsertOutcome, StatusCounts};
use florilegium_domain::{
    unix_now, AdditionalInfo, Approval, ApprovalStatus, Candidate, CandidateId, Checkpoint,
    DecisionPath, Group, GroupId, Membership, NewCandidate, RunId,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// additional_info could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Candidate not found
    #[error("Candidate not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Requested status change is not a legal transition
    #[error("Invalid status transition to {0}")]
    InvalidTransition(ApprovalStatus),
}

const CANDIDATE_COLUMNS: &str = "c.id, c.source_identifier, c.quote_text, c.speaker, c.context, \
     c.topic, c.additional_info, c.created_at";

/// SQLite-based implementation of CandidateStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. The orchestrators share one store
/// behind a mutex; separate processes should each open their own store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use florilegium_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("florilegium.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }
}

fn conversion_error(column: usize, ty: Type, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, ty, msg.into())
}

fn candidate_id_at(row: &Row<'_>, column: usize) -> rusqlite::Result<CandidateId> {
    let bytes: Vec<u8> = row.get(column)?;
    CandidateId::from_bytes(&bytes).map_err(|e| conversion_error(column, Type::Blob, e))
}

fn group_id_at(row: &Row<'_>, column: usize) -> rusqlite::Result<GroupId> {
    let bytes: Vec<u8> = row.get(column)?;
    GroupId::from_bytes(&bytes).map_err(|e| conversion_error(column, Type::Blob, e))
}

fn run_id_at(row: &Row<'_>, column: usize) -> rusqlite::Result<RunId> {
    let bytes: Vec<u8> = row.get(column)?;
    RunId::from_bytes(&bytes).map_err(|e| conversion_error(column, Type::Blob, e))
}

fn row_to_candidate(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    let info: Option<String> = row.get(6)?;
    let additional_info = match info {
        Some(json) => serde_json::from_str::<AdditionalInfo>(&json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
        None => AdditionalInfo::default(),
    };
    Ok(Candidate {
        id: candidate_id_at(row, 0)?,
        source_identifier: row.get(1)?,
        quote_text: row.get(2)?,
        speaker: row.get(3)?,
        context: row.get(4)?,
        topic: row.get(5)?,
        additional_info,
        created_at: row.get::<_, i64>(7)? as u64,
    })
}

fn row_to_approval(row: &Row<'_>) -> rusqlite::Result<Approval> {
    let status: String = row.get(1)?;
    let status = ApprovalStatus::parse(&status)
        .ok_or_else(|| conversion_error(1, Type::Text, format!("Unknown status: {}", status)))?;
    let via: Option<String> = row.get(3)?;
    let decided_via = match via {
        Some(v) => Some(
            DecisionPath::parse(&v)
                .ok_or_else(|| conversion_error(3, Type::Text, format!("Unknown path: {}", v)))?,
        ),
        None => None,
    };
    Ok(Approval {
        candidate_id: candidate_id_at(row, 0)?,
        status,
        decided_at: row.get::<_, Option<i64>>(2)?.map(|t| t as u64),
        decided_via,
        note: row.get(4)?,
    })
}

fn find_group(conn: &Connection, run_id: RunId, label: &str) -> Result<Option<GroupId>, StoreError> {
    let id = conn
        .query_row(
            "SELECT id FROM \"groups\" WHERE run_id = ?1 AND label = ?2",
            params![run_id.to_bytes(), label],
            |row| group_id_at(row, 0),
        )
        .optional()?;
    Ok(id)
}

fn get_or_create_group(conn: &Connection, run_id: RunId, label: &str) -> Result<GroupId, StoreError> {
    conn.execute(
        "INSERT INTO \"groups\" (id, label, run_id, created_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(run_id, label) DO NOTHING",
        params![GroupId::new().to_bytes(), label, run_id.to_bytes(), unix_now() as i64],
    )?;
    find_group(conn, run_id, label)?
        .ok_or_else(|| StoreError::NotFound(format!("group {:?} after insert", label)))
}

fn insert_membership(conn: &Connection, membership: Membership) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO memberships (candidate_id, group_id) VALUES (?1, ?2)",
        params![
            membership.candidate_id.to_bytes(),
            membership.group_id.to_bytes()
        ],
    )?;
    Ok(changed == 1)
}

fn transition(
    conn: &Connection,
    candidate_id: CandidateId,
    status: ApprovalStatus,
    via: DecisionPath,
    note: Option<&str>,
) -> Result<bool, StoreError> {
    if !ApprovalStatus::Pending.can_transition_to(status) {
        return Err(StoreError::InvalidTransition(status));
    }
    let changed = conn.execute(
        "UPDATE approvals SET status = ?2, decided_at = ?3, decided_via = ?4, note = ?5
         WHERE candidate_id = ?1 AND status = 'PENDING'",
        params![
            candidate_id.to_bytes(),
            status.as_str(),
            unix_now() as i64,
            via.as_str(),
            note
        ],
    )?;
    Ok(changed == 1)
}

impl CandidateStore for SqliteStore {
    type Error = StoreError;

    fn insert_candidate_if_absent(
        &mut self,
        candidate: NewCandidate,
    ) -> Result<InsertOutcome, Self::Error> {
        let info = if candidate.additional_info.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&candidate.additional_info)?)
        };
        let id = CandidateId::new();

        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO candidates (id, source_identifier, quote_text, speaker, context, topic,
                                     additional_info, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(source_identifier, quote_text) DO NOTHING",
            params![
                id.to_bytes(),
                candidate.source_identifier,
                candidate.quote_text,
                candidate.speaker,
                candidate.context,
                candidate.topic,
                info,
                unix_now() as i64,
            ],
        )?;
        if inserted == 0 {
            debug!(source = %candidate.source_identifier, "duplicate candidate absorbed");
            return Ok(InsertOutcome::Duplicate);
        }
        tx.execute(
            "INSERT INTO approvals (candidate_id, status) VALUES (?1, 'PENDING')",
            params![id.to_bytes()],
        )?;
        tx.commit()?;
        Ok(InsertOutcome::Created(id))
    }

    fn get_pending(&self) -> Result<Vec<Candidate>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM candidates c
             JOIN approvals a ON a.candidate_id = c.id
             WHERE a.status = 'PENDING'
             ORDER BY c.rowid",
            CANDIDATE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_candidate)?;
        let candidates = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(candidates)
    }

    fn set_approval(
        &mut self,
        candidate_id: CandidateId,
        status: ApprovalStatus,
        via: DecisionPath,
        note: Option<&str>,
    ) -> Result<bool, Self::Error> {
        if transition(&self.conn, candidate_id, status, via, note)? {
            return Ok(true);
        }
        if self.get_approval(candidate_id)?.is_none() {
            return Err(StoreError::NotFound(candidate_id.to_string()));
        }
        debug!(candidate = %candidate_id, "approval already terminal, left unchanged");
        Ok(false)
    }

    fn create_group(&mut self, run_id: RunId, label: &str) -> Result<GroupId, Self::Error> {
        get_or_create_group(&self.conn, run_id, label)
    }

    fn add_membership(&mut self, membership: Membership) -> Result<bool, Self::Error> {
        insert_membership(&self.conn, membership)
    }

    fn commit_group(
        &mut self,
        run_id: RunId,
        label: &str,
        members: &[CandidateId],
    ) -> Result<(GroupId, Vec<CandidateId>), Self::Error> {
        let tx = self.conn.transaction()?;
        // The group row is only written once a member qualifies
        let mut group_id: Option<GroupId> = None;

        let mut promoted = Vec::with_capacity(members.len());
        for &candidate_id in members {
            let eligible: bool = tx
                .query_row(
                    "SELECT a.status = 'PENDING'
                        AND NOT EXISTS (SELECT 1 FROM memberships m WHERE m.candidate_id = a.candidate_id)
                     FROM approvals a WHERE a.candidate_id = ?1",
                    params![candidate_id.to_bytes()],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or(false);
            if !eligible {
                continue;
            }
            let group_id = match group_id {
                Some(id) => id,
                None => *group_id.insert(get_or_create_group(&tx, run_id, label)?),
            };
            insert_membership(
                &tx,
                Membership {
                    candidate_id,
                    group_id,
                },
            )?;
            if transition(
                &tx,
                candidate_id,
                ApprovalStatus::Approved,
                DecisionPath::Grouping,
                None,
            )? {
                promoted.push(candidate_id);
            }
        }
        let group_id = match group_id {
            Some(id) => id,
            None => find_group(&tx, run_id, label)?.unwrap_or_else(GroupId::new),
        };
        tx.commit()?;
        Ok((group_id, promoted))
    }

    fn save_checkpoint(
        &mut self,
        source_path: &str,
        last_processed_chunk_index: usize,
    ) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO checkpoints (source_path, last_processed_chunk_index, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(source_path) DO UPDATE SET
                last_processed_chunk_index = excluded.last_processed_chunk_index,
                updated_at = excluded.updated_at",
            params![
                source_path,
                last_processed_chunk_index as i64,
                unix_now() as i64
            ],
        )?;
        Ok(())
    }

    fn load_checkpoint(&self, source_path: &str) -> Result<Option<Checkpoint>, Self::Error> {
        let checkpoint = self
            .conn
            .query_row(
                "SELECT source_path, last_processed_chunk_index, updated_at
                 FROM checkpoints WHERE source_path = ?1",
                params![source_path],
                |row| {
                    Ok(Checkpoint {
                        source_path: row.get(0)?,
                        last_processed_chunk_index: row.get::<_, i64>(1)? as usize,
                        updated_at: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(checkpoint)
    }

    fn clear_checkpoint(&mut self, source_path: &str) -> Result<bool, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM checkpoints WHERE source_path = ?1",
            params![source_path],
        )?;
        Ok(deleted > 0)
    }

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, Self::Error> {
        let sql = format!("SELECT {} FROM candidates c WHERE c.id = ?1", CANDIDATE_COLUMNS);
        let candidate = self
            .conn
            .query_row(&sql, params![id.to_bytes()], row_to_candidate)
            .optional()?;
        Ok(candidate)
    }

    fn get_approval(&self, id: CandidateId) -> Result<Option<Approval>, Self::Error> {
        let approval = self
            .conn
            .query_row(
                "SELECT candidate_id, status, decided_at, decided_via, note
                 FROM approvals WHERE candidate_id = ?1",
                params![id.to_bytes()],
                row_to_approval,
            )
            .optional()?;
        Ok(approval)
    }

    fn count_candidates(&self) -> Result<usize, Self::Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn status_counts(&self) -> Result<StatusCounts, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM approvals GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row?;
            match ApprovalStatus::parse(&status) {
                Some(ApprovalStatus::Pending) => counts.pending = count,
                Some(ApprovalStatus::Approved) => counts.approved = count,
                Some(ApprovalStatus::Declined) => counts.declined = count,
                None => {
                    return Err(StoreError::InvalidData(format!(
                        "Unknown status: {}",
                        status
                    )))
                }
            }
        }
        Ok(counts)
    }

    fn approvals_missing(&self) -> Result<usize, Self::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM candidates c
             LEFT JOIN approvals a ON a.candidate_id = c.id
             WHERE a.candidate_id IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn groups_for_run(&self, run_id: RunId) -> Result<Vec<Group>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, label, run_id, created_at FROM \"groups\"
             WHERE run_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![run_id.to_bytes()], |row| {
            Ok(Group {
                id: group_id_at(row, 0)?,
                label: row.get(1)?,
                run_id: run_id_at(row, 2)?,
                created_at: row.get::<_, i64>(3)? as u64,
            })
        })?;
        let groups = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    fn memberships_for_group(&self, group_id: GroupId) -> Result<Vec<Membership>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT candidate_id, group_id FROM memberships
             WHERE group_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![group_id.to_bytes()], |row| {
            Ok(Membership {
                candidate_id: candidate_id_at(row, 0)?,
                group_id: group_id_at(row, 1)?,
            })
        })?;
        let memberships = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(source: &str, text: &str) -> NewCandidate {
        NewCandidate {
            source_identifier: source.to_string(),
            quote_text: text.to_string(),
            speaker: None,
            context: None,
            topic: None,
            additional_info: AdditionalInfo::default(),
        }
    }

    #[test]
    fn test_store_creation() {
        let store = SqliteStore::in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_pending_in_creation_order() {
        let mut store = SqliteStore::in_memory().unwrap();
        for text in ["first", "second", "third"] {
            store.insert_candidate_if_absent(quote("Ch. 1 | p.1", text)).unwrap();
        }
        let texts: Vec<_> = store
            .get_pending()
            .unwrap()
            .into_iter()
            .map(|c| c.quote_text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_additional_info_survives_storage() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut candidate = quote("Ch. 2 | p.4", "Seek knowledge from the cradle to the grave.");
        candidate.additional_info.scripture_reference = Some("20:114".to_string());
        candidate
            .additional_info
            .extra
            .insert("narrator".to_string(), "unknown".to_string());

        let id = match store.insert_candidate_if_absent(candidate).unwrap() {
            InsertOutcome::Created(id) => id,
            InsertOutcome::Duplicate => panic!("expected a new candidate"),
        };
        let stored = store.get_candidate(id).unwrap().unwrap();
        assert_eq!(stored.additional_info.scripture_reference.as_deref(), Some("20:114"));
        assert_eq!(stored.additional_info.extra["narrator"], "unknown");
    }

    #[test]
    fn test_set_approval_rejects_pending_target() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = match store.insert_candidate_if_absent(quote("s", "q")).unwrap() {
            InsertOutcome::Created(id) => id,
            InsertOutcome::Duplicate => panic!("expected a new candidate"),
        };
        let result = store.set_approval(id, ApprovalStatus::Pending, DecisionPath::Judgment, None);
        assert!(matches!(result, Err(StoreError::InvalidTransition(_))));
    }

    #[test]
    fn test_set_approval_unknown_candidate() {
        let mut store = SqliteStore::in_memory().unwrap();
        let result = store.set_approval(
            CandidateId::new(),
            ApprovalStatus::Approved,
            DecisionPath::Judgment,
            None,
        );
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
