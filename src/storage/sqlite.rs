//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CheckpointStore trait.

use crate::record::ExtractedRecord;
use crate::state::CrawlPhase;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CheckpointStore, StorageResult};
use crate::storage::Checkpoint;
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite checkpoint backend
pub struct SqliteCheckpointStore {
    conn: Connection,
    session_key: String,
}

impl SqliteCheckpointStore {
    /// Opens (or creates) a checkpoint database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `session_key` - Key under which this process stores its checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteCheckpointStore)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path, session_key: &str) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            session_key: session_key.to_string(),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory(session_key: &str) -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            session_key: session_key.to_string(),
        })
    }
}

impl CheckpointStore for SqliteCheckpointStore {
    fn save(&mut self, checkpoint: &Checkpoint) -> StorageResult<()> {
        let snapshot = serde_json::to_string(checkpoint)?;

        self.conn.execute(
            "INSERT INTO checkpoints
                (session_key, session_id, saved_at, config_hash, phase,
                 current_page, items_processed, snapshot)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(session_key) DO UPDATE SET
                session_id = excluded.session_id,
                saved_at = excluded.saved_at,
                config_hash = excluded.config_hash,
                phase = excluded.phase,
                current_page = excluded.current_page,
                items_processed = excluded.items_processed,
                snapshot = excluded.snapshot",
            params![
                self.session_key,
                checkpoint.session_id,
                checkpoint.saved_at.to_rfc3339(),
                checkpoint.config_hash,
                checkpoint.state.phase.to_db_string(),
                checkpoint.state.current_page_index,
                checkpoint.state.items_processed_count as i64,
                snapshot,
            ],
        )?;

        Ok(())
    }

    fn load(&self) -> StorageResult<Option<Checkpoint>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT snapshot, phase FROM checkpoints WHERE session_key = ?1",
                params![self.session_key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((snapshot, phase)) = row else {
            return Ok(None);
        };

        let mut checkpoint: Checkpoint = serde_json::from_str(&snapshot)?;
        // The column is authoritative if the two ever disagree
        if let Some(phase) = CrawlPhase::from_db_string(&phase) {
            checkpoint.state.phase = phase;
        }

        Ok(Some(checkpoint))
    }

    fn save_records(&mut self, session_id: &str, records: &[ExtractedRecord]) -> StorageResult<()> {
        let encoded = serde_json::to_string(records)?;

        self.conn.execute(
            "INSERT INTO session_records
                (session_key, session_id, saved_at, record_count, records)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(session_key) DO UPDATE SET
                session_id = excluded.session_id,
                saved_at = excluded.saved_at,
                record_count = excluded.record_count,
                records = excluded.records",
            params![
                self.session_key,
                session_id,
                Utc::now().to_rfc3339(),
                records.len() as i64,
                encoded,
            ],
        )?;

        Ok(())
    }

    fn load_records(&self, session_id: &str) -> StorageResult<Option<Vec<ExtractedRecord>>> {
        let encoded: Option<String> = self
            .conn
            .query_row(
                "SELECT records FROM session_records
                 WHERE session_key = ?1 AND session_id = ?2",
                params![self.session_key, session_id],
                |row| row.get(0),
            )
            .optional()?;

        match encoded {
            Some(encoded) => Ok(Some(serde_json::from_str(&encoded)?)),
            None => Ok(None),
        }
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM checkpoints WHERE session_key = ?1",
            params![self.session_key],
        )?;
        self.conn.execute(
            "DELETE FROM session_records WHERE session_key = ?1",
            params![self.session_key],
        )?;
        Ok(())
    }
}
