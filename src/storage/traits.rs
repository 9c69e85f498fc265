//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::record::ExtractedRecord;
use crate::storage::Checkpoint;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backends
///
/// A store holds at most one checkpoint for the session key it was opened
/// with, plus the full record list of that session. Saving replaces the
/// previous checkpoint.
pub trait CheckpointStore {
    /// Writes a checkpoint, replacing any previous one
    fn save(&mut self, checkpoint: &Checkpoint) -> StorageResult<()>;

    /// Writes every record admitted by `session_id`, replacing any previous list
    fn save_records(&mut self, session_id: &str, records: &[ExtractedRecord]) -> StorageResult<()>;

    /// Reads the record list written for `session_id`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(records))` - Records in admission order
    /// * `Ok(None)` - No list stored for that session
    fn load_records(&self, session_id: &str) -> StorageResult<Option<Vec<ExtractedRecord>>>;

    /// Reads the stored checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Some(checkpoint))` - A checkpoint exists
    /// * `Ok(None)` - Nothing stored for this session key
    fn load(&self) -> StorageResult<Option<Checkpoint>>;

    /// Deletes the stored checkpoint and record list, if any
    fn clear(&mut self) -> StorageResult<()>;
}

impl<S: CheckpointStore + ?Sized> CheckpointStore for Box<S> {
    fn save(&mut self, checkpoint: &Checkpoint) -> StorageResult<()> {
        (**self).save(checkpoint)
    }

    fn load(&self) -> StorageResult<Option<Checkpoint>> {
        (**self).load()
    }

    fn save_records(&mut self, session_id: &str, records: &[ExtractedRecord]) -> StorageResult<()> {
        (**self).save_records(session_id, records)
    }

    fn load_records(&self, session_id: &str) -> StorageResult<Option<Vec<ExtractedRecord>>> {
        (**self).load_records(session_id)
    }

    fn clear(&mut self) -> StorageResult<()> {
        (**self).clear()
    }
}
