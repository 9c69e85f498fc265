//! Storage module for persisting crawl checkpoints
//!
//! This module handles checkpoint persistence, including:
//! - The `Checkpoint` snapshot model and its staleness rule
//! - The `CheckpointStore` trait consumed by the orchestrator
//! - A SQLite-backed store keyed by session, which also keeps the session's
//!   full record list

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCheckpointStore;
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::record::{AggregateMetadata, DedupKey, ExtractedRecord};
use crate::state::CrawlState;
use crate::HarvestError;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of most recent records carried in a checkpoint
pub const CHECKPOINT_RECORD_LIMIT: usize = 10;

/// Checkpoints older than this are discarded on load
pub const SESSION_MAX_AGE_HOURS: i64 = 24;

/// Opens the checkpoint database at `path` for the given session key
pub fn open_store(path: &Path, session_key: &str) -> Result<SqliteCheckpointStore, HarvestError> {
    SqliteCheckpointStore::new(path, session_key)
}

/// A bounded snapshot of crawl progress
///
/// Holds the crawl state plus the last few records. The full record list is
/// stored separately through [`CheckpointStore::save_records`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    pub saved_at: DateTime<Utc>,

    /// Hash of the configuration the run was started with
    pub config_hash: Option<String>,

    pub state: CrawlState,
    pub metadata: AggregateMetadata,

    /// Most recent records, oldest first
    pub recent_records: Vec<ExtractedRecord>,

    /// Content keys admitted so far, so duplicates stay skipped after a resume
    #[serde(default)]
    pub seen_keys: Vec<DedupKey>,
}

impl Checkpoint {
    /// Builds a checkpoint with a fresh session identifier
    ///
    /// `recent_records` is truncated to its last `CHECKPOINT_RECORD_LIMIT` entries.
    pub fn new(
        state: CrawlState,
        metadata: AggregateMetadata,
        recent_records: Vec<ExtractedRecord>,
        seen_keys: Vec<DedupKey>,
        config_hash: Option<String>,
    ) -> Self {
        Self::for_session(
            new_session_id(),
            state,
            metadata,
            recent_records,
            seen_keys,
            config_hash,
        )
    }

    /// Builds a checkpoint belonging to an existing session
    pub fn for_session(
        session_id: String,
        state: CrawlState,
        metadata: AggregateMetadata,
        mut recent_records: Vec<ExtractedRecord>,
        seen_keys: Vec<DedupKey>,
        config_hash: Option<String>,
    ) -> Self {
        if recent_records.len() > CHECKPOINT_RECORD_LIMIT {
            let excess = recent_records.len() - CHECKPOINT_RECORD_LIMIT;
            recent_records.drain(..excess);
        }

        Self {
            session_id,
            saved_at: Utc::now(),
            config_hash,
            state,
            metadata,
            recent_records,
            seen_keys,
        }
    }

    /// Returns the age of the checkpoint relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.saved_at)
    }

    /// Returns true if the checkpoint is too old to resume from
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > Duration::hours(SESSION_MAX_AGE_HOURS)
    }
}

/// Generates a session identifier of the form `harvest_<millis>_<random>`
pub fn new_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("harvest_{}_{}", Utc::now().timestamp_millis(), suffix)
}
