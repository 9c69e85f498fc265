//! Database schema definitions
//!
//! This module contains the SQL schema for the Listing-Harvester checkpoint database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One checkpoint per session key; the snapshot column holds the full JSON
CREATE TABLE IF NOT EXISTS checkpoints (
    session_key TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    saved_at TEXT NOT NULL,
    config_hash TEXT,
    phase TEXT NOT NULL,
    current_page INTEGER NOT NULL,
    items_processed INTEGER NOT NULL,
    snapshot TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_checkpoints_saved_at ON checkpoints(saved_at);

-- Every record admitted by the session the checkpoint belongs to
CREATE TABLE IF NOT EXISTS session_records (
    session_key TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    saved_at TEXT NOT NULL,
    record_count INTEGER NOT NULL,
    records TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", get_schema_version())?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    2
}
