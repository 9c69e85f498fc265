//! Listing-Harvester: an incremental, checkpointed listing crawler
//!
//! This crate walks a paginated, lazily-rendered listing surface one item at a
//! time, extracts a structured record per item, deduplicates the results and
//! renders them in several export formats. The live environment is reached
//! only through the [`crawler::PageAccessor`] trait and progress is persisted
//! through the [`storage::CheckpointStore`] trait.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod source;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Listing-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Result type alias for Listing-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEvent, CrawlHandle, CrawlOrchestrator, PageAccessor, RunOutcome};
pub use output::ExportKind;
pub use record::{ExtractedRecord, RecordStatus, ResultAggregator};
pub use state::{CrawlPhase, CrawlState};
pub use storage::{Checkpoint, CheckpointStore, SqliteCheckpointStore};
