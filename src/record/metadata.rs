use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Search terms and location filter the listing was produced from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub search_query: Option<String>,
    pub location: Option<String>,
}

/// Run-level information accompanying the records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateMetadata {
    #[serde(flatten)]
    pub query: QueryContext,

    /// When the collection started
    pub collected_at: DateTime<Utc>,

    /// Records admitted (successful plus failed)
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub duplicates_skipped: u64,

    /// Active crawl time in milliseconds
    pub elapsed_ms: u64,

    pub version: String,
}

impl AggregateMetadata {
    pub fn new(query: QueryContext) -> Self {
        Self {
            query,
            collected_at: Utc::now(),
            total: 0,
            successful: 0,
            failed: 0,
            duplicates_skipped: 0,
            elapsed_ms: 0,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Returns the elapsed time as `h:mm:ss` or `m:ss`
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed())
    }
}

/// Formats a duration as `h:mm:ss`, or `m:ss` below one hour
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
