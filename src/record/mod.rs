//! Record model for harvested listing items
//!
//! This module contains:
//! - `DetailFields`: the open field set extracted from an item's detail view
//! - `ExtractedRecord`: one processed work item, successful or failed
//! - `DedupTracker`: content-based duplicate detection
//! - `AggregateMetadata` / `QueryContext`: run-level counters and query info
//! - `ResultAggregator`: the ordered, append-only record collection

mod aggregator;
mod dedup;
mod metadata;

pub use aggregator::ResultAggregator;
pub use dedup::{DedupKey, DedupTracker};
pub use metadata::{format_elapsed, AggregateMetadata, QueryContext};

use crate::config::ExtractionConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum description length (in characters) of a valid record
pub const MIN_DESCRIPTION_CHARS: usize = 50;

/// Fields extracted from an item's detail view
///
/// `title` and `description` are mandatory for a successful record; the rest
/// is optional and may be dropped by the extraction settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFields {
    pub title: Option<String>,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub posted_date: Option<String>,
    pub application_count: Option<String>,
    pub skills_match: Option<String>,

    /// Short highlight lines, in display order
    #[serde(default)]
    pub insights: Vec<String>,

    /// Address of the detail view the fields were read from
    pub url: Option<String>,

    /// Source-specific fields outside the common schema
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
}

impl DetailFields {
    /// Checks the mandatory fields
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Title is present and the description is long enough
    /// * `Err(reason)` - Human-readable rejection reason
    pub fn validate(&self) -> Result<(), String> {
        let title = self.title.as_deref().map(str::trim).unwrap_or("");
        if title.is_empty() {
            return Err("missing title".to_string());
        }

        let description = self.description.as_deref().map(str::trim).unwrap_or("");
        if description.is_empty() {
            return Err("missing description".to_string());
        }

        let chars = description.chars().count();
        if chars < MIN_DESCRIPTION_CHARS {
            return Err(format!(
                "description too short ({} < {} characters)",
                chars, MIN_DESCRIPTION_CHARS
            ));
        }

        Ok(())
    }

    /// Drops optional fields the extraction settings exclude
    pub fn apply_filter(&mut self, settings: &ExtractionConfig) {
        if !settings.include_company_info {
            self.organization = None;
        }
        if !settings.include_location {
            self.location = None;
        }
        if !settings.include_posted_date {
            self.posted_date = None;
        }
        if !settings.include_application_count {
            self.application_count = None;
        }
        if !settings.include_skills_match {
            self.skills_match = None;
        }
    }
}

/// Outcome of processing one work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Ok,
    Failed(String),
}

impl RecordStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

/// The record produced for one work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// 1-based position in the aggregate; 0 until admitted
    pub sequence_number: u64,

    /// Identifier of the work item this record came from
    pub item_id: String,

    pub fields: DetailFields,
    pub status: RecordStatus,
    pub captured_at: DateTime<Utc>,

    /// The detail view never reported ready before extraction
    #[serde(default)]
    pub low_confidence: bool,

    /// Number of extraction attempts made
    #[serde(default)]
    pub attempts: u32,
}

impl ExtractedRecord {
    /// Creates a successful record
    pub fn ok(item_id: impl Into<String>, fields: DetailFields) -> Self {
        Self {
            sequence_number: 0,
            item_id: item_id.into(),
            fields,
            status: RecordStatus::Ok,
            captured_at: Utc::now(),
            low_confidence: false,
            attempts: 1,
        }
    }

    /// Creates a failed record
    ///
    /// `fields` keeps whatever is known about the item (usually the card
    /// text) so failures remain identifiable in reports.
    pub fn failed(item_id: impl Into<String>, fields: DetailFields, reason: impl Into<String>) -> Self {
        Self {
            sequence_number: 0,
            item_id: item_id.into(),
            fields,
            status: RecordStatus::Failed(reason.into()),
            captured_at: Utc::now(),
            low_confidence: false,
            attempts: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn title(&self) -> &str {
        self.fields.title.as_deref().unwrap_or("")
    }

    pub fn organization(&self) -> &str {
        self.fields.organization.as_deref().unwrap_or("")
    }

    /// Content key used for duplicate detection
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(self.title(), self.organization())
    }
}
