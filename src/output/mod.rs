//! Output module for rendering harvested records
//!
//! This module handles:
//! - Rendering the aggregate as plain text, markdown, JSON or delimited text
//! - Writing exports to disk
//! - Printing checkpoint summaries

mod delimited;
mod json;
mod markdown;
mod plain;
pub mod stats;

pub use stats::{format_checkpoint_summary, print_checkpoint_summary};

use crate::record::{AggregateMetadata, ExtractedRecord};
use crate::HarvestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Export representation of the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Plain,
    Markdown,
    Json,
    /// Tab-separated rows of successful records
    Delimited,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Delimited => "delimited",
        }
    }

    /// Conventional file extension for the representation
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Plain => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Delimited => "tsv",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "delimited" | "tsv" | "csv" => Ok(Self::Delimited),
            other => Err(format!(
                "unknown export format '{}' (expected plain, markdown, json or delimited)",
                other
            )),
        }
    }
}

/// Renders records in the requested representation
///
/// Pure function: identical inputs always produce identical output. All
/// timestamps come from the metadata and the records, never from the clock.
///
/// # Arguments
///
/// * `metadata` - Run-level counters and query context
/// * `records` - Records in admission order
/// * `kind` - Output representation
pub fn format(metadata: &AggregateMetadata, records: &[ExtractedRecord], kind: ExportKind) -> String {
    match kind {
        ExportKind::Plain => plain::format_plain(metadata, records),
        ExportKind::Markdown => markdown::format_markdown(metadata, records),
        ExportKind::Json => json::format_json(metadata, records),
        ExportKind::Delimited => delimited::format_delimited(records),
    }
}

/// Renders records and writes them to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the export
/// * `Err(HarvestError)` - Failed to create or write the file
pub fn write_export(
    metadata: &AggregateMetadata,
    records: &[ExtractedRecord],
    kind: ExportKind,
    output_path: &Path,
) -> Result<(), HarvestError> {
    let rendered = format(metadata, records, kind);

    let mut file = File::create(output_path)?;
    file.write_all(rendered.as_bytes())?;

    Ok(())
}

/// Resolves the export destination
///
/// A path without an extension gets the conventional one for `kind`.
pub fn export_path(path: &Path, kind: ExportKind) -> PathBuf {
    let mut resolved = path.to_path_buf();
    if resolved.extension().is_none() {
        resolved.set_extension(kind.extension());
    }
    resolved
}

/// Timestamp layout shared by the text renderers
pub(crate) fn display_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
