use crate::record::{AggregateMetadata, ExtractedRecord};
use serde::Serialize;

#[derive(Serialize)]
struct JsonExport<'a> {
    metadata: &'a AggregateMetadata,
    records: &'a [ExtractedRecord],
}

/// Formats records as a pretty-printed `{metadata, records}` document
pub fn format_json(metadata: &AggregateMetadata, records: &[ExtractedRecord]) -> String {
    let export = JsonExport { metadata, records };
    serde_json::to_string_pretty(&export)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}
