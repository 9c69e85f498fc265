//! Markdown export
//!
//! Generates a human-readable markdown document with a metadata section
//! followed by one section per record.

use crate::output::display_timestamp;
use crate::record::{AggregateMetadata, ExtractedRecord};

/// Formats records as markdown
///
/// # Arguments
///
/// * `metadata` - Run-level counters and query context
/// * `records` - Records in admission order
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown(metadata: &AggregateMetadata, records: &[ExtractedRecord]) -> String {
    let mut md = String::new();

    md.push_str("# Listing Harvest Results\n\n");

    md.push_str("## Metadata\n");
    md.push_str(&format!(
        "- **Collected**: {}\n",
        display_timestamp(&metadata.collected_at)
    ));
    md.push_str(&format!(
        "- **Search Query**: {}\n",
        metadata.query.search_query.as_deref().unwrap_or("Not specified")
    ));
    md.push_str(&format!(
        "- **Location**: {}\n",
        metadata.query.location.as_deref().unwrap_or("All locations")
    ));
    md.push_str(&format!("- **Total Records**: {}\n", metadata.total));
    md.push_str(&format!("- **Successful**: {}\n", metadata.successful));
    md.push_str(&format!("- **Failed**: {}\n", metadata.failed));
    if metadata.duplicates_skipped > 0 {
        md.push_str(&format!(
            "- **Duplicates Skipped**: {}\n",
            metadata.duplicates_skipped
        ));
    }
    md.push_str(&format!(
        "- **Time Elapsed**: {}\n",
        metadata.elapsed_display()
    ));
    md.push_str("\n---\n\n");

    for record in records {
        if let Some(reason) = record.status.reason() {
            md.push_str(&format!(
                "## Record #{} - Extraction Failed\n",
                record.sequence_number
            ));
            if !record.title().is_empty() {
                md.push_str(&format!("**Title**: {}\n", record.title()));
            }
            md.push_str(&format!("> Error: {}\n", reason));
        } else {
            format_record(&mut md, record);
        }
        md.push_str("\n---\n\n");
    }

    md
}

fn format_record(md: &mut String, record: &ExtractedRecord) {
    let fields = &record.fields;

    md.push_str(&format!(
        "## Record #{}: {}\n\n",
        record.sequence_number,
        record.title()
    ));

    if let Some(organization) = &fields.organization {
        md.push_str(&format!("**Organization**: {}\n", organization));
    }
    md.push_str(&format!(
        "**Location**: {}\n",
        fields.location.as_deref().unwrap_or("Not specified")
    ));
    if let Some(posted) = &fields.posted_date {
        md.push_str(&format!("**Posted**: {}\n", posted));
    }
    if let Some(count) = &fields.application_count {
        md.push_str(&format!("**Applications**: {}\n", count));
    }
    if let Some(skills) = &fields.skills_match {
        md.push_str(&format!("**Skills Match**: {}\n", skills));
    }
    if let Some(url) = &fields.url {
        md.push_str(&format!("**Link**: <{}>\n", url));
    }
    if record.low_confidence {
        md.push_str("\n> Note: detail view was not confirmed ready; fields may be incomplete\n");
    }

    md.push_str("\n### Description\n\n");
    md.push_str(fields.description.as_deref().unwrap_or(""));
    md.push('\n');

    if !fields.insights.is_empty() {
        md.push_str("\n### Insights\n");
        for insight in &fields.insights {
            md.push_str(&format!("- {}\n", insight));
        }
    }

    if !fields.extras.is_empty() {
        md.push_str("\n### Additional Fields\n");
        for (name, value) in &fields.extras {
            md.push_str(&format!("- **{}**: {}\n", name, value));
        }
    }
}
