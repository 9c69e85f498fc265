use crate::output::display_timestamp;
use crate::record::{AggregateMetadata, ExtractedRecord};

const RULE_WIDTH: usize = 80;
const BANNER_WIDTH: usize = 30;

/// Formats records as plain text
pub fn format_plain(metadata: &AggregateMetadata, records: &[ExtractedRecord]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let banner = "=".repeat(BANNER_WIDTH);
    let mut out = String::new();

    out.push_str("Listing Harvest Results\n");
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!(
        "Collected: {}\n",
        display_timestamp(&metadata.collected_at)
    ));
    out.push_str(&format!("Total Records: {}\n", metadata.total));
    out.push_str(&format!("Successful: {}\n", metadata.successful));
    out.push_str(&format!("Failed: {}\n", metadata.failed));
    out.push_str(&rule);
    out.push_str("\n\n");

    for record in records {
        if let Some(reason) = record.status.reason() {
            out.push_str(&format!(
                "RECORD #{} - EXTRACTION FAILED\n",
                record.sequence_number
            ));
            if !record.title().is_empty() {
                out.push_str(&format!("Title: {}\n", record.title()));
            }
            out.push_str(&format!("Error: {}\n", reason));
        } else {
            let fields = &record.fields;
            out.push_str(&format!(
                "{} RECORD #{} {}\n",
                banner, record.sequence_number, banner
            ));
            out.push_str(&format!("Title: {}\n", record.title()));
            if let Some(organization) = &fields.organization {
                out.push_str(&format!("Organization: {}\n", organization));
            }
            out.push_str(&format!(
                "Location: {}\n",
                fields.location.as_deref().unwrap_or("Not specified")
            ));
            if let Some(posted) = &fields.posted_date {
                out.push_str(&format!("Posted: {}\n", posted));
            }
            if let Some(count) = &fields.application_count {
                out.push_str(&format!("Applications: {}\n", count));
            }
            if let Some(skills) = &fields.skills_match {
                out.push_str(&format!("Skills Match: {}\n", skills));
            }
            out.push_str("\nDESCRIPTION:\n");
            out.push_str(fields.description.as_deref().unwrap_or(""));
            out.push('\n');

            if !fields.insights.is_empty() {
                out.push_str("\nINSIGHTS:\n");
                for insight in &fields.insights {
                    out.push_str(&format!("- {}\n", insight));
                }
            }
        }
        out.push_str("\n\n");
    }

    out
}
