use crate::record::ExtractedRecord;

const SEPARATOR: &str = "\t";
const DESCRIPTION_PREVIEW_CHARS: usize = 500;

const HEADERS: [&str; 7] = [
    "Index",
    "Title",
    "Organization",
    "Location",
    "Posted Date",
    "Application Count",
    "Description Preview",
];

/// Formats successful records as tab-separated rows under a header row
pub fn format_delimited(records: &[ExtractedRecord]) -> String {
    let mut rows = vec![HEADERS.join(SEPARATOR)];

    for record in records.iter().filter(|r| r.is_ok()) {
        let fields = &record.fields;
        let preview: String = fields
            .description
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(DESCRIPTION_PREVIEW_CHARS)
            .collect();

        let row = [
            record.sequence_number.to_string(),
            escape_field(record.title()),
            escape_field(fields.organization.as_deref().unwrap_or("")),
            escape_field(fields.location.as_deref().unwrap_or("")),
            escape_field(fields.posted_date.as_deref().unwrap_or("")),
            escape_field(fields.application_count.as_deref().unwrap_or("")),
            escape_field(&preview),
        ];
        rows.push(row.join(SEPARATOR));
    }

    rows.join("\n")
}

/// Doubles embedded quotes and wraps the field in quotes when it contains
/// the separator, a comma, a quote or a line break
pub fn escape_field(text: &str) -> String {
    let needs_quotes = text.contains(SEPARATOR)
        || text.contains(&[',', '"', '\n', '\r'][..]);

    let escaped = text.replace('"', "\"\"");
    if needs_quotes {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}
