//! Checkpoint summary display
//!
//! Renders the stored checkpoint for operators (`--show-checkpoint`).

use crate::output::display_timestamp;
use crate::storage::{Checkpoint, SESSION_MAX_AGE_HOURS};
use chrono::{DateTime, Utc};

/// Formats a human-readable summary of a checkpoint
///
/// # Arguments
///
/// * `checkpoint` - The stored checkpoint
/// * `now` - Reference time used to report age and staleness
pub fn format_checkpoint_summary(checkpoint: &Checkpoint, now: DateTime<Utc>) -> String {
    let metadata = &checkpoint.metadata;
    let state = &checkpoint.state;
    let mut out = String::new();

    out.push_str("=== Checkpoint ===\n\n");

    out.push_str("Session:\n");
    out.push_str(&format!("  Id: {}\n", checkpoint.session_id));
    out.push_str(&format!(
        "  Saved: {}\n",
        display_timestamp(&checkpoint.saved_at)
    ));
    let age = checkpoint.age(now);
    out.push_str(&format!(
        "  Age: {}h {}m{}\n",
        age.num_hours(),
        age.num_minutes() % 60,
        if checkpoint.is_stale(now) {
            format!(" (stale, older than {}h; will be discarded)", SESSION_MAX_AGE_HOURS)
        } else {
            String::new()
        }
    ));
    if let Some(hash) = &checkpoint.config_hash {
        out.push_str(&format!("  Config hash: {}\n", hash));
    }
    out.push('\n');

    out.push_str("Progress:\n");
    out.push_str(&format!("  Phase: {}\n", state.phase));
    out.push_str(&format!("  Current page: {}\n", state.current_page_index));
    out.push_str(&format!(
        "  Items attempted: {}\n",
        state.processed_item_ids.len()
    ));
    out.push_str(&format!(
        "  Items processed: {}\n",
        state.items_processed_count
    ));
    out.push('\n');

    out.push_str("Records:\n");
    out.push_str(&format!("  Successful: {}\n", metadata.successful));
    out.push_str(&format!("  Failed: {}\n", metadata.failed));
    out.push_str(&format!(
        "  Duplicates skipped: {}\n",
        metadata.duplicates_skipped
    ));
    out.push_str(&format!("  Time elapsed: {}\n", metadata.elapsed_display()));

    if !checkpoint.recent_records.is_empty() {
        out.push_str(&format!(
            "\nRecent Records ({}):\n",
            checkpoint.recent_records.len()
        ));
        for record in &checkpoint.recent_records {
            let label = match record.status.reason() {
                Some(reason) => format!("FAILED: {}", reason),
                None => record.organization().to_string(),
            };
            out.push_str(&format!(
                "  #{} {} [{}]\n",
                record.sequence_number,
                record.title(),
                label
            ));
        }
    }

    out
}

/// Prints a checkpoint summary to stdout
pub fn print_checkpoint_summary(checkpoint: &Checkpoint) {
    print!("{}", format_checkpoint_summary(checkpoint, Utc::now()));
}
