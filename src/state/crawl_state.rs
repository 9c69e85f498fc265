use crate::state::CrawlPhase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The orchestrator's persisted crawl progress
///
/// `processed_item_ids` is the only record of which work items were already
/// attempted. It is never pruned during a run, so an identifier that enters
/// it is never selected again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// 1-based index of the listing page being walked
    pub current_page_index: u32,

    /// Identifiers of every work item attempted so far
    pub processed_item_ids: BTreeSet<String>,

    /// Number of records aggregated so far (successful plus failed)
    pub items_processed_count: u64,

    pub phase: CrawlPhase,
}

impl CrawlState {
    /// Creates the state of a run that has not started yet
    pub fn new() -> Self {
        Self {
            current_page_index: 1,
            processed_item_ids: BTreeSet::new(),
            items_processed_count: 0,
            phase: CrawlPhase::Idle,
        }
    }

    /// Returns true if the item with this identifier was already attempted
    pub fn is_processed(&self, identifier: &str) -> bool {
        self.processed_item_ids.contains(identifier)
    }

    /// Records an attempted item; returns false if it was already known
    pub fn mark_processed(&mut self, identifier: &str) -> bool {
        self.processed_item_ids.insert(identifier.to_string())
    }

    /// Returns true if any progress exists to resume from
    pub fn has_progress(&self) -> bool {
        self.items_processed_count > 0 || !self.processed_item_ids.is_empty()
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
