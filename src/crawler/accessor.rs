//! Boundary to the live listing environment
//!
//! The crawl core never touches the environment directly. Everything it needs
//! (enumerating cards, focusing an item, reading its detail, paginating) goes
//! through [`PageAccessor`]. Every call may fail transiently; failures are
//! reported as `false` / `None` rather than errors.

use crate::crawler::WorkItem;
use crate::record::{DetailFields, QueryContext};
use async_trait::async_trait;
use std::time::Duration;

/// A candidate item as currently rendered by the environment
///
/// Any of the fields may be missing; the discoverer picks the strongest
/// identifier available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleItem {
    /// Stable identifier attribute supplied by the source
    pub external_id: Option<String>,

    /// Link to the item's canonical detail view
    pub detail_link: Option<String>,

    /// Card title text
    pub title_text: Option<String>,

    /// Card organization text
    pub org_text: Option<String>,
}

/// Access to a paginated, lazily-rendered listing
#[async_trait]
pub trait PageAccessor: Send {
    /// Enumerates the currently rendered candidates, in display order
    ///
    /// Must be cheap and free of side effects; it is polled repeatedly.
    async fn list_visible_items(&mut self) -> Vec<VisibleItem>;

    /// Brings the item's detail into focus
    ///
    /// Returns `false` if the item is no longer valid.
    async fn activate(&mut self, item: &WorkItem) -> bool;

    /// Waits until the focused detail is extractable or `timeout` elapses
    async fn wait_until_detail_ready(&mut self, timeout: Duration) -> bool;

    async fn has_next_page(&mut self) -> bool;

    /// Moves to the next page; returns once new items are enumerable
    async fn advance_page(&mut self) -> bool;

    /// Reads the focused detail, or `None` if it cannot be read right now
    async fn extract_current_detail(&mut self) -> Option<DetailFields>;

    /// Positions the environment at a 1-based page index when resuming
    ///
    /// The default assumes the environment is already positioned.
    async fn seek_page(&mut self, page: u32) -> bool {
        let _ = page;
        true
    }

    /// Query context the listing was produced from
    async fn query_context(&mut self) -> QueryContext {
        QueryContext::default()
    }
}
