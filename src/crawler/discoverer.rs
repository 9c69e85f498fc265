use crate::crawler::{PageAccessor, VisibleItem};

const COMPOSITE_TITLE_CHARS: usize = 50;
const COMPOSITE_ORG_CHARS: usize = 30;

/// A candidate work item discovered on the current page
///
/// Created fresh on every poll and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Identifier stable across polls of the same page view
    pub identifier: String,

    /// 0-based position on the page at discovery time
    pub position_hint: usize,

    /// What the environment reported for this item
    pub visible: VisibleItem,
}

/// Enumerates candidate items and assigns their identifiers
#[derive(Debug, Clone)]
pub struct WorkItemDiscoverer {
    detail_id_marker: String,
}

impl WorkItemDiscoverer {
    /// Creates a discoverer
    ///
    /// # Arguments
    ///
    /// * `detail_id_marker` - Path segment preceding the numeric id in
    ///   canonical detail links (e.g. `/jobs/view/`)
    pub fn new(detail_id_marker: impl Into<String>) -> Self {
        Self {
            detail_id_marker: detail_id_marker.into(),
        }
    }

    /// Lists the currently visible items with their identifiers
    pub async fn discover<A: PageAccessor + ?Sized>(&self, accessor: &mut A) -> Vec<WorkItem> {
        let items = accessor.list_visible_items().await;
        self.identify(items)
    }

    /// Assigns identifiers to already-enumerated items
    pub fn identify(&self, items: Vec<VisibleItem>) -> Vec<WorkItem> {
        items
            .into_iter()
            .enumerate()
            .map(|(position, visible)| WorkItem {
                identifier: assign_identifier(&visible, position, &self.detail_id_marker),
                position_hint: position,
                visible,
            })
            .collect()
    }
}

impl Default for WorkItemDiscoverer {
    fn default() -> Self {
        Self::new("/jobs/view/")
    }
}

/// Derives an item identifier, strongest source first
///
/// 1. `id_<attr>` from the external identifier attribute
/// 2. `view_<digits>` parsed from the detail link after `detail_id_marker`
/// 3. normalized composite of truncated title and organization text
/// 4. `pos_<n>` from the position on the page
pub fn assign_identifier(item: &VisibleItem, position: usize, detail_id_marker: &str) -> String {
    if let Some(id) = non_empty(&item.external_id) {
        return format!("id_{}", id);
    }

    if let Some(digits) = item
        .detail_link
        .as_deref()
        .and_then(|link| id_from_link(link, detail_id_marker))
    {
        return format!("view_{}", digits);
    }

    if let (Some(title), Some(org)) = (non_empty(&item.title_text), non_empty(&item.org_text)) {
        let composite = composite_key(title, org);
        if !composite.is_empty() {
            return composite;
        }
    }

    format!("pos_{}", position)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn id_from_link<'a>(link: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }

    let start = link.find(marker)? + marker.len();
    let rest = &link[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());

    (end > 0).then(|| &rest[..end])
}

fn composite_key(title: &str, org: &str) -> String {
    let title: String = title.chars().take(COMPOSITE_TITLE_CHARS).collect();
    let org: String = org.chars().take(COMPOSITE_ORG_CHARS).collect();
    let raw = format!("{}_{}", title, org);

    let mut key = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                key.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '_' {
            key.push(c.to_ascii_lowercase());
        }
    }

    key
}
