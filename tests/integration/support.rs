//! Scripted in-memory listing shared by the integration tests

use async_trait::async_trait;
use listing_harvester::config::Config;
use listing_harvester::crawler::{CrawlHandle, PageAccessor, VisibleItem, WorkItem};
use listing_harvester::record::DetailFields;
use std::collections::HashMap;
use std::time::Duration;

/// One listing card and how the environment treats it
#[derive(Debug, Clone)]
pub struct ScriptedItem {
    pub id: String,
    pub title: String,
    pub org: String,
    /// False when the item disappears before it can be opened
    pub activates: bool,
    /// Extraction always returns nothing
    pub unreadable: bool,
}

pub fn item(id: &str, title: &str, org: &str) -> ScriptedItem {
    ScriptedItem {
        id: id.to_string(),
        title: title.to_string(),
        org: org.to_string(),
        activates: true,
        unreadable: false,
    }
}

impl ScriptedItem {
    pub fn gone(mut self) -> Self {
        self.activates = false;
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }
}

/// Action taken through a control handle once N extractions happened
pub enum Trigger {
    Stop,
    Pause,
}

/// Paginated listing replaying fixed pages
pub struct ScriptedListing {
    pages: Vec<Vec<ScriptedItem>>,
    page: usize,
    focused: Option<usize>,
    extracted: usize,
    trigger: Option<(usize, Trigger, CrawlHandle)>,

    /// Item ids in activation order
    pub activations: Vec<String>,
    pub extract_calls: HashMap<String, u32>,
    pub seeks: Vec<u32>,
}

impl ScriptedListing {
    pub fn new(pages: Vec<Vec<ScriptedItem>>) -> Self {
        Self {
            pages,
            page: 0,
            focused: None,
            extracted: 0,
            trigger: None,
            activations: Vec::new(),
            extract_calls: HashMap::new(),
            seeks: Vec::new(),
        }
    }

    /// Fires `trigger` during the `after`-th extraction
    pub fn with_trigger(mut self, after: usize, trigger: Trigger, handle: CrawlHandle) -> Self {
        self.trigger = Some((after, trigger, handle));
        self
    }

    fn current(&self) -> &[ScriptedItem] {
        self.pages.get(self.page).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[async_trait]
impl PageAccessor for ScriptedListing {
    async fn list_visible_items(&mut self) -> Vec<VisibleItem> {
        self.current()
            .iter()
            .map(|item| VisibleItem {
                external_id: Some(item.id.clone()),
                title_text: Some(item.title.clone()),
                org_text: Some(item.org.clone()),
                ..Default::default()
            })
            .collect()
    }

    async fn activate(&mut self, work_item: &WorkItem) -> bool {
        let index = work_item.position_hint;
        let Some(item) = self.current().get(index).cloned() else {
            return false;
        };
        self.activations.push(item.id.clone());
        self.focused = item.activates.then_some(index);
        item.activates
    }

    async fn wait_until_detail_ready(&mut self, _timeout: Duration) -> bool {
        self.focused.is_some()
    }

    async fn has_next_page(&mut self) -> bool {
        self.page + 1 < self.pages.len()
    }

    async fn advance_page(&mut self) -> bool {
        if self.page + 1 < self.pages.len() {
            self.page += 1;
            self.focused = None;
            true
        } else {
            false
        }
    }

    async fn extract_current_detail(&mut self) -> Option<DetailFields> {
        let item = self.current().get(self.focused?)?.clone();
        *self.extract_calls.entry(item.id.clone()).or_insert(0) += 1;

        if *self.extract_calls.get(&item.id).unwrap_or(&0) == 1 {
            self.extracted += 1;
            if let Some((after, trigger, handle)) = &self.trigger {
                if self.extracted == *after {
                    match trigger {
                        Trigger::Stop => handle.stop(),
                        Trigger::Pause => handle.pause(),
                    }
                }
            }
        }

        if item.unreadable {
            return None;
        }

        Some(DetailFields {
            title: Some(item.title.clone()),
            organization: Some(item.org.clone()),
            location: Some("Remote".to_string()),
            description: Some(format!("{} at {}. ", item.title, item.org).repeat(10)),
            ..Default::default()
        })
    }

    async fn seek_page(&mut self, page: u32) -> bool {
        self.seeks.push(page);
        let index = page.saturating_sub(1) as usize;
        if index < self.pages.len() {
            self.page = index;
            true
        } else {
            false
        }
    }
}

/// Configuration with pacing off and short waits
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.crawl.anti_detection = false;
    config.timing.page_delay = 10;
    config.timing.stall_delay = 10;
    config.timing.detail_timeout = 100;
    config
}

/// `[A,B,C]`, `[D,E,F]` with unique (title, organization) pairs
pub fn two_pages() -> Vec<Vec<ScriptedItem>> {
    vec![
        vec![
            item("A", "Alpha", "Org A"),
            item("B", "Bravo", "Org B"),
            item("C", "Charlie", "Org C"),
        ],
        vec![
            item("D", "Delta", "Org D"),
            item("E", "Echo", "Org E"),
            item("F", "Foxtrot", "Org F"),
        ],
    ]
}
