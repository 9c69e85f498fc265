use crate::config::SourceConfig;
use crate::crawler::{PageAccessor, VisibleItem, WorkItem};
use crate::record::{DetailFields, QueryContext};
use crate::source::fetch::{build_http_client, fetch_url, FetchResult};
use crate::source::parse::{detail_ready, parse_detail, parse_listing, ListingPage};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Detail page currently in focus
enum Focus {
    None,
    Loaded { url: Url, body: String },

    /// The last fetch failed transiently
    ///
    /// `retry_due` flips on the first readiness wait, so the fetch is
    /// repeated on the wait that follows the pipeline's backoff rather than
    /// straight after the failure.
    Pending { url: Url, retry_due: bool },
}

/// [`PageAccessor`] over server-rendered HTML listings
///
/// Each listing page is fetched once and kept as plain data. Activating an
/// item fetches its detail page; a missing link or a 404 means the item is
/// gone. Rate limiting, server errors and network failures leave the detail
/// pending so extraction retries fetch it again.
pub struct HtmlPageAccessor {
    client: Client,
    source: SourceConfig,
    listing_url: Url,
    page: u32,
    listing: Option<ListingPage>,
    focus: Focus,
}

impl HtmlPageAccessor {
    /// Creates an accessor positioned before page 1
    ///
    /// # Arguments
    ///
    /// * `source` - Listing URL, pagination parameter and selectors
    ///
    /// # Returns
    ///
    /// * `Ok(HtmlPageAccessor)` - Ready to enumerate page 1
    /// * `Err(HarvestError)` - Invalid listing URL or HTTP client failure
    pub fn new(source: SourceConfig) -> Result<Self, HarvestError> {
        let client = build_http_client()?;
        Self::with_client(source, client)
    }

    pub fn with_client(source: SourceConfig, client: Client) -> Result<Self, HarvestError> {
        let listing_url = Url::parse(&source.listing_url)?;
        Ok(Self {
            client,
            source,
            listing_url,
            page: 1,
            listing: None,
            focus: Focus::None,
        })
    }

    /// 1-based index of the page currently shown
    pub fn page(&self) -> u32 {
        self.page
    }

    /// URL of a 1-based listing page
    pub fn page_url(&self, page: u32) -> Url {
        let value = self.source.page_start as u64
            + u64::from(page.saturating_sub(1)) * self.source.page_step as u64;

        let retained: Vec<(String, String)> = self
            .listing_url
            .query_pairs()
            .filter(|(key, _)| key != self.source.page_param.as_str())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.listing_url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair(&self.source.page_param, &value.to_string());
        url
    }

    /// Fetches and parses a listing page; `None` if it could not be fetched
    async fn load_page(&self, page: u32) -> Option<ListingPage> {
        let url = self.page_url(page);
        match fetch_url(&self.client, url.as_str()).await {
            FetchResult::Success { final_url, body } => {
                let base = Url::parse(&final_url).unwrap_or(url);
                let listing = parse_listing(&body, &base, &self.source.selectors);
                tracing::debug!(
                    "Page {} lists {} items (next page: {})",
                    page,
                    listing.items.len(),
                    listing.has_next
                );
                Some(listing)
            }
            other => {
                tracing::warn!("Could not load listing page {}: {:?}", page, other);
                None
            }
        }
    }

    /// Fetches a detail page into focus
    ///
    /// Returns `false` only when the page is gone.
    async fn fetch_detail(&mut self, url: Url, item: &str) -> bool {
        match fetch_url(&self.client, url.as_str()).await {
            FetchResult::Success { final_url, body } => {
                let url = Url::parse(&final_url).unwrap_or(url);
                self.focus = Focus::Loaded { url, body };
                true
            }
            FetchResult::NotFound => {
                tracing::debug!("Detail page for {} is gone", item);
                self.focus = Focus::None;
                false
            }
            other => {
                tracing::warn!("Could not load detail for {}: {:?}", item, other);
                self.focus = Focus::Pending {
                    url,
                    retry_due: false,
                };
                true
            }
        }
    }

    async fn show_page(&mut self, page: u32) -> bool {
        match self.load_page(page).await {
            Some(listing) => {
                self.page = page;
                self.listing = Some(listing);
                self.focus = Focus::None;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PageAccessor for HtmlPageAccessor {
    async fn list_visible_items(&mut self) -> Vec<VisibleItem> {
        if self.listing.is_none() {
            self.show_page(self.page).await;
        }
        self.listing
            .as_ref()
            .map(|listing| listing.items.clone())
            .unwrap_or_default()
    }

    async fn activate(&mut self, item: &WorkItem) -> bool {
        self.focus = Focus::None;

        let Some(link) = item.visible.detail_link.as_deref() else {
            tracing::debug!("Item {} has no detail link", item.identifier);
            return false;
        };
        let Ok(url) = Url::parse(link) else {
            tracing::debug!("Item {} has an unusable detail link: {}", item.identifier, link);
            return false;
        };

        self.fetch_detail(url, &item.identifier).await
    }

    async fn wait_until_detail_ready(&mut self, _timeout: Duration) -> bool {
        let refetch = match &mut self.focus {
            Focus::None => return false,
            Focus::Pending { retry_due, .. } if !*retry_due => {
                *retry_due = true;
                return false;
            }
            Focus::Pending { url, .. } => Some(url.clone()),
            Focus::Loaded { .. } => None,
        };

        if let Some(url) = refetch {
            let label = url.to_string();
            self.fetch_detail(url, &label).await;
            if let Focus::Pending { retry_due, .. } = &mut self.focus {
                *retry_due = true;
            }
        }

        // Server-rendered pages are complete once fetched
        match &self.focus {
            Focus::Loaded { body, .. } => detail_ready(body, &self.source.selectors),
            _ => false,
        }
    }

    async fn has_next_page(&mut self) -> bool {
        self.listing
            .as_ref()
            .map(|listing| listing.has_next)
            .unwrap_or(false)
    }

    async fn advance_page(&mut self) -> bool {
        let next = self.page + 1;
        self.show_page(next).await
    }

    async fn extract_current_detail(&mut self) -> Option<DetailFields> {
        match &self.focus {
            Focus::Loaded { url, body } => Some(parse_detail(body, url, &self.source.selectors)),
            _ => None,
        }
    }

    async fn seek_page(&mut self, page: u32) -> bool {
        self.show_page(page.max(1)).await
    }

    async fn query_context(&mut self) -> QueryContext {
        let mut context = QueryContext::default();
        for (key, value) in self.listing_url.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "keywords" => context.search_query = Some(value.to_string()),
                "location" => context.location = Some(value.to_string()),
                _ => {}
            }
        }
        context
    }
}
