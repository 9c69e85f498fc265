//! HTML parsing for listing and detail pages
//!
//! This module turns fetched HTML into plain data:
//! - Listing cards (identifier attributes, detail links, card text)
//! - The state of the "next page" control
//! - Detail fields of a single item
//!
//! Parsed documents are dropped before returning, so nothing here outlives
//! the call that produced it.

use crate::config::SelectorConfig;
use crate::crawler::VisibleItem;
use crate::record::DetailFields;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// What a listing page shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Cards in display order
    pub items: Vec<VisibleItem>,

    /// True if an enabled next-page control is present
    pub has_next: bool,
}

/// Parses a listing page
///
/// # Arguments
///
/// * `html` - The listing page HTML
/// * `page_url` - URL the page was fetched from, for resolving detail links
/// * `selectors` - Card and pagination selectors
pub fn parse_listing(html: &str, page_url: &Url, selectors: &SelectorConfig) -> ListingPage {
    let document = Html::parse_document(html);

    let Some(item_selector) = compile(&selectors.item) else {
        return ListingPage::default();
    };
    let link_selector = compile(&selectors.detail_link);
    let title_selector = selectors.card_title.as_deref().and_then(compile);
    let org_selector = selectors.card_organization.as_deref().and_then(compile);

    let items = document
        .select(&item_selector)
        .map(|card| VisibleItem {
            external_id: selectors
                .item_id_attributes
                .iter()
                .find_map(|attr| {
                    card.value()
                        .attr(attr)
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                })
                .map(str::to_string),
            detail_link: link_selector
                .as_ref()
                .and_then(|selector| card.select(selector).next())
                .and_then(|anchor| anchor.value().attr("href"))
                .and_then(|href| resolve_link(href, page_url)),
            title_text: title_selector
                .as_ref()
                .and_then(|selector| first_text(card, selector)),
            org_text: org_selector
                .as_ref()
                .and_then(|selector| first_text(card, selector)),
        })
        .collect();

    let has_next = selectors
        .next_page
        .as_deref()
        .and_then(compile)
        .map(|selector| document.select(&selector).any(is_enabled))
        .unwrap_or(false);

    ListingPage { items, has_next }
}

/// Returns true if the detail page carries the mandatory fields' elements
pub fn detail_ready(html: &str, selectors: &SelectorConfig) -> bool {
    let document = Html::parse_document(html);
    [&selectors.title, &selectors.description]
        .into_iter()
        .filter_map(|css| compile(css))
        .all(|selector| document.select(&selector).next().is_some())
}

/// Extracts the fields of a detail page
///
/// Missing elements yield `None`; validation is left to the caller.
pub fn parse_detail(html: &str, page_url: &Url, selectors: &SelectorConfig) -> DetailFields {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let text_of = |css: Option<&str>| -> Option<String> {
        let selector = compile(css?)?;
        first_text(root, &selector)
    };

    let insights = selectors
        .insights
        .as_deref()
        .and_then(compile)
        .map(|selector| {
            root.select(&selector)
                .filter_map(|element| non_empty(collapse_whitespace(&element_text(element))))
                .collect()
        })
        .unwrap_or_default();

    DetailFields {
        title: text_of(Some(selectors.title.as_str())),
        organization: text_of(selectors.organization.as_deref()),
        location: text_of(selectors.location.as_deref()),
        description: text_of(Some(selectors.description.as_str())),
        posted_date: text_of(selectors.posted_date.as_deref()),
        application_count: text_of(selectors.application_count.as_deref()),
        skills_match: text_of(selectors.skills_match.as_deref()),
        insights,
        url: Some(page_url.to_string()),
        ..Default::default()
    }
}

/// Collapses runs of whitespace to single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves an href against the page URL, keeping only HTTP(S) targets
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}

fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Ignoring invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|element| non_empty(collapse_whitespace(&element_text(element))))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

fn is_enabled(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.attr("disabled").is_none() && value.attr("aria-disabled") != Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> SelectorConfig {
        SelectorConfig {
            item: "li.card".to_string(),
            item_id_attributes: vec!["data-job-id".to_string()],
            detail_link: "a.card-link".to_string(),
            detail_id_marker: "/jobs/view/".to_string(),
            card_title: Some(".card-title".to_string()),
            card_organization: Some(".card-org".to_string()),
            next_page: Some("button.next".to_string()),
            title: "h1.title".to_string(),
            description: "#description".to_string(),
            organization: Some(".org".to_string()),
            location: Some(".location".to_string()),
            posted_date: Some(".posted".to_string()),
            application_count: None,
            skills_match: None,
            insights: Some("ul.insights li".to_string()),
        }
    }

    fn page_url() -> Url {
        Url::parse("https://listings.example.com/jobs/search?keywords=rust&page=1").unwrap()
    }

    const LISTING: &str = r#"
        <html><body><ul>
          <li class="card" data-job-id="101">
            <a class="card-link" href="/jobs/view/101/?ref=search">
              <span class="card-title">  Rust   Engineer </span>
            </a>
            <span class="card-org">Acme</span>
          </li>
          <li class="card" data-job-id="">
            <a class="card-link" href="https://listings.example.com/jobs/view/202">x</a>
          </li>
          <li class="card">
            <a class="card-link" href="javascript:void(0)">nothing</a>
            <span class="card-title">Data Engineer</span>
          </li>
        </ul>
        <button class="next">Next</button>
        </body></html>
    "#;

    #[test]
    fn test_parse_listing_cards() {
        let page = parse_listing(LISTING, &page_url(), &selectors());

        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].external_id.as_deref(), Some("101"));
        assert_eq!(
            page.items[0].detail_link.as_deref(),
            Some("https://listings.example.com/jobs/view/101/?ref=search")
        );
        assert_eq!(page.items[0].title_text.as_deref(), Some("Rust Engineer"));
        assert_eq!(page.items[0].org_text.as_deref(), Some("Acme"));

        assert_eq!(page.items[1].external_id, None);
        assert!(page.items[1].detail_link.is_some());

        assert_eq!(page.items[2].detail_link, None);
        assert_eq!(page.items[2].org_text, None);
        assert!(page.has_next);
    }

    #[test]
    fn test_disabled_next_control() {
        let html = r#"<ul></ul><button class="next" disabled>Next</button>"#;
        assert!(!parse_listing(html, &page_url(), &selectors()).has_next);

        let html = r#"<button class="next" aria-disabled="true">Next</button>"#;
        assert!(!parse_listing(html, &page_url(), &selectors()).has_next);

        assert!(!parse_listing("<ul></ul>", &page_url(), &selectors()).has_next);
    }

    #[test]
    fn test_parse_detail() {
        let html = r#"
            <h1 class="title">Rust Engineer</h1>
            <div class="org"> Acme </div>
            <div class="location">Berlin</div>
            <div id="description">
                <p>Build   things.</p>
                <p>Ship them.</p>
            </div>
            <ul class="insights"><li>Remote</li><li> </li><li>Full-time</li></ul>
        "#;
        let url = Url::parse("https://listings.example.com/jobs/view/101").unwrap();

        let fields = parse_detail(html, &url, &selectors());

        assert_eq!(fields.title.as_deref(), Some("Rust Engineer"));
        assert_eq!(fields.organization.as_deref(), Some("Acme"));
        assert_eq!(fields.location.as_deref(), Some("Berlin"));
        assert_eq!(
            fields.description.as_deref(),
            Some("Build things. Ship them.")
        );
        assert_eq!(fields.posted_date, None);
        assert_eq!(fields.insights, vec!["Remote", "Full-time"]);
        assert_eq!(fields.url.as_deref(), Some(url.as_str()));
    }

    #[test]
    fn test_detail_ready() {
        let sel = selectors();
        assert!(detail_ready(
            r#"<h1 class="title">x</h1><div id="description">y</div>"#,
            &sel
        ));
        assert!(!detail_ready(r#"<h1 class="title">x</h1>"#, &sel));
    }

    #[test]
    fn test_resolve_link() {
        let base = page_url();
        assert_eq!(
            resolve_link("/jobs/view/7", &base).as_deref(),
            Some("https://listings.example.com/jobs/view/7")
        );
        assert_eq!(resolve_link("#top", &base), None);
        assert_eq!(resolve_link("mailto:hr@example.com", &base), None);
        assert_eq!(resolve_link("  ", &base), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }
}
