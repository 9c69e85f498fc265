//! HTML source tests
//!
//! These tests use wiremock to serve listing and detail pages and run the
//! full crawl cycle through `HtmlPageAccessor`.

use crate::support::fast_config;
use listing_harvester::config::{Config, SelectorConfig, SourceConfig};
use listing_harvester::crawler::{CrawlOrchestrator, PageAccessor, RunOutcome};
use listing_harvester::output::ExportKind;
use listing_harvester::source::HtmlPageAccessor;
use listing_harvester::storage::SqliteCheckpointStore;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn selectors() -> SelectorConfig {
    SelectorConfig {
        item: "li.job-card".to_string(),
        item_id_attributes: vec!["data-job-id".to_string()],
        detail_link: "a.job-link".to_string(),
        detail_id_marker: "/jobs/view/".to_string(),
        card_title: Some(".job-title".to_string()),
        card_organization: Some(".job-company".to_string()),
        next_page: Some("button.next".to_string()),
        title: "h1.job-title".to_string(),
        description: "div.job-description".to_string(),
        organization: Some(".company-name".to_string()),
        location: Some(".job-location".to_string()),
        posted_date: Some(".posted".to_string()),
        application_count: Some(".applicants".to_string()),
        skills_match: None,
        insights: Some("ul.insights li".to_string()),
    }
}

fn config_for(server: &MockServer) -> Config {
    let mut config = fast_config();
    config.source = Some(SourceConfig {
        listing_url: format!("{}/jobs/search?keywords=rust&location=Berlin", server.uri()),
        page_param: "page".to_string(),
        page_start: 1,
        page_step: 1,
        selectors: selectors(),
    });
    config
}

fn card(id: u32, title: &str, company: &str) -> String {
    format!(
        r#"<li class="job-card" data-job-id="{id}">
             <a class="job-link" href="/jobs/view/{id}/"><span class="job-title">{title}</span></a>
             <span class="job-company">{company}</span>
           </li>"#
    )
}

fn listing_page(cards: &[String], has_next: bool) -> String {
    let next = if has_next {
        r#"<button class="next">Next</button>"#
    } else {
        r#"<button class="next" disabled>Next</button>"#
    };
    format!(
        "<html><body><ul>{}</ul>{}</body></html>",
        cards.join("\n"),
        next
    )
}

fn detail_page(title: &str, company: &str) -> String {
    format!(
        r#"<html><body>
             <h1 class="job-title">{title}</h1>
             <a class="company-name">{company}</a>
             <span class="job-location">Berlin, Germany</span>
             <span class="posted">2 days ago</span>
             <span class="applicants">Over 100 applicants</span>
             <div class="job-description">
               <p>We are looking for an engineer to build reliable services.</p>
               <p>You will own   the crawler pipeline end to end.</p>
             </div>
             <ul class="insights"><li>Remote</li><li>Full-time</li></ul>
           </body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, page: Option<&str>, body: String) {
    let mut mock = Mock::given(method("GET")).and(path(route));
    if let Some(page) = page {
        mock = mock.and(query_param("page", page));
    }
    mock.respond_with(
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html; charset=utf-8")
            .set_body_string(body),
    )
    .mount(server)
    .await;
}

#[tokio::test]
async fn test_crawl_html_listing() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/jobs/search",
        Some("1"),
        listing_page(
            &[
                card(1, "Rust Engineer", "Acme"),
                card(2, "Backend Engineer", "Globex"),
            ],
            true,
        ),
    )
    .await;
    mount_html(
        &server,
        "/jobs/search",
        Some("2"),
        listing_page(&[card(3, "Platform Engineer", "Initech")], false),
    )
    .await;
    mount_html(
        &server,
        "/jobs/view/1/",
        None,
        detail_page("Rust Engineer", "Acme"),
    )
    .await;
    mount_html(
        &server,
        "/jobs/view/3/",
        None,
        detail_page("Platform Engineer", "Initech"),
    )
    .await;
    // /jobs/view/2/ is not mounted: wiremock answers 404

    let config = config_for(&server);
    let source = config.source.clone().unwrap();
    let accessor = HtmlPageAccessor::new(source).unwrap();
    let store = SqliteCheckpointStore::open_in_memory("html").unwrap();
    let mut orchestrator = CrawlOrchestrator::new(config, accessor, store);

    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { caveat: None });
    let records = orchestrator.records();
    assert_eq!(records.len(), 3);

    assert!(records[0].is_ok());
    assert_eq!(records[0].item_id, "id_1");
    assert_eq!(records[0].title(), "Rust Engineer");
    assert_eq!(records[0].organization(), "Acme");
    assert_eq!(
        records[0].fields.location.as_deref(),
        Some("Berlin, Germany")
    );
    assert_eq!(
        records[0].fields.description.as_deref(),
        Some(
            "We are looking for an engineer to build reliable services. \
             You will own the crawler pipeline end to end."
        )
    );
    assert_eq!(records[0].fields.insights, vec!["Remote", "Full-time"]);
    // Application count is excluded by default
    assert_eq!(records[0].fields.application_count, None);

    assert!(!records[1].is_ok());
    assert_eq!(records[1].status.reason(), Some("item no longer available"));
    assert_eq!(records[1].title(), "Backend Engineer");

    assert!(records[2].is_ok());
    assert_eq!(records[2].item_id, "id_3");

    let metadata = orchestrator.aggregator().metadata();
    assert_eq!(metadata.query.search_query.as_deref(), Some("rust"));
    assert_eq!(metadata.query.location.as_deref(), Some("Berlin"));

    let markdown = orchestrator.render_all(ExportKind::Markdown);
    assert!(markdown.contains("Rust Engineer"));
    assert!(markdown.contains("Platform Engineer"));
}

#[tokio::test]
async fn test_unavailable_detail_is_retried_not_dropped() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/jobs/search",
        Some("1"),
        listing_page(&[card(7, "Data Engineer", "Hooli")], false),
    )
    .await;
    // First detail request is refused, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/jobs/view/7/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/jobs/view/7/",
        None,
        detail_page("Data Engineer", "Hooli"),
    )
    .await;

    let config = config_for(&server);
    let accessor = HtmlPageAccessor::new(config.source.clone().unwrap()).unwrap();
    let store = SqliteCheckpointStore::open_in_memory("html").unwrap();
    let mut orchestrator = CrawlOrchestrator::new(config, accessor, store);

    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { caveat: None });
    let records = orchestrator.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_ok());
    assert_eq!(records[0].attempts, 2);
    assert!(!records[0].low_confidence);
    assert_eq!(records[0].title(), "Data Engineer");

    let detail_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/jobs/view/7/")
        .count();
    assert_eq!(detail_requests, 2);
}

#[tokio::test]
async fn test_listing_failure_reports_no_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let mut accessor = HtmlPageAccessor::new(config.source.unwrap()).unwrap();

    assert!(accessor.list_visible_items().await.is_empty());
    assert!(!accessor.has_next_page().await);
    assert!(!accessor.advance_page().await);
    assert_eq!(accessor.page(), 1);
}

#[tokio::test]
async fn test_seek_page_loads_requested_page() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/jobs/search",
        Some("4"),
        listing_page(&[card(40, "SRE", "Umbrella")], false),
    )
    .await;

    let config = config_for(&server);
    let mut accessor = HtmlPageAccessor::new(config.source.unwrap()).unwrap();

    assert!(accessor.seek_page(4).await);
    assert_eq!(accessor.page(), 4);

    let items = accessor.list_visible_items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].external_id.as_deref(), Some("40"));
    assert_eq!(items[0].org_text.as_deref(), Some("Umbrella"));
    assert!(items[0]
        .detail_link
        .as_deref()
        .unwrap()
        .ends_with("/jobs/view/40/"));
}
