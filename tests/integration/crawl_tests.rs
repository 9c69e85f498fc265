//! End-to-end crawl scenarios over a scripted listing
//!
//! Every test runs with a paused tokio clock, so pacing, backoff and stall
//! waits complete instantly while keeping their relative timing.

use crate::support::{fast_config, item, two_pages, ScriptedListing, Trigger};
use listing_harvester::crawler::{CrawlEvent, CrawlHandle, CrawlOrchestrator, LogKind, RunOutcome};
use listing_harvester::output::ExportKind;
use listing_harvester::state::CrawlPhase;
use listing_harvester::storage::{CheckpointStore, SqliteCheckpointStore, CHECKPOINT_RECORD_LIMIT};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

fn memory_store() -> SqliteCheckpointStore {
    SqliteCheckpointStore::open_in_memory("integration").unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_are_skipped_across_pages() {
    let pages = vec![
        vec![
            item("A", "Alpha", "Org A"),
            item("B", "X", "Y"),
            item("C", "Charlie", "Org C"),
        ],
        vec![
            item("D", "Delta", "Org D"),
            item("E", "X", "Y"),
            item("F", "Foxtrot", "Org F"),
        ],
    ];
    let mut orchestrator =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(pages), memory_store());

    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { caveat: None });
    let metadata = orchestrator.aggregator().metadata();
    assert_eq!(orchestrator.records().len(), 5);
    assert!(orchestrator.records().iter().all(|r| r.is_ok()));
    assert_eq!(metadata.duplicates_skipped, 1);
    assert_eq!(metadata.total, 5);
    assert_eq!(orchestrator.state().items_processed_count, 5);

    // E was still attempted exactly once, it just was not admitted
    assert_eq!(
        orchestrator.accessor().activations,
        vec!["A", "B", "C", "D", "E", "F"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_allowed_when_disabled() {
    let pages = vec![vec![item("A", "X", "Y"), item("B", "x", "y")]];
    let mut config = fast_config();
    config.crawl.skip_duplicates = false;
    let mut orchestrator =
        CrawlOrchestrator::new(config, ScriptedListing::new(pages), memory_store());

    orchestrator.run().await.unwrap();

    assert_eq!(orchestrator.records().len(), 2);
    assert_eq!(orchestrator.aggregator().metadata().duplicates_skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_gone_item_yields_failed_record_without_retries() {
    let mut pages = two_pages();
    pages[0][2] = item("C", "Charlie", "Org C").gone();
    let mut orchestrator =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(pages), memory_store());

    let start = Instant::now();
    orchestrator.run().await.unwrap();

    let records = orchestrator.records();
    assert_eq!(records.len(), 6);
    let failed: Vec<_> = records.iter().filter(|r| !r.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].item_id, "id_C");
    assert_eq!(failed[0].status.reason(), Some("item no longer available"));
    assert_eq!(failed[0].title(), "Charlie");

    let accessor = orchestrator.accessor();
    assert!(!accessor.extract_calls.contains_key("C"));
    for id in ["A", "B", "D", "E", "F"] {
        assert_eq!(accessor.extract_calls.get(id), Some(&1), "item {}", id);
    }

    // No backoff was spent on C
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(orchestrator.aggregator().metadata().failed, 1);
    assert_eq!(orchestrator.aggregator().metadata().successful, 5);
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_item_is_retried_exactly_three_times() {
    let pages = vec![vec![
        item("A", "Alpha", "Org A"),
        item("B", "Bravo", "Org B").unreadable(),
        item("C", "Charlie", "Org C"),
    ]];
    let mut orchestrator =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(pages), memory_store());

    orchestrator.run().await.unwrap();

    let records = orchestrator.records();
    assert_eq!(records.len(), 3);
    assert!(!records[1].is_ok());
    assert_eq!(records[1].attempts, 4);
    assert_eq!(orchestrator.accessor().extract_calls.get("B"), Some(&4));
    assert!(records[0].is_ok());
    assert!(records[2].is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_stop_then_resume_from_checkpoint() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("checkpoints.db");

    // First process: stop requested while the 4th item is being extracted
    let handle = CrawlHandle::new();
    let listing = ScriptedListing::new(two_pages()).with_trigger(4, Trigger::Stop, handle.clone());
    let store = SqliteCheckpointStore::new(&db_path, "scenario").unwrap();
    let mut first = CrawlOrchestrator::new(fast_config(), listing, store).with_handle(handle);

    let outcome = first.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Stopped);
    assert_ne!(first.phase(), CrawlPhase::Completed);
    assert_eq!(first.phase(), CrawlPhase::Idle);
    assert_eq!(first.state().items_processed_count, 4);
    assert_eq!(first.accessor().activations, vec!["A", "B", "C", "D"]);
    let first_session = first.session_id().to_string();
    drop(first);

    let reopened = SqliteCheckpointStore::new(&db_path, "scenario").unwrap();
    let checkpoint = reopened.load().unwrap().unwrap();
    assert_eq!(checkpoint.session_id, first_session);
    assert_eq!(checkpoint.state.items_processed_count, 4);
    assert_eq!(checkpoint.state.current_page_index, 2);
    assert_eq!(checkpoint.recent_records.len(), 4);
    assert_eq!(checkpoint.metadata.total, 4);

    // Second process: resumes at item 5 without revisiting 1-4
    let mut second =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(two_pages()), reopened);
    assert!(second.restore_from_store());

    let outcome = second.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { caveat: None });
    assert_eq!(second.accessor().seeks, vec![2]);
    assert_eq!(second.accessor().activations, vec!["E", "F"]);
    assert_eq!(second.state().items_processed_count, 6);
    assert_eq!(second.session_id(), first_session);

    let sequence: Vec<u64> = second.records().iter().map(|r| r.sequence_number).collect();
    assert_eq!(sequence, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_resume_restores_every_record_past_checkpoint_tail() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("checkpoints.db");
    let page: Vec<_> = (1..=15)
        .map(|i| item(&format!("J{}", i), &format!("Role {}", i), "Org"))
        .collect();

    let handle = CrawlHandle::new();
    let listing =
        ScriptedListing::new(vec![page.clone()]).with_trigger(12, Trigger::Stop, handle.clone());
    let store = SqliteCheckpointStore::new(&db_path, "long").unwrap();
    let mut first = CrawlOrchestrator::new(fast_config(), listing, store).with_handle(handle);

    assert_eq!(first.run().await.unwrap(), RunOutcome::Stopped);
    assert_eq!(first.records().len(), 12);
    drop(first);

    let reopened = SqliteCheckpointStore::new(&db_path, "long").unwrap();
    let checkpoint = reopened.load().unwrap().unwrap();
    assert_eq!(checkpoint.metadata.total, 12);
    assert_eq!(checkpoint.recent_records.len(), CHECKPOINT_RECORD_LIMIT);

    let mut second =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(vec![page]), reopened);
    assert!(second.restore_from_store());
    assert_eq!(second.records().len(), 12);

    let outcome = second.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { caveat: None });
    let metadata = second.aggregator().metadata();
    assert_eq!(metadata.total, 15);
    assert_eq!(second.records().len() as u64, metadata.total);

    let sequence: Vec<u64> = second.records().iter().map(|r| r.sequence_number).collect();
    assert_eq!(sequence, (1..=15).collect::<Vec<u64>>());
    assert_eq!(second.records()[0].item_id, "id_J1");

    let json: serde_json::Value =
        serde_json::from_str(&second.render_all(ExportKind::Json)).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 15);
}

#[tokio::test(start_paused = true)]
async fn test_dedup_survives_resume() {
    let pages = vec![
        vec![item("A", "Alpha", "Org A"), item("B", "X", "Y")],
        vec![item("C", "Charlie", "Org C"), item("D", "X", "Y")],
    ];
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("checkpoints.db");

    let handle = CrawlHandle::new();
    let listing = ScriptedListing::new(pages.clone()).with_trigger(2, Trigger::Stop, handle.clone());
    let store = SqliteCheckpointStore::new(&db_path, "dedup").unwrap();
    let mut first = CrawlOrchestrator::new(fast_config(), listing, store).with_handle(handle);
    assert_eq!(first.run().await.unwrap(), RunOutcome::Stopped);
    drop(first);

    let store = SqliteCheckpointStore::new(&db_path, "dedup").unwrap();
    let mut second = CrawlOrchestrator::new(fast_config(), ScriptedListing::new(pages), store);
    assert!(second.restore_from_store());
    second.run().await.unwrap();

    let metadata = second.aggregator().metadata();
    assert_eq!(metadata.total, 3);
    assert_eq!(metadata.duplicates_skipped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_holds_at_item_boundary() {
    let handle = CrawlHandle::new();
    let listing = ScriptedListing::new(two_pages()).with_trigger(2, Trigger::Pause, handle.clone());
    let mut orchestrator = CrawlOrchestrator::new(fast_config(), listing, memory_store())
        .with_handle(handle.clone());
    let mut events = orchestrator.subscribe();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.resume();
    });

    let start = Instant::now();
    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { caveat: None });
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(orchestrator.records().len(), 6);

    let mut messages = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CrawlEvent::Log { message, .. } = event {
            messages.push(message);
        }
    }
    let paused = messages.iter().position(|m| m == "Crawl paused").unwrap();
    let resumed = messages.iter().position(|m| m == "Crawl resumed").unwrap();
    assert!(paused < resumed);

    // The item in flight when pause was requested still completed
    let extracted_before_pause = messages[..paused]
        .iter()
        .filter(|m| m.starts_with("Extracted #"))
        .count();
    assert_eq!(extracted_before_pause, 2);
}

#[tokio::test(start_paused = true)]
async fn test_events_report_progress_and_completion() {
    let mut orchestrator =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(two_pages()), memory_store());
    let mut events = orchestrator.subscribe();

    orchestrator.run().await.unwrap();

    let mut last_progress = 0;
    let mut pages_seen = Vec::new();
    let mut successes = 0;
    let mut completed = None;
    while let Ok(event) = events.try_recv() {
        match event {
            CrawlEvent::Progress {
                items_processed,
                page,
                max_pages,
            } => {
                assert!(items_processed >= last_progress);
                assert_eq!(max_pages, 10);
                last_progress = items_processed;
                if !pages_seen.contains(&page) {
                    pages_seen.push(page);
                }
            }
            CrawlEvent::Log {
                kind: LogKind::Success,
                ..
            } => successes += 1,
            CrawlEvent::Completed { metadata } => completed = Some(metadata),
            _ => {}
        }
    }

    assert_eq!(last_progress, 6);
    assert_eq!(pages_seen, vec![1, 2]);
    // Six extractions plus the completion message
    assert_eq!(successes, 7);
    assert_eq!(completed.unwrap().total, 6);
}

#[tokio::test(start_paused = true)]
async fn test_export_is_deterministic() {
    let mut orchestrator =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(two_pages()), memory_store());
    orchestrator.run().await.unwrap();

    for kind in [
        ExportKind::Plain,
        ExportKind::Markdown,
        ExportKind::Json,
        ExportKind::Delimited,
    ] {
        assert_eq!(orchestrator.render_all(kind), orchestrator.render_all(kind));
    }

    let json: serde_json::Value =
        serde_json::from_str(&orchestrator.render_all(ExportKind::Json)).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 6);
    assert_eq!(json["metadata"]["total"], 6);
    assert_eq!(json["records"][0]["item_id"], "id_A");

    let delimited = orchestrator.render_all(ExportKind::Delimited);
    assert_eq!(delimited.lines().count(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_completed_crawl_is_not_resumed() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("checkpoints.db");

    let store = SqliteCheckpointStore::new(&db_path, "done").unwrap();
    let mut first =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(two_pages()), store);
    first.run().await.unwrap();
    drop(first);

    let store = SqliteCheckpointStore::new(&db_path, "done").unwrap();
    let mut second =
        CrawlOrchestrator::new(fast_config(), ScriptedListing::new(two_pages()), store);

    assert!(!second.restore_from_store());
    second.run().await.unwrap();
    assert_eq!(second.accessor().activations.len(), 6);
}
