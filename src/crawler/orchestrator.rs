//! Crawl orchestrator - top-level crawl state machine
//!
//! This module contains the main crawl loop that coordinates:
//! - Discovering unprocessed items on the current page
//! - Pacing, extraction and aggregation of one item at a time
//! - Pagination, including stall detection and page-advance retries
//! - Pause/stop handling at item boundaries
//! - Periodic, stop-time and completion checkpoints

use crate::config::Config;
use crate::crawler::{
    CrawlEvent, CrawlHandle, EventBus, ExtractionPipeline, PageAccessor, Pacer, WorkItem,
    WorkItemDiscoverer,
};
use crate::output::ExportKind;
use crate::record::{ExtractedRecord, ResultAggregator};
use crate::state::{CrawlPhase, CrawlState};
use crate::storage::{new_session_id, Checkpoint, CheckpointStore, CHECKPOINT_RECORD_LIMIT};
use crate::HarvestError;
use chrono::Utc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Consecutive discovery polls without a new item before a page is given up
pub const MAX_CONSECUTIVE_STALLS: u32 = 3;

/// Attempts at advancing to the next page before the run ends
pub const PAGE_ADVANCE_ATTEMPTS: u32 = 3;

/// Interval at which a paused crawl re-checks its flags
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The listing could not be moved past a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not advance past page {page} after {attempts} attempts")]
pub struct PageAdvanceError {
    pub page: u32,
    pub attempts: u32,
}

/// How a call to [`CrawlOrchestrator::run`] ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every reachable page was exhausted
    ///
    /// `caveat` is set when the run ended early because pagination failed.
    Completed { caveat: Option<String> },

    /// A stop was requested; progress is kept and `run` may be called again
    Stopped,
}

enum PageOutcome {
    Exhausted,
    Stopped,
}

enum ControlSignal {
    Continue,
    Stop,
}

/// Composes discovery, pacing, extraction, aggregation and checkpointing
pub struct CrawlOrchestrator<A: PageAccessor, S: CheckpointStore> {
    config: Config,
    config_hash: Option<String>,
    accessor: A,
    store: S,
    discoverer: WorkItemDiscoverer,
    pacer: Pacer,
    pipeline: ExtractionPipeline,
    state: CrawlState,
    aggregator: ResultAggregator,
    session_id: String,
    handle: CrawlHandle,
    events: EventBus,
    elapsed_before: Duration,
    segment_started: Option<Instant>,
    needs_seek: bool,
}

impl<A: PageAccessor, S: CheckpointStore> CrawlOrchestrator<A, S> {
    /// Creates an idle orchestrator
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `accessor` - Boundary to the listing environment
    /// * `store` - Checkpoint backend
    pub fn new(config: Config, accessor: A, store: S) -> Self {
        let discoverer = match &config.source {
            Some(source) => WorkItemDiscoverer::new(source.selectors.detail_id_marker.clone()),
            None => WorkItemDiscoverer::default(),
        };
        let pacer = Pacer::new(config.timing.clone(), config.crawl.anti_detection);
        let pipeline = ExtractionPipeline::new(&config.timing, config.extraction.clone());
        let aggregator = ResultAggregator::new(config.crawl.skip_duplicates, Default::default());

        Self {
            config,
            config_hash: None,
            accessor,
            store,
            discoverer,
            pacer,
            pipeline,
            state: CrawlState::new(),
            aggregator,
            session_id: new_session_id(),
            handle: CrawlHandle::new(),
            events: EventBus::new(),
            elapsed_before: Duration::ZERO,
            segment_started: None,
            needs_seek: false,
        }
    }

    /// Records the configuration hash stored in checkpoints
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Replaces the pacer (e.g. with a seeded random source)
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Uses an externally created control handle
    pub fn with_handle(mut self, handle: CrawlHandle) -> Self {
        self.handle = handle;
        self
    }

    pub fn handle(&self) -> CrawlHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn phase(&self) -> CrawlPhase {
        self.state.phase
    }

    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    pub fn records(&self) -> &[ExtractedRecord] {
        self.aggregator.records()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Renders everything aggregated so far; callable at any time
    pub fn render_all(&self, kind: ExportKind) -> String {
        self.aggregator.render(kind)
    }

    /// Loads the stored checkpoint so the next `run` resumes from it
    ///
    /// Checkpoints older than 24 hours, and those of completed sessions, are
    /// not resumed. Stale ones are also deleted. Storage failures are logged
    /// and treated as "nothing to resume".
    ///
    /// # Returns
    ///
    /// `true` if progress was restored
    pub fn restore_from_store(&mut self) -> bool {
        let checkpoint = match self.store.load() {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => {
                tracing::debug!("No checkpoint to restore");
                return false;
            }
            Err(e) => {
                self.events
                    .error(format!("Failed to load checkpoint: {}", e));
                return false;
            }
        };

        if checkpoint.is_stale(Utc::now()) {
            self.events.info(format!(
                "Discarding stale checkpoint {} saved at {}",
                checkpoint.session_id, checkpoint.saved_at
            ));
            if let Err(e) = self.store.clear() {
                self.events
                    .error(format!("Failed to clear stale checkpoint: {}", e));
            }
            return false;
        }

        if checkpoint.state.phase == CrawlPhase::Completed {
            self.events.info(format!(
                "Previous session {} already completed; starting fresh",
                checkpoint.session_id
            ));
            return false;
        }

        if let (Some(stored), Some(current)) = (&checkpoint.config_hash, &self.config_hash) {
            if stored != current {
                self.events.warning(
                    "Configuration changed since the checkpoint was saved; resuming anyway",
                );
            }
        }

        let Checkpoint {
            session_id,
            mut state,
            metadata,
            recent_records,
            seen_keys,
            ..
        } = checkpoint;

        state.phase = CrawlPhase::Idle;
        // Keep the counter consistent with the restored aggregate
        state.items_processed_count = metadata.total;

        let records = self.restored_records(&session_id, metadata.total, recent_records);

        self.elapsed_before = metadata.elapsed();
        self.aggregator = ResultAggregator::restore(
            self.config.crawl.skip_duplicates,
            metadata,
            records,
            seen_keys,
        );
        self.session_id = session_id;
        self.needs_seek = state.current_page_index > 1;

        self.events.info(format!(
            "Restored session {}: page {}, {} items processed",
            self.session_id, state.current_page_index, state.items_processed_count
        ));
        self.state = state;
        true
    }

    /// Picks the session's full record list, falling back to the checkpoint tail
    fn restored_records(
        &mut self,
        session_id: &str,
        total: u64,
        recent: Vec<ExtractedRecord>,
    ) -> Vec<ExtractedRecord> {
        match self.store.load_records(session_id) {
            Ok(Some(records)) if records.len() as u64 == total => return records,
            Ok(Some(records)) => tracing::debug!(
                "Stored record list of {} holds {} of {} records",
                session_id,
                records.len(),
                total
            ),
            Ok(None) => {}
            Err(e) => self
                .events
                .error(format!("Failed to load session records: {}", e)),
        }

        if (recent.len() as u64) < total {
            self.events.warning(format!(
                "Only the last {} of {} records could be restored",
                recent.len(),
                total
            ));
        }
        recent
    }

    /// Discards all progress and returns to a fresh idle state
    ///
    /// The stored checkpoint is left untouched.
    pub fn reset(&mut self) {
        self.state = CrawlState::new();
        self.aggregator =
            ResultAggregator::new(self.config.crawl.skip_duplicates, Default::default());
        self.session_id = new_session_id();
        self.pacer.reset();
        self.elapsed_before = Duration::ZERO;
        self.segment_started = None;
        self.needs_seek = false;
        self.handle.clear();
    }

    /// Runs the crawl until completion or a stop request
    ///
    /// Calling `run` again after a stop resumes from the preserved position.
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome)` - How the run ended
    /// * `Err(HarvestError::InvalidTransition)` - The crawl already completed;
    ///   call `reset` first
    pub async fn run(&mut self) -> Result<RunOutcome, HarvestError> {
        if !self.state.phase.can_transition_to(CrawlPhase::Running) {
            return Err(HarvestError::InvalidTransition {
                from: self.state.phase,
                to: CrawlPhase::Running,
            });
        }

        let resuming = self.state.has_progress();
        if resuming {
            self.events.info(format!(
                "Resuming session {} at page {} ({} items processed)",
                self.session_id, self.state.current_page_index, self.state.items_processed_count
            ));
            if self.needs_seek {
                let page = self.state.current_page_index;
                if !self.accessor.seek_page(page).await {
                    self.events.warning(format!(
                        "Could not position the listing at page {}; continuing from the current view",
                        page
                    ));
                }
                self.needs_seek = false;
            }
        } else {
            self.reset();
            let query = self.accessor.query_context().await;
            self.aggregator.set_query(query);
            self.events
                .info(format!("Starting session {}", self.session_id));
        }

        self.handle.clear();
        self.set_phase(CrawlPhase::Running)?;
        self.segment_started = Some(Instant::now());

        let outcome = self.crawl_loop().await;
        self.refresh_elapsed();

        match outcome {
            RunOutcome::Stopped => {
                self.set_phase(CrawlPhase::Stopping)?;
                if self.aggregator.admitted_count() > 0 {
                    self.save_checkpoint(CrawlPhase::Idle);
                }
                self.elapsed_before = self.aggregator.metadata().elapsed();
                self.segment_started = None;
                self.set_phase(CrawlPhase::Idle)?;
                self.events.warning(format!(
                    "Crawl stopped after {} items",
                    self.state.items_processed_count
                ));
            }
            RunOutcome::Completed { ref caveat } => {
                self.set_phase(CrawlPhase::Completed)?;
                if self.aggregator.admitted_count() > 0 {
                    self.save_checkpoint(CrawlPhase::Completed);
                }
                self.segment_started = None;
                match caveat {
                    Some(caveat) => self.events.warning(format!(
                        "Crawl finished early: {} ({} items)",
                        caveat, self.state.items_processed_count
                    )),
                    None => self.events.success(format!(
                        "Crawl complete: {} items processed",
                        self.state.items_processed_count
                    )),
                }
                self.events.emit(CrawlEvent::Completed {
                    metadata: self.aggregator.metadata().clone(),
                });
            }
        }

        self.emit_stats();
        Ok(outcome)
    }

    async fn crawl_loop(&mut self) -> RunOutcome {
        let max_pages = self.config.crawl.max_pages;

        loop {
            if self.state.current_page_index > max_pages {
                return RunOutcome::Completed { caveat: None };
            }

            self.events.info(format!(
                "Processing page {}/{}",
                self.state.current_page_index, max_pages
            ));
            self.emit_progress();

            if let PageOutcome::Stopped = self.process_page().await {
                return RunOutcome::Stopped;
            }

            if self.state.current_page_index >= max_pages {
                self.events
                    .info(format!("Reached the page limit ({})", max_pages));
                return RunOutcome::Completed { caveat: None };
            }

            if !self.accessor.has_next_page().await {
                self.events.info("No more pages");
                return RunOutcome::Completed { caveat: None };
            }

            if let ControlSignal::Stop = self.check_controls().await {
                return RunOutcome::Stopped;
            }

            self.pacer.page_delay().await;

            if let Err(e) = self.advance_page().await {
                self.events.error(format!("Page advance failed: {}", e));
                return RunOutcome::Completed {
                    caveat: Some(e.to_string()),
                };
            }

            self.state.current_page_index += 1;
        }
    }

    /// Processes unprocessed items on the current page until it runs dry
    async fn process_page(&mut self) -> PageOutcome {
        let mut stalls = 0;

        loop {
            if let ControlSignal::Stop = self.check_controls().await {
                return PageOutcome::Stopped;
            }

            let Some(item) = self.next_unprocessed_item().await else {
                stalls += 1;
                if stalls >= MAX_CONSECUTIVE_STALLS {
                    tracing::debug!(
                        "No new items on page {} after {} polls",
                        self.state.current_page_index,
                        stalls
                    );
                    return PageOutcome::Exhausted;
                }
                self.pacer.stall_wait().await;
                continue;
            };

            stalls = 0;
            self.state.mark_processed(&item.identifier);

            self.pacer.before_action().await;
            let record = self.pipeline.process(&mut self.accessor, &item).await;
            self.ingest(record);

            self.emit_progress();
            self.emit_stats();
            self.maybe_autosave();
        }
    }

    async fn next_unprocessed_item(&mut self) -> Option<WorkItem> {
        let items = self.discoverer.discover(&mut self.accessor).await;
        items
            .into_iter()
            .find(|item| !self.state.is_processed(&item.identifier))
    }

    async fn advance_page(&mut self) -> Result<(), PageAdvanceError> {
        for attempt in 1..=PAGE_ADVANCE_ATTEMPTS {
            if self.accessor.advance_page().await {
                return Ok(());
            }
            self.events.warning(format!(
                "Page advance attempt {}/{} failed",
                attempt, PAGE_ADVANCE_ATTEMPTS
            ));
            if attempt < PAGE_ADVANCE_ATTEMPTS {
                self.pacer.stall_wait().await;
            }
        }
        Err(PageAdvanceError {
            page: self.state.current_page_index,
            attempts: PAGE_ADVANCE_ATTEMPTS,
        })
    }

    fn ingest(&mut self, record: ExtractedRecord) {
        let item_id = record.item_id.clone();
        let title = record.title().to_string();
        let failure = record.status.reason().map(str::to_string);

        if !self.aggregator.admit(record) {
            self.events
                .info(format!("Skipped duplicate: {}", title));
            return;
        }

        self.state.items_processed_count = self.aggregator.admitted_count();
        match failure {
            Some(reason) => self
                .events
                .error(format!("Failed to extract {}: {}", item_id, reason)),
            None => self.events.success(format!(
                "Extracted #{}: {}",
                self.state.items_processed_count, title
            )),
        }
    }

    /// Waits while paused; reports whether a stop was requested
    async fn check_controls(&mut self) -> ControlSignal {
        if self.handle.is_stop_requested() {
            return ControlSignal::Stop;
        }

        if self.handle.is_paused() {
            if self.set_phase(CrawlPhase::Paused).is_ok() {
                self.events.info("Crawl paused");
            }
            while self.handle.is_paused() {
                if self.handle.is_stop_requested() {
                    return ControlSignal::Stop;
                }
                tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
            }
            if self.set_phase(CrawlPhase::Running).is_ok() {
                self.events.info("Crawl resumed");
            }
        }

        if self.handle.is_stop_requested() {
            ControlSignal::Stop
        } else {
            ControlSignal::Continue
        }
    }

    fn maybe_autosave(&mut self) {
        let checkpoint = &self.config.checkpoint;
        if !checkpoint.auto_save {
            return;
        }

        let count = self.state.items_processed_count;
        let interval = u64::from(checkpoint.save_interval.max(1));
        if count > 0 && count % interval == 0 {
            self.save_checkpoint(CrawlPhase::Running);
        }
    }

    /// Writes the record list and a checkpoint; failures are logged and the
    /// crawl continues
    fn save_checkpoint(&mut self, phase: CrawlPhase) -> bool {
        self.refresh_elapsed();

        let records_saved = match self
            .store
            .save_records(&self.session_id, self.aggregator.records())
        {
            Ok(()) => true,
            Err(e) => {
                self.events
                    .error(format!("Failed to save session records: {}", e));
                false
            }
        };

        let mut state = self.state.clone();
        state.phase = phase;
        let checkpoint = Checkpoint::for_session(
            self.session_id.clone(),
            state,
            self.aggregator.metadata().clone(),
            self.aggregator.tail(CHECKPOINT_RECORD_LIMIT),
            self.aggregator.seen_keys(),
            self.config_hash.clone(),
        );

        match self.store.save(&checkpoint) {
            Ok(()) => {
                tracing::debug!(
                    "Checkpoint saved ({} items, page {})",
                    checkpoint.state.items_processed_count,
                    checkpoint.state.current_page_index
                );
                records_saved
            }
            Err(e) => {
                self.events
                    .error(format!("Failed to save checkpoint: {}", e));
                false
            }
        }
    }

    fn set_phase(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        let current = self.state.phase;
        if current == next {
            return Ok(());
        }
        if !current.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        tracing::debug!("Phase {} -> {}", current, next);
        self.state.phase = next;
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        let segment = self
            .segment_started
            .map(|started| started.elapsed())
            .unwrap_or_default();
        self.elapsed_before + segment
    }

    fn refresh_elapsed(&mut self) {
        let elapsed = self.elapsed();
        self.aggregator.set_elapsed(elapsed);
    }

    fn emit_progress(&self) {
        self.events.emit(CrawlEvent::Progress {
            items_processed: self.state.items_processed_count,
            page: self.state.current_page_index,
            max_pages: self.config.crawl.max_pages,
        });
    }

    fn emit_stats(&self) {
        let metadata = self.aggregator.metadata();
        self.events.emit(CrawlEvent::Stats {
            jobs: metadata.successful,
            errors: metadata.failed,
            elapsed: self.elapsed(),
        });
    }
}
