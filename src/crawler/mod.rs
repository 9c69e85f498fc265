//! Crawler module for walking a paginated listing
//!
//! This module contains the core crawling logic, including:
//! - The page accessor boundary to the listing environment
//! - Work item discovery and stable identifiers
//! - Human-like pacing
//! - Per-item extraction with bounded retries
//! - Overall crawl orchestration with pause/stop and checkpoints

mod accessor;
mod control;
mod discoverer;
mod events;
mod orchestrator;
pub(crate) mod pacer;
mod pipeline;

pub use accessor::{PageAccessor, VisibleItem};
pub use control::CrawlHandle;
pub use discoverer::{assign_identifier, WorkItem, WorkItemDiscoverer};
pub use events::{CrawlEvent, EventBus, LogKind};
pub use orchestrator::{
    CrawlOrchestrator, PageAdvanceError, RunOutcome, MAX_CONSECUTIVE_STALLS, PAGE_ADVANCE_ATTEMPTS,
};
pub use pacer::{Pacer, StdUniform, UniformSource};
pub use pipeline::{ExtractionPipeline, ItemError, MAX_EXTRACTION_RETRIES};
