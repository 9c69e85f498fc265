//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the orchestrator's lifecycle phase (idle, running, paused, ...)
//! - `CrawlState`: current page, attempted item identifiers and processed count

mod crawl_state;
mod phase;

// Re-export main types
pub use crawl_state::CrawlState;
pub use phase::CrawlPhase;
