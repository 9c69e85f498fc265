use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable pause/stop switch for a running crawl
///
/// The orchestrator polls these flags at item and page boundaries, so an
/// in-flight extraction always completes before a pause or stop takes effect.
#[derive(Debug, Clone, Default)]
pub struct CrawlHandle {
    paused: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
}

impl CrawlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Requests a stop at the next item boundary
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Clears both flags before a new run segment
    pub(crate) fn clear(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.stop_requested.store(false, Ordering::SeqCst);
    }
}
