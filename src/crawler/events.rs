use crate::record::AggregateMetadata;
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;

/// Buffered events per subscriber; slow subscribers skip ahead when exceeded
const EVENT_CAPACITY: usize = 256;

/// Severity of a log event shown to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Event stream for presentation layers
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    Progress {
        items_processed: u64,
        page: u32,
        max_pages: u32,
    },
    Log {
        kind: LogKind,
        message: String,
    },
    Stats {
        jobs: u64,
        errors: u64,
        elapsed: Duration,
    },
    Completed {
        metadata: AggregateMetadata,
    },
}

/// Broadcasts crawl events and mirrors log events to `tracing`
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CrawlEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.sender.subscribe()
    }

    /// Sends an event; having no subscribers is not an error
    pub fn emit(&self, event: CrawlEvent) {
        let _ = self.sender.send(event);
    }

    pub fn log(&self, kind: LogKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            LogKind::Info | LogKind::Success => tracing::info!("{}", message),
            LogKind::Warning => tracing::warn!("{}", message),
            LogKind::Error => tracing::error!("{}", message),
        }
        self.emit(CrawlEvent::Log { kind, message });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogKind::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogKind::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogKind::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogKind::Error, message);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
