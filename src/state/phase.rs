//! Crawl phase definitions for the orchestrator's state machine
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            +-> Stopping -> Idle (partial progress kept)
//!            +-> Completed
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    /// No run in progress; may hold partial progress from a stopped run
    #[default]
    Idle,

    /// The crawl loop is processing items
    Running,

    /// The crawl loop is suspended at an item boundary
    Paused,

    /// A stop was observed; the final checkpoint is being written
    Stopping,

    /// Every reachable page was exhausted
    Completed,
}

impl CrawlPhase {
    /// Returns true if the crawl loop is live (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::Stopping)
    }

    /// Returns true if the run finished naturally
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Stopping)
                | (Paused, Stopping)
                | (Stopping, Idle)
                | (Running, Completed)
                | (Completed, Idle)
        )
    }

    /// Converts the phase to its persisted string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Completed => "completed",
        }
    }

    /// Parses a phase from its persisted string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            "stopping" => Some(Self::Stopping),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Running,
            Self::Paused,
            Self::Stopping,
            Self::Completed,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
