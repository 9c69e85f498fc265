use crate::output::ExportKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Listing-Harvester
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Listing source for the HTTP adapter; absent when an embedding
    /// application supplies its own page accessor
    pub source: Option<SourceConfig>,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlConfig {
    /// Maximum number of listing pages to walk
    pub max_pages: u32,

    /// Skip records whose (title, organization) pair was already collected
    pub skip_duplicates: bool,

    /// Enable human-like pacing between item actions
    pub anti_detection: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            skip_duplicates: true,
            anti_detection: true,
        }
    }
}

/// Pacing parameters, all in milliseconds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TimingConfig {
    /// Lower bound of the per-action delay
    pub min_delay: u64,

    /// Upper bound of the per-action delay (before fatigue)
    pub max_delay: u64,

    /// Pause before advancing to the next page
    pub page_delay: u64,

    /// Number of actions between coffee breaks
    pub coffee_break_interval: u32,

    /// Nominal length of a coffee break
    pub coffee_break_duration: u64,

    /// Base wait between discovery polls that found nothing new
    pub stall_delay: u64,

    /// How long to wait for an activated item's detail to become ready
    pub detail_timeout: u64,
}

impl TimingConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_timeout)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_delay: 1500,
            max_delay: 3500,
            page_delay: 4000,
            coffee_break_interval: 30,
            coffee_break_duration: 10_000,
            stall_delay: 1500,
            detail_timeout: 10_000,
        }
    }
}

/// Which optional fields are kept on extracted records
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractionConfig {
    pub include_company_info: bool,
    pub include_location: bool,
    pub include_posted_date: bool,
    pub include_application_count: bool,
    pub include_skills_match: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_company_info: true,
            include_location: true,
            include_posted_date: true,
            include_application_count: false,
            include_skills_match: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Export representation written at the end of a run
    pub format: ExportKind,

    /// Path of the exported file
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: ExportKind::Markdown,
            path: "./harvest.md".to_string(),
        }
    }
}

/// Checkpoint persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CheckpointConfig {
    /// Save a checkpoint every `save_interval` processed items
    pub auto_save: bool,

    pub save_interval: u32,

    /// Path to the SQLite database holding checkpoints
    pub database_path: String,

    /// Key under which this process stores its checkpoint
    pub session_key: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            auto_save: true,
            save_interval: 10,
            database_path: "./harvest.db".to_string(),
            session_key: "default".to_string(),
        }
    }
}

/// HTTP listing source used by the bundled HTML page accessor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    /// URL of the first listing page
    pub listing_url: String,

    /// Query parameter carrying the page position
    #[serde(default = "default_page_param")]
    pub page_param: String,

    /// Value of `page_param` for the first page
    #[serde(default = "default_page_start")]
    pub page_start: u32,

    /// Increment of `page_param` per page (1 for page numbers, 25 for offsets)
    #[serde(default = "default_page_step")]
    pub page_step: u32,

    pub selectors: SelectorConfig,
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_page_start() -> u32 {
    1
}

fn default_page_step() -> u32 {
    1
}

/// CSS selectors for the HTML page accessor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// One element per listing card
    pub item: String,

    /// Card attributes holding a stable external identifier, tried in order
    #[serde(default = "default_id_attributes")]
    pub item_id_attributes: Vec<String>,

    /// Anchor inside a card pointing at the item's detail page
    #[serde(default = "default_detail_link")]
    pub detail_link: String,

    /// Path segment preceding the numeric id in a canonical detail link
    #[serde(default = "default_detail_id_marker")]
    pub detail_id_marker: String,

    pub card_title: Option<String>,
    pub card_organization: Option<String>,

    /// Enabled "next page" control; absent or disabled means no next page
    pub next_page: Option<String>,

    pub title: String,
    pub description: String,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub posted_date: Option<String>,
    pub application_count: Option<String>,
    pub skills_match: Option<String>,
    pub insights: Option<String>,
}

fn default_id_attributes() -> Vec<String> {
    vec![
        "data-job-id".to_string(),
        "data-occludable-job-id".to_string(),
        "data-entity-urn".to_string(),
    ]
}

fn default_detail_link() -> String {
    "a[href]".to_string()
}

fn default_detail_id_marker() -> String {
    "/jobs/view/".to_string()
}
