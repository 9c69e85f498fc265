//! Per-item extraction pipeline
//!
//! Drives one work item through activation, waiting for its detail view,
//! extraction, validation and bounded retries.
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Activation fails | Immediate → Failed (item gone), no retry |
//! | Detail not ready before timeout | Proceed, record marked low confidence |
//! | Extraction returns nothing | Retry with backoff |
//! | Missing title/description, description < 50 chars | Retry with backoff |
//! | Retries exhausted | Failed record with the last reason |
//!
//! Backoff before retry `n` (1-based) is `2^(n-1)` seconds: 1s, 2s, 4s.

use crate::config::{ExtractionConfig, TimingConfig};
use crate::crawler::{PageAccessor, WorkItem};
use crate::record::{DetailFields, ExtractedRecord};
use std::time::Duration;
use thiserror::Error;

/// Retries after the initial extraction attempt
pub const MAX_EXTRACTION_RETRIES: u32 = 3;

/// Upper bound on the readiness wait before a retry
const RETRY_READY_TIMEOUT: Duration = Duration::from_secs(3);

/// Why an item could not be turned into a successful record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// The attempt may succeed if repeated
    #[error("{0}")]
    Transient(String),

    /// The item no longer exists in the environment
    #[error("item no longer available")]
    Gone,
}

/// Turns work items into records
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    detail_timeout: Duration,
    retry_ready_timeout: Duration,
    max_retries: u32,
    extraction: ExtractionConfig,
}

impl ExtractionPipeline {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `timing` - Supplies the detail readiness timeout
    /// * `extraction` - Which optional fields are kept
    pub fn new(timing: &TimingConfig, extraction: ExtractionConfig) -> Self {
        let detail_timeout = timing.detail_timeout();
        Self {
            detail_timeout,
            retry_ready_timeout: detail_timeout.min(RETRY_READY_TIMEOUT),
            max_retries: MAX_EXTRACTION_RETRIES,
            extraction,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff slept before retry `retry` (1-based)
    pub fn backoff(retry: u32) -> Duration {
        Duration::from_secs(1u64 << retry.saturating_sub(1).min(16))
    }

    /// Processes one work item
    ///
    /// Never fails: every item yields exactly one record, successful or not.
    pub async fn process<A: PageAccessor + ?Sized>(
        &self,
        accessor: &mut A,
        item: &WorkItem,
    ) -> ExtractedRecord {
        tracing::debug!("Processing item {}", item.identifier);

        if !accessor.activate(item).await {
            tracing::warn!("Item {} could not be activated", item.identifier);
            return ExtractedRecord::failed(
                item.identifier.clone(),
                card_fields(item),
                ItemError::Gone.to_string(),
            );
        }

        let mut ready = accessor.wait_until_detail_ready(self.detail_timeout).await;
        if !ready {
            tracing::debug!(
                "Detail for {} not ready after {:?}; extracting anyway",
                item.identifier,
                self.detail_timeout
            );
        }

        let mut last_error = ItemError::Transient("no extraction attempted".to_string());
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Self::backoff(attempt);
                tracing::warn!(
                    "Retrying {} in {:?} (retry {}/{}): {}",
                    item.identifier,
                    backoff,
                    attempt,
                    self.max_retries,
                    last_error
                );
                tokio::time::sleep(backoff).await;
                ready = accessor
                    .wait_until_detail_ready(self.retry_ready_timeout)
                    .await;
            }

            match self.extract(accessor).await {
                Ok(fields) => {
                    let mut record = ExtractedRecord::ok(item.identifier.clone(), fields);
                    record.low_confidence = !ready;
                    record.attempts = attempt + 1;
                    return record;
                }
                Err(e) => last_error = e,
            }
        }

        let attempts = self.max_retries + 1;
        tracing::error!(
            "Giving up on {} after {} attempts: {}",
            item.identifier,
            attempts,
            last_error
        );
        let mut record = ExtractedRecord::failed(
            item.identifier.clone(),
            card_fields(item),
            format!("extraction failed after {} attempts: {}", attempts, last_error),
        );
        record.attempts = attempts;
        record
    }

    async fn extract<A: PageAccessor + ?Sized>(&self, accessor: &mut A) -> Result<DetailFields, ItemError> {
        let mut fields = accessor
            .extract_current_detail()
            .await
            .ok_or_else(|| ItemError::Transient("detail could not be read".to_string()))?;

        fields.apply_filter(&self.extraction);
        fields.validate().map_err(ItemError::Transient)?;
        Ok(fields)
    }
}

/// What the listing card showed, kept on failed records for reporting
fn card_fields(item: &WorkItem) -> DetailFields {
    DetailFields {
        title: item.visible.title_text.clone(),
        organization: item.visible.org_text.clone(),
        url: item.visible.detail_link.clone(),
        ..Default::default()
    }
}
