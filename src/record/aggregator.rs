use crate::output::{self, ExportKind};
use crate::record::{AggregateMetadata, DedupKey, DedupTracker, ExtractedRecord, QueryContext};
use std::time::Duration;
use tracing::debug;

/// Ordered, append-only collection of processed records
///
/// Sequence numbers are assigned on admission, so they stay contiguous even
/// when duplicates are skipped.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    records: Vec<ExtractedRecord>,
    metadata: AggregateMetadata,
    dedup: DedupTracker,
}

impl ResultAggregator {
    /// Creates an empty aggregator
    ///
    /// # Arguments
    ///
    /// * `skip_duplicates` - Reject successful records whose content key was seen
    /// * `query` - Query context recorded in the metadata
    pub fn new(skip_duplicates: bool, query: QueryContext) -> Self {
        Self {
            records: Vec::new(),
            metadata: AggregateMetadata::new(query),
            dedup: DedupTracker::new(skip_duplicates),
        }
    }

    /// Rebuilds an aggregator from persisted session data
    ///
    /// Counters continue from `metadata`. `records` is expected to hold every
    /// record admitted so far; anything missing is missing from exports too.
    pub fn restore(
        skip_duplicates: bool,
        metadata: AggregateMetadata,
        records: Vec<ExtractedRecord>,
        seen_keys: Vec<DedupKey>,
    ) -> Self {
        let mut dedup = DedupTracker::new(skip_duplicates);
        if skip_duplicates {
            dedup.seed(seen_keys);
            dedup.seed(records.iter().filter(|r| r.is_ok()).map(|r| r.dedup_key()));
        }
        dedup.set_duplicates_skipped(metadata.duplicates_skipped);

        Self {
            records,
            metadata,
            dedup,
        }
    }

    /// Ingests a record
    ///
    /// # Returns
    ///
    /// `true` if the record was appended, `false` if it was a duplicate
    pub fn admit(&mut self, mut record: ExtractedRecord) -> bool {
        if !self.dedup.should_admit(&record) {
            self.metadata.duplicates_skipped = self.dedup.duplicates_skipped();
            debug!("Skipping duplicate record: {}", record.dedup_key());
            return false;
        }

        self.metadata.total += 1;
        record.sequence_number = self.metadata.total;
        if record.is_ok() {
            self.metadata.successful += 1;
        } else {
            self.metadata.failed += 1;
        }

        self.records.push(record);
        true
    }

    pub fn set_query(&mut self, query: QueryContext) {
        self.metadata.query = query;
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.metadata.elapsed_ms = elapsed.as_millis() as u64;
    }

    pub fn records(&self) -> &[ExtractedRecord] {
        &self.records
    }

    pub fn metadata(&self) -> &AggregateMetadata {
        &self.metadata
    }

    /// Returns copies of the last `n` records
    pub fn tail(&self, n: usize) -> Vec<ExtractedRecord> {
        let start = self.records.len().saturating_sub(n);
        self.records[start..].to_vec()
    }

    pub fn seen_keys(&self) -> Vec<DedupKey> {
        self.dedup.keys()
    }

    /// Number of records admitted so far, including any before a restore
    pub fn admitted_count(&self) -> u64 {
        self.metadata.total
    }

    /// Renders the aggregate in the given export representation
    pub fn render(&self, kind: ExportKind) -> String {
        output::format(&self.metadata, &self.records, kind)
    }
}
