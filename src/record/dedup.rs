use crate::record::ExtractedRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Case-normalized `(title, organization)` content key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn new(title: &str, organization: &str) -> Self {
        Self(format!("{}_{}", title, organization).to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides whether a record's content was already collected
///
/// Distinct from the crawl state's attempted-identifier set: two different
/// work items can carry the same content, and the second one is skipped here.
#[derive(Debug, Clone)]
pub struct DedupTracker {
    enabled: bool,
    seen: HashSet<DedupKey>,
    duplicates_skipped: u64,
}

impl DedupTracker {
    /// Creates a tracker; a disabled tracker admits everything
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            seen: HashSet::new(),
            duplicates_skipped: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Admits a record unless its content key was seen before
    ///
    /// Failed records are always admitted and never occupy a key.
    ///
    /// # Returns
    ///
    /// `false` (and the duplicate counter is incremented) if the key is known
    pub fn should_admit(&mut self, record: &ExtractedRecord) -> bool {
        if !self.enabled || !record.is_ok() {
            return true;
        }

        let key = record.dedup_key();
        if self.seen.contains(&key) {
            self.duplicates_skipped += 1;
            return false;
        }

        self.seen.insert(key);
        true
    }

    /// Marks keys as seen without counting them (used when resuming)
    pub fn seed<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = DedupKey>,
    {
        self.seen.extend(keys);
    }

    pub fn duplicates_skipped(&self) -> u64 {
        self.duplicates_skipped
    }

    pub fn set_duplicates_skipped(&mut self, count: u64) {
        self.duplicates_skipped = count;
    }

    /// Returns the seen keys in sorted order
    pub fn keys(&self) -> Vec<DedupKey> {
        let mut keys: Vec<DedupKey> = self.seen.iter().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
