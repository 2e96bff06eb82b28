//! Per-category usage aggregation for dashboards. Pure, one pass, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{FileKind, FileRecord};

/// Default storage capacity per user: 2 GiB
pub const DEFAULT_CAPACITY_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Byte total and most-recent modification time for one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryUsage {
    pub size_bytes: u64,
    pub latest: Option<DateTime<Utc>>,
}

impl CategoryUsage {
    fn add(&mut self, record: &FileRecord) {
        self.size_bytes += record.size_bytes;
        // Strictly greater, so the reduction stays commutative
        if self.latest.map_or(true, |seen| record.updated_at > seen) {
            self.latest = Some(record.updated_at);
        }
    }
}

/// Usage dashboard summary: one entry per category plus the combined total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub document: CategoryUsage,
    pub image: CategoryUsage,
    pub video: CategoryUsage,
    pub audio: CategoryUsage,
    pub other: CategoryUsage,
    pub used: u64,
    pub capacity: u64,
}

impl Default for UsageSummary {
    fn default() -> Self {
        Self {
            document: CategoryUsage::default(),
            image: CategoryUsage::default(),
            video: CategoryUsage::default(),
            audio: CategoryUsage::default(),
            other: CategoryUsage::default(),
            used: 0,
            capacity: DEFAULT_CAPACITY_BYTES,
        }
    }
}

impl UsageSummary {
    /// The entry for one category
    pub fn category(&self, kind: FileKind) -> &CategoryUsage {
        match kind {
            FileKind::Document => &self.document,
            FileKind::Image => &self.image,
            FileKind::Video => &self.video,
            FileKind::Audio => &self.audio,
            FileKind::Other => &self.other,
        }
    }

    fn category_mut(&mut self, kind: FileKind) -> &mut CategoryUsage {
        match kind {
            FileKind::Document => &mut self.document,
            FileKind::Image => &mut self.image,
            FileKind::Video => &mut self.video,
            FileKind::Audio => &mut self.audio,
            FileKind::Other => &mut self.other,
        }
    }

    /// Bytes still available under the capacity
    pub fn remaining(&self) -> u64 {
        self.capacity.saturating_sub(self.used)
    }
}

/// Summarize a user's records with the default 2 GiB capacity
pub fn summarize<'a, I>(records: I) -> UsageSummary
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    summarize_with_capacity(records, DEFAULT_CAPACITY_BYTES)
}

/// Summarize a user's records against an explicit capacity.
///
/// Order-independent: totals are sums and the per-category `latest` is a
/// commutative max, so any permutation of the input yields the same summary.
pub fn summarize_with_capacity<'a, I>(records: I, capacity: u64) -> UsageSummary
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    let mut summary = UsageSummary {
        capacity,
        ..UsageSummary::default()
    };
    for record in records {
        summary.category_mut(record.kind).add(record);
        summary.used += record.size_bytes;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlobKey, FileId};
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn record(kind: FileKind, size_bytes: u64, updated_secs: i64) -> FileRecord {
        let at = Utc.timestamp_opt(updated_secs, 0).unwrap();
        FileRecord {
            id: FileId::new(),
            blob_key: BlobKey::new(),
            name: "f".to_string(),
            extension: String::new(),
            kind,
            size_bytes,
            owner_id: "u1".to_string(),
            account_id: "acct-1".to_string(),
            shared_with: BTreeSet::new(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn empty_input_is_all_zeros() {
        let summary = summarize([]);
        assert_eq!(summary.used, 0);
        assert_eq!(summary.capacity, DEFAULT_CAPACITY_BYTES);
        for kind in FileKind::ALL {
            assert_eq!(summary.category(kind).size_bytes, 0);
            assert_eq!(summary.category(kind).latest, None);
        }
    }

    #[test]
    fn sums_per_category_and_total() {
        let records = vec![
            record(FileKind::Document, 10, 100),
            record(FileKind::Document, 5, 300),
            record(FileKind::Image, 7, 200),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.document.size_bytes, 15);
        assert_eq!(summary.image.size_bytes, 7);
        assert_eq!(summary.used, 22);
        assert_eq!(
            summary.document.latest,
            Some(Utc.timestamp_opt(300, 0).unwrap())
        );
        assert_eq!(summary.remaining(), DEFAULT_CAPACITY_BYTES - 22);
    }

    #[test]
    fn invariant_under_permutation() {
        let mut records = vec![
            record(FileKind::Audio, 3, 50),
            record(FileKind::Video, 9, 500),
            record(FileKind::Audio, 4, 20),
            record(FileKind::Other, 1, 999),
        ];
        let forward = summarize(&records);
        records.reverse();
        let backward = summarize(&records);

        assert_eq!(forward, backward);
    }

    #[test]
    fn latest_uses_strictly_greater() {
        let records = vec![
            record(FileKind::Image, 1, 100),
            record(FileKind::Image, 2, 100),
        ];
        let summary = summarize(&records);
        assert_eq!(
            summary.image.latest,
            Some(Utc.timestamp_opt(100, 0).unwrap())
        );
    }

    #[test]
    fn explicit_capacity_is_respected() {
        let records = vec![record(FileKind::Other, 40, 1)];
        let summary = summarize_with_capacity(&records, 100);
        assert_eq!(summary.capacity, 100);
        assert_eq!(summary.remaining(), 60);
    }
}
