//! Index structure persisted as `index.json`.
//!
//! The index is a derived structure: a compact projection of every record
//! plus three inverted indexes. It can always be regenerated from the
//! record files.

use super::{DebugRecord, RecordId};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current schema version of the index file.
pub const CURRENT_INDEX_VERSION: u32 = 4;

/// Maximum number of tags kept on a compact index entry.
pub const MAX_ENTRY_TAGS: usize = 5;

/// Inverted index: lowercased key to ordered, de-duplicated record ids.
pub type Postings = BTreeMap<String, Vec<RecordId>>;

/// Compact projection of a record kept in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Record id.
    pub id: RecordId,
    /// Record creation time.
    pub timestamp: NaiveDateTime,
    /// The record's `context.error_type`.
    pub error_type: String,
    /// The first few tags of the record.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&DebugRecord> for IndexEntry {
    fn from(record: &DebugRecord) -> Self {
        Self {
            id: record.id.clone(),
            timestamp: record.timestamp,
            error_type: record.context.error_type.clone(),
            tags: record.tags.iter().take(MAX_ENTRY_TAGS).cloned().collect(),
        }
    }
}

/// The per-project index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugIndex {
    /// Schema version.
    pub version: u32,
    /// When the index was first created.
    pub created_at: NaiveDateTime,
    /// When the index was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    /// When the index was last rebuilt from record files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebuilt_at: Option<NaiveDateTime>,
    /// Append-ordered record projections.
    #[serde(default)]
    pub records: Vec<IndexEntry>,
    /// Lowercased tag to record ids.
    #[serde(default)]
    pub tags: Postings,
    /// Lowercased error type to record ids.
    #[serde(default)]
    pub error_types: Postings,
    /// Lowercased keyword to record ids. May be empty after compaction.
    #[serde(default)]
    pub keywords: Postings,
}

impl DebugIndex {
    /// Creates an empty index stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::created_at(Local::now().naive_local())
    }

    /// Creates an empty index with a given creation time.
    #[must_use]
    pub const fn created_at(created_at: NaiveDateTime) -> Self {
        Self {
            version: CURRENT_INDEX_VERSION,
            created_at,
            updated_at: None,
            rebuilt_at: None,
            records: Vec::new(),
            tags: BTreeMap::new(),
            error_types: BTreeMap::new(),
            keywords: BTreeMap::new(),
        }
    }

    /// Returns the most recent `limit` entries, oldest first.
    #[must_use]
    pub fn recent_entries(&self, limit: usize) -> &[IndexEntry] {
        let start = self.records.len().saturating_sub(limit);
        &self.records[start..]
    }

    /// Returns summary counts.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            records: self.records.len(),
            tags: self.tags.len(),
            error_types: self.error_types.len(),
            keywords: self.keywords.len(),
        }
    }
}

impl Default for DebugIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends `id` to the bucket for `key` unless it is already present.
///
/// Returns true if the id was inserted.
pub fn insert_posting(postings: &mut Postings, key: &str, id: &RecordId) -> bool {
    if key.is_empty() {
        return false;
    }
    let ids = postings.entry(key.to_string()).or_default();
    if ids.contains(id) {
        return false;
    }
    ids.push(id.clone());
    true
}

/// Summary counts for an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of record projections.
    pub records: usize,
    /// Number of distinct tags.
    pub tags: usize,
    /// Number of distinct error types.
    pub error_types: usize,
    /// Number of distinct keywords.
    pub keywords: usize,
}

/// Outcome of a full index rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildStats {
    /// Record files indexed.
    pub records: usize,
    /// Tag associations written.
    pub tags: usize,
    /// Keyword associations written.
    pub keywords: usize,
    /// Record files that could not be parsed.
    pub errors: usize,
}

/// Outcome of a keyword compaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactStats {
    /// Keyword buckets dropped.
    pub keywords_removed: usize,
    /// Record projections kept.
    pub records_kept: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> IndexEntry {
        IndexEntry {
            id: RecordId::new(id),
            timestamp: Local::now().naive_local(),
            error_type: "TypeError".to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_insert_posting_deduplicates() {
        let mut postings = Postings::new();
        let id = RecordId::new("20260118_ab12_001");

        assert!(insert_posting(&mut postings, "python", &id));
        assert!(!insert_posting(&mut postings, "python", &id));
        assert_eq!(postings["python"].len(), 1);
    }

    #[test]
    fn test_insert_posting_ignores_empty_key() {
        let mut postings = Postings::new();
        assert!(!insert_posting(&mut postings, "", &RecordId::new("x")));
        assert!(postings.is_empty());
    }

    #[test]
    fn test_recent_entries_truncates_oldest() {
        let mut index = DebugIndex::new();
        for i in 1..=5 {
            index.records.push(entry(&format!("20260118_ab12_00{i}")));
        }

        let recent = index.recent_entries(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id.as_str(), "20260118_ab12_004");
        assert_eq!(recent[1].id.as_str(), "20260118_ab12_005");
        assert_eq!(index.recent_entries(50).len(), 5);
    }

    #[test]
    fn test_entry_keeps_at_most_five_tags() {
        let record = DebugRecord {
            id: RecordId::new("20260118_ab12_001"),
            timestamp: Local::now().naive_local(),
            context: super::super::ErrorContext::default(),
            cause: String::new(),
            solution: String::new(),
            tags: (0..8).map(|i| format!("t{i}")).collect(),
        };
        let entry = IndexEntry::from(&record);
        assert_eq!(entry.tags.len(), MAX_ENTRY_TAGS);
        assert_eq!(entry.error_type, "Unknown");
    }

    #[test]
    fn test_missing_maps_default_to_empty() {
        let json = r#"{"version": 4, "created_at": "2026-01-18T10:00:00", "records": []}"#;
        let index: DebugIndex = serde_json::from_str(json).unwrap();
        assert!(index.tags.is_empty());
        assert!(index.keywords.is_empty());
        assert!(index.error_types.is_empty());
    }
}
