//! Record id generation.
//!
//! Ids have the form `{YYYYMMDD}_{hash4}_{counter3}`. The hash keeps ids of
//! different projects apart on a shared day; the counter is the lowest
//! positive integer not yet used for this project and date.

use crate::models::{DebugIndex, RecordId};
use crate::storage::RecordStore;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Generates the next free record id for `date`.
///
/// A counter is taken only if its id is absent from both the index
/// projection and the record store, so a stale or lost index never leads
/// to an existing record file being reused.
#[must_use]
pub fn next_record_id(
    index: &DebugIndex,
    store: &dyn RecordStore,
    project_hash: &str,
    date: NaiveDate,
) -> RecordId {
    let prefix = format!("{}_{project_hash}_", date.format("%Y%m%d"));

    let used: HashSet<&str> = index
        .records
        .iter()
        .map(|entry| entry.id.as_str())
        .filter(|id| id.starts_with(&prefix))
        .collect();

    let mut counter: u32 = 1;
    loop {
        let candidate = format!("{prefix}{counter:03}");
        if !used.contains(candidate.as_str()) {
            let id = RecordId::new(candidate);
            if !store.contains(&id) {
                return id;
            }
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndexEntry;
    use crate::storage::FilesystemRecordStore;
    use chrono::Local;
    use std::fs;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 18).unwrap()
    }

    fn entry(id: &str) -> IndexEntry {
        IndexEntry {
            id: RecordId::new(id),
            timestamp: Local::now().naive_local(),
            error_type: "TypeError".to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_first_id_of_the_day() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemRecordStore::new(dir.path());

        let id = next_record_id(&DebugIndex::new(), &store, "ab12", date());
        assert_eq!(id.as_str(), "20260118_ab12_001");
    }

    #[test]
    fn test_fills_lowest_gap() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemRecordStore::new(dir.path());
        let mut index = DebugIndex::new();
        index.records.push(entry("20260118_ab12_001"));
        index.records.push(entry("20260118_ab12_003"));

        let id = next_record_id(&index, &store, "ab12", date());
        assert_eq!(id.as_str(), "20260118_ab12_002");
    }

    #[test]
    fn test_other_projects_and_days_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemRecordStore::new(dir.path());
        let mut index = DebugIndex::new();
        index.records.push(entry("20260118_ffff_001"));
        index.records.push(entry("20260117_ab12_001"));

        let id = next_record_id(&index, &store, "ab12", date());
        assert_eq!(id.as_str(), "20260118_ab12_001");
    }

    #[test]
    fn test_skips_files_missing_from_index() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemRecordStore::new(dir.path());
        fs::write(dir.path().join("20260118_ab12_001.json"), "{}").unwrap();

        let id = next_record_id(&DebugIndex::new(), &store, "ab12", date());
        assert_eq!(id.as_str(), "20260118_ab12_002");
    }

    #[test]
    fn test_counter_grows_past_three_digits() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemRecordStore::new(dir.path());
        let mut index = DebugIndex::new();
        for i in 1..=999 {
            index.records.push(entry(&format!("20260118_ab12_{i:03}")));
        }

        let id = next_record_id(&index, &store, "ab12", date());
        assert_eq!(id.as_str(), "20260118_ab12_1000");
    }
}
