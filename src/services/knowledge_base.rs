//! Project-scoped debug knowledge base.
//!
//! Ties the record store, the index file, the index maintainer, and the
//! retrieval engine together behind one handle. Every mutation follows the
//! same sequence: write record files, update the in-memory index, then
//! replace `index.json`.
//!
//! There is no cross-process locking: two handles writing to the same
//! project at once can lose index updates. `rebuild_index` repairs that.

use crate::Result;
use crate::models::{
    CompactStats, DebugIndex, DebugRecord, IndexEntry, IndexStats, RebuildStats, RecordId,
    RecordSubmission, SearchQuery, SearchResult,
};
use crate::services::id_generator::next_record_id;
use crate::services::{InvertedIndexMaintainer, PathManager, RetrievalEngine};
use crate::storage::{FilesystemRecordStore, IndexFile, RecordStore};
use chrono::Local;
use std::path::Path;
use tracing::instrument;

/// A project's debug knowledge base.
///
/// Construct one per project and pass it to whatever needs it; there is no
/// process-wide instance.
#[derive(Debug)]
pub struct DebugKnowledgeBase<S = FilesystemRecordStore> {
    paths: PathManager,
    store: S,
    index_file: IndexFile,
    index: DebugIndex,
    maintainer: InvertedIndexMaintainer,
    engine: RetrievalEngine,
}

impl DebugKnowledgeBase {
    /// Opens the knowledge base stored under `{project}/.mcp-sidecar/debug/`.
    ///
    /// Nothing is created on disk until the first write.
    #[must_use]
    pub fn open(project_dir: impl AsRef<Path>) -> Self {
        Self::open_with(PathManager::for_project(project_dir))
    }

    /// Opens the knowledge base at the locations given by `paths`.
    #[must_use]
    pub fn open_with(paths: PathManager) -> Self {
        let store = FilesystemRecordStore::new(paths.storage_dir());
        Self::with_store(paths, store)
    }
}

impl<S: RecordStore> DebugKnowledgeBase<S> {
    /// Creates a knowledge base over an explicit record store.
    ///
    /// The index is loaded from `paths.index_path()`; a missing or corrupt
    /// index starts out empty.
    #[must_use]
    pub fn with_store(paths: PathManager, store: S) -> Self {
        let index_file = IndexFile::new(paths.index_path());
        let index = index_file.load();
        tracing::debug!(
            storage_dir = %paths.storage_dir().display(),
            records = index.records.len(),
            "Opened debug knowledge base"
        );
        Self {
            paths,
            store,
            index_file,
            index,
            maintainer: InvertedIndexMaintainer::new(),
            engine: RetrievalEngine::new(),
        }
    }

    /// Returns the storage paths.
    #[must_use]
    pub const fn paths(&self) -> &PathManager {
        &self.paths
    }

    /// Returns the in-memory index.
    #[must_use]
    pub const fn index(&self) -> &DebugIndex {
        &self.index
    }

    /// Returns the record store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Records a new debug experience and returns its id.
    ///
    /// The record file is written before the index, so a failed index write
    /// leaves a record that the next rebuild picks up.
    ///
    /// # Errors
    ///
    /// Returns an error if the record file or the index cannot be written.
    #[instrument(skip(self, submission), fields(error_type = %submission.context.error_type, record_id))]
    pub fn record(&mut self, submission: RecordSubmission) -> Result<RecordId> {
        self.paths.ensure_storage_dir()?;

        let timestamp = Local::now().naive_local();
        let id = next_record_id(
            &self.index,
            &self.store,
            &self.paths.record_id_hash(),
            timestamp.date(),
        );
        tracing::Span::current().record("record_id", id.as_str());

        let record = DebugRecord {
            id: id.clone(),
            timestamp,
            context: submission.context,
            cause: submission.cause,
            solution: submission.solution,
            tags: submission.tags,
        };

        self.store.write(&record)?;
        self.maintainer.apply_record(&mut self.index, &record);
        self.index_file.save(&mut self.index)?;

        metrics::counter!("debug_record_total").increment(1);
        tracing::info!(record_id = %id, tags = record.tags.len(), "Debug record created");
        Ok(id)
    }

    /// Returns the full record for `id`, or `None` if it is missing or unreadable.
    #[must_use]
    pub fn get_record(&self, id: &RecordId) -> Option<DebugRecord> {
        match self.store.get(id) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(record_id = %id, error = %e, "Failed to read record");
                None
            },
        }
    }

    /// Returns the most recent `limit` index entries, oldest first.
    #[must_use]
    pub fn list_records(&self, limit: usize) -> Vec<IndexEntry> {
        self.index.recent_entries(limit).to_vec()
    }

    /// Deletes every record file and resets the index.
    ///
    /// Returns the number of record files removed. This cannot be undone.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be deleted or the index cannot be written.
    #[instrument(skip(self))]
    pub fn clear_all(&mut self) -> Result<usize> {
        let removed = self.store.clear()?;
        self.index = DebugIndex::new();
        self.index_file.save(&mut self.index)?;
        tracing::warn!(removed, "Cleared all debug records");
        Ok(removed)
    }

    /// Rebuilds the whole index from the record files.
    ///
    /// # Errors
    ///
    /// Returns an error if the record files cannot be listed or the index
    /// cannot be written.
    pub fn rebuild_index(&mut self) -> Result<RebuildStats> {
        let stats = self.maintainer.rebuild_index(&mut self.index, &self.store)?;
        self.index_file.save(&mut self.index)?;
        Ok(stats)
    }

    /// Rebuilds only the keyword index, returning the associations written.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be read or the index cannot be written.
    pub fn rebuild_keywords(&mut self) -> Result<usize> {
        let associations = self.maintainer.rebuild_keywords(&mut self.index, &self.store)?;
        self.index_file.save(&mut self.index)?;
        Ok(associations)
    }

    /// Drops the keyword index to shrink `index.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be written.
    pub fn compact_index(&mut self) -> Result<CompactStats> {
        let stats = self.maintainer.compact_index(&mut self.index);
        self.index_file.save(&mut self.index)?;
        Ok(stats)
    }

    /// Searches the knowledge base.
    ///
    /// # Errors
    ///
    /// Returns an error if `query.limit` is zero or the record store fails.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        let result = self.engine.search(&self.index, &self.store, query)?;

        metrics::counter!("debug_search_total").increment(1);
        #[allow(clippy::cast_precision_loss)]
        metrics::histogram!("debug_search_duration_ms").record(result.execution_time_ms as f64);
        Ok(result)
    }

    /// Searches for errors like the given one, restricted to its error type.
    ///
    /// # Errors
    ///
    /// See [`Self::search`].
    pub fn search_similar_errors(
        &self,
        error_type: &str,
        error_message: &str,
        limit: usize,
    ) -> Result<SearchResult> {
        let query = SearchQuery::new(format!("{error_type} {error_message}"))
            .with_limit(limit)
            .with_error_type(error_type);
        self.search(&query)
    }

    /// Returns the records carrying `tag`, in recording order.
    #[must_use]
    pub fn search_by_tag(&self, tag: &str) -> Vec<DebugRecord> {
        self.index
            .tags
            .get(&tag.to_lowercase())
            .map(|ids| self.load_all(ids))
            .unwrap_or_default()
    }

    /// Returns the records with the given error type.
    ///
    /// Uses the exact bucket when one exists, otherwise every record whose
    /// error type contains `error_type`, ignoring case.
    #[must_use]
    pub fn search_by_error_type(&self, error_type: &str) -> Vec<DebugRecord> {
        let needle = error_type.to_lowercase();
        if let Some(ids) = self.index.error_types.get(&needle) {
            return self.load_all(ids);
        }

        let ids: Vec<RecordId> = self
            .index
            .records
            .iter()
            .filter(|entry| entry.error_type.to_lowercase().contains(&needle))
            .map(|entry| entry.id.clone())
            .collect();
        self.load_all(&ids)
    }

    /// Returns every known tag, lowercased and sorted.
    #[must_use]
    pub fn all_tags(&self) -> Vec<String> {
        self.index.tags.keys().cloned().collect()
    }

    /// Returns the number of indexed records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.index.records.len()
    }

    /// Returns the full records of the most recent `limit` entries, oldest first.
    #[must_use]
    pub fn recent_records(&self, limit: usize) -> Vec<DebugRecord> {
        let ids: Vec<RecordId> = self
            .index
            .recent_entries(limit)
            .iter()
            .map(|entry| entry.id.clone())
            .collect();
        self.load_all(&ids)
    }

    /// Returns summary counts of the index.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    fn load_all(&self, ids: &[RecordId]) -> Vec<DebugRecord> {
        ids.iter().filter_map(|id| self.get_record(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorContext;
    use tempfile::TempDir;

    fn submission(error_type: &str, message: &str, cause: &str, tags: &[&str]) -> RecordSubmission {
        RecordSubmission::new(
            ErrorContext::new(error_type, message),
            cause,
            "see cause",
            tags.iter().map(|t| (*t).to_string()).collect(),
        )
    }

    #[test]
    fn test_record_and_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut kb = DebugKnowledgeBase::open(dir.path());

        let id = kb
            .record(submission("KeyError", "'user'", "missing key", &["python"]))
            .unwrap();
        let record = kb.get_record(&id).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.context.error_type, "KeyError");
        assert_eq!(record.tags, vec!["python".to_string()]);
        assert!(kb.paths().index_path().exists());
    }

    #[test]
    fn test_id_uses_date_and_project_hash() {
        let dir = TempDir::new().unwrap();
        let mut kb = DebugKnowledgeBase::open(dir.path());

        let id = kb.record(submission("E", "m", "c", &[])).unwrap();
        let today = Local::now().format("%Y%m%d").to_string();
        let expected = format!("{today}_{}_001", kb.paths().record_id_hash());
        assert_eq!(id.as_str(), expected);
    }

    #[test]
    fn test_reopen_sees_persisted_index() {
        let dir = TempDir::new().unwrap();
        let id = {
            let mut kb = DebugKnowledgeBase::open(dir.path());
            kb.record(submission("OSError", "denied", "perms", &["fs"])).unwrap()
        };

        let kb = DebugKnowledgeBase::open(dir.path());
        assert_eq!(kb.record_count(), 1);
        assert_eq!(kb.list_records(10)[0].id, id);
        assert_eq!(kb.all_tags(), vec!["fs".to_string()]);
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let dir = TempDir::new().unwrap();
        let mut kb = DebugKnowledgeBase::open(dir.path());
        let id = kb.record(submission("E", "m", "c", &["t"])).unwrap();

        assert_eq!(kb.clear_all().unwrap(), 1);
        assert_eq!(kb.record_count(), 0);
        assert!(kb.get_record(&id).is_none());
        assert!(kb.all_tags().is_empty());
        assert!(kb.paths().index_path().exists());
    }

    #[test]
    fn test_search_by_error_type_falls_back_to_substring() {
        let dir = TempDir::new().unwrap();
        let mut kb = DebugKnowledgeBase::open(dir.path());
        kb.record(submission("ModuleNotFoundError", "six", "c", &[])).unwrap();
        kb.record(submission("KeyError", "k", "c", &[])).unwrap();

        assert_eq!(kb.search_by_error_type("keyerror").len(), 1);
        let partial = kb.search_by_error_type("NotFound");
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].context.error_type, "ModuleNotFoundError");
        assert!(kb.search_by_error_type("Syntax").is_empty());
    }

    #[test]
    fn test_search_by_tag_ignores_case() {
        let dir = TempDir::new().unwrap();
        let mut kb = DebugKnowledgeBase::open(dir.path());
        kb.record(submission("E", "m", "c", &["Docker"])).unwrap();

        assert_eq!(kb.search_by_tag("DOCKER").len(), 1);
        assert!(kb.search_by_tag("k8s").is_empty());
    }

    #[test]
    fn test_search_similar_errors_filters_by_type() {
        let dir = TempDir::new().unwrap();
        let mut kb = DebugKnowledgeBase::open(dir.path());
        let import = kb
            .record(submission("ImportError", "No module named six", "removed", &[]))
            .unwrap();
        kb.record(submission("TypeError", "No module named six", "weird", &[]))
            .unwrap();

        let result = kb
            .search_similar_errors("ImportError", "No module named six", 3)
            .unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.results[0].record.id, import);
    }

    #[test]
    fn test_recent_records_are_full_records() {
        let dir = TempDir::new().unwrap();
        let mut kb = DebugKnowledgeBase::open(dir.path());
        for i in 0..4 {
            kb.record(submission("E", &format!("m{i}"), "c", &[])).unwrap();
        }

        let recent = kb.recent_records(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].context.error_message, "m2");
        assert_eq!(recent[1].context.error_message, "m3");
    }

    #[test]
    fn test_stats_track_buckets() {
        let dir = TempDir::new().unwrap();
        let mut kb = DebugKnowledgeBase::open(dir.path());
        kb.record(submission("KeyError", "m", "c", &["a", "b"])).unwrap();
        kb.record(submission("KeyError", "m", "c", &["b"])).unwrap();

        let stats = kb.stats();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.tags, 2);
        assert_eq!(stats.error_types, 1);
        assert!(stats.keywords > 0);

        kb.compact_index().unwrap();
        assert_eq!(kb.stats().keywords, 0);
    }
}
