//! Inverted index maintenance.
//!
//! Keeps the `tags`, `error_types`, and `keywords` inverted indexes and the
//! record projection in step with the record store: incrementally on every
//! write, wholesale on a full rebuild, and keyword-only on a partial rebuild
//! or compaction. Every bucket is de-duplicated on insert.

use crate::Result;
use crate::models::{
    CompactStats, DebugIndex, DebugRecord, IndexEntry, Postings, RebuildStats, insert_posting,
};
use crate::services::keywords::extract_keywords;
use crate::storage::{RecordStore, ScannedRecord};
use chrono::Local;
use tracing::instrument;

/// Builds and updates the inverted indexes of a [`DebugIndex`].
///
/// The maintainer mutates the in-memory index only; persisting it is left
/// to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertedIndexMaintainer;

impl InvertedIndexMaintainer {
    /// Creates a maintainer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Indexes a freshly written record.
    ///
    /// Appends the projection, then adds the id to each lowercased tag
    /// bucket, to the lowercased error-type bucket, and to the bucket of
    /// every keyword extracted from the record's text.
    pub fn apply_record(&self, index: &mut DebugIndex, record: &DebugRecord) {
        index.records.push(IndexEntry::from(record));
        index_tags(&mut index.tags, record);
        insert_posting(
            &mut index.error_types,
            &record.context.error_type.to_lowercase(),
            &record.id,
        );
        index_keywords(&mut index.keywords, record);
    }

    /// Rebuilds the whole index from the record store.
    ///
    /// The creation time of `index` is kept; everything else is replaced.
    /// Unreadable record files are skipped and counted in
    /// [`RebuildStats::errors`].
    ///
    /// # Errors
    ///
    /// Returns an error if the record store cannot be listed.
    #[instrument(skip(self, index, store))]
    pub fn rebuild_index(
        &self,
        index: &mut DebugIndex,
        store: &dyn RecordStore,
    ) -> Result<RebuildStats> {
        let mut rebuilt = DebugIndex::created_at(index.created_at);
        rebuilt.rebuilt_at = Some(Local::now().naive_local());
        let mut stats = RebuildStats::default();

        for scanned in store.scan()? {
            match scanned {
                ScannedRecord::Parsed(record) => {
                    rebuilt.records.push(IndexEntry::from(&record));
                    stats.records += 1;
                    stats.tags += index_tags(&mut rebuilt.tags, &record);
                    insert_posting(
                        &mut rebuilt.error_types,
                        &record.context.error_type.to_lowercase(),
                        &record.id,
                    );
                    stats.keywords += index_keywords(&mut rebuilt.keywords, &record);
                },
                ScannedRecord::Corrupt { path, cause } => {
                    tracing::warn!(path = %path.display(), %cause, "Skipping unreadable record file");
                    stats.errors += 1;
                },
            }
        }

        *index = rebuilt;
        metrics::counter!("debug_index_rebuild_total", "kind" => "full").increment(1);
        tracing::info!(
            records = stats.records,
            tags = stats.tags,
            keywords = stats.keywords,
            errors = stats.errors,
            "Index rebuilt"
        );
        Ok(stats)
    }

    /// Rebuilds only the keyword index from the records in the projection.
    ///
    /// Keywords are extracted from the same fields as on write, so running
    /// this after [`Self::compact_index`] restores the exact keyword map.
    /// Projection entries whose record cannot be read are skipped. The
    /// keyword map is replaced only once every record has been processed.
    ///
    /// Returns the number of keyword associations written.
    ///
    /// # Errors
    ///
    /// Returns an error if the record store fails.
    #[instrument(skip(self, index, store), fields(records = index.records.len()))]
    pub fn rebuild_keywords(&self, index: &mut DebugIndex, store: &dyn RecordStore) -> Result<usize> {
        let mut keywords = Postings::new();
        let mut associations = 0;

        for entry in &index.records {
            let Some(record) = store.get(&entry.id)? else {
                tracing::debug!(record_id = %entry.id, "Record missing during keyword rebuild");
                continue;
            };
            associations += index_keywords(&mut keywords, &record);
        }

        index.keywords = keywords;
        metrics::counter!("debug_index_rebuild_total", "kind" => "keywords").increment(1);
        tracing::info!(associations, buckets = index.keywords.len(), "Keyword index rebuilt");
        Ok(associations)
    }

    /// Drops the keyword index to shrink the index file.
    ///
    /// Search still works afterwards through the filter and recency paths;
    /// [`Self::rebuild_keywords`] restores full recall.
    pub fn compact_index(&self, index: &mut DebugIndex) -> CompactStats {
        let stats = CompactStats {
            keywords_removed: index.keywords.len(),
            records_kept: index.records.len(),
        };
        index.keywords.clear();
        tracing::info!(
            keywords_removed = stats.keywords_removed,
            records_kept = stats.records_kept,
            "Index compacted"
        );
        stats
    }
}

/// Text a record's keywords are extracted from.
fn keyword_source(record: &DebugRecord) -> String {
    format!(
        "{} {} {} {} {}",
        record.context.error_type,
        record.context.error_message,
        record.cause,
        record.solution,
        record.joined_tags()
    )
}

/// Adds the record to its tag buckets, returning new associations.
fn index_tags(tags: &mut Postings, record: &DebugRecord) -> usize {
    record
        .tags
        .iter()
        .filter(|tag| insert_posting(tags, &tag.to_lowercase(), &record.id))
        .count()
}

/// Adds the record to its keyword buckets, returning new associations.
fn index_keywords(keywords: &mut Postings, record: &DebugRecord) -> usize {
    extract_keywords(&keyword_source(record))
        .iter()
        .filter(|keyword| insert_posting(keywords, keyword, &record.id))
        .count()
}
