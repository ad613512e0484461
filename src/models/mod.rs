//! Data models for the debug knowledge base.
//!
//! This module contains the canonical record, index, and search schemas.

mod index;
mod record;
mod search;

pub use index::{
    CURRENT_INDEX_VERSION, CompactStats, DebugIndex, IndexEntry, IndexStats, MAX_ENTRY_TAGS,
    Postings, RebuildStats, insert_posting,
};
pub use record::{
    DEFAULT_ERROR_MESSAGE, DEFAULT_ERROR_TYPE, DebugRecord, ErrorContext, RecordId,
    RecordSubmission,
};
pub use search::{DEFAULT_SEARCH_LIMIT, SearchHit, SearchQuery, SearchResult};
