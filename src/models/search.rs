//! Search types and filters.

use super::DebugRecord;
use serde::{Deserialize, Serialize};

/// Default number of results returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// A free-text search with optional hard filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Error message or description to search for.
    pub text: String,
    /// Maximum number of results.
    pub limit: usize,
    /// Only records whose error type contains this (case-insensitive).
    pub error_type: Option<String>,
    /// Only records carrying at least one of these tags (case-insensitive).
    pub tags: Vec<String>,
}

impl SearchQuery {
    /// Creates a query with the default limit and no filters.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: DEFAULT_SEARCH_LIMIT,
            error_type: None,
            tags: Vec::new(),
        }
    }

    /// Sets the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Adds an error type filter.
    #[must_use]
    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    /// Adds a tag filter.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns the error type filter if it is non-blank.
    #[must_use]
    pub fn error_type_filter(&self) -> Option<&str> {
        self.error_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A single search hit: the full record plus its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched record.
    #[serde(flatten)]
    pub record: DebugRecord,
    /// Weighted relevance, rounded to two decimals.
    pub relevance_score: f64,
}

/// Result of a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Ranked hits, best first.
    pub results: Vec<SearchHit>,
    /// Number of hits returned.
    pub count: usize,
    /// Search execution time in milliseconds.
    pub execution_time_ms: u64,
}

impl SearchResult {
    /// Wraps ranked hits.
    #[must_use]
    pub fn new(results: Vec<SearchHit>, execution_time_ms: u64) -> Self {
        Self {
            count: results.len(),
            results,
            execution_time_ms,
        }
    }

    /// Returns true if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorContext, RecordId};

    #[test]
    fn test_blank_error_type_filter_is_ignored() {
        let query = SearchQuery::new("x").with_error_type("   ");
        assert!(query.error_type_filter().is_none());

        let query = SearchQuery::new("x").with_error_type(" TypeError ");
        assert_eq!(query.error_type_filter(), Some("TypeError"));
    }

    #[test]
    fn test_hit_serializes_flat_with_score() {
        let hit = SearchHit {
            record: DebugRecord {
                id: RecordId::new("20260118_ab12_001"),
                timestamp: chrono::Local::now().naive_local(),
                context: ErrorContext::new("TypeError", "boom"),
                cause: "c".to_string(),
                solution: "s".to_string(),
                tags: vec![],
            },
            relevance_score: 0.45,
        };

        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["id"], "20260118_ab12_001");
        assert_eq!(json["context"]["error_type"], "TypeError");
        assert_eq!(json["relevance_score"], 0.45);
    }
}
