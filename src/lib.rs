//! # Sidecar Debug
//!
//! A project-scoped knowledge base of debug experiences for AI coding agents.
//!
//! An agent queries the knowledge base before fixing a bug and records what
//! it learned afterwards: the error context, the root cause, and the
//! solution. Records live as one JSON file each under
//! `{project}/.mcp-sidecar/debug/`, next to a single `index.json` that holds
//! the tag, error-type, and keyword inverted indexes.
//!
//! ## Features
//!
//! - Write-once record files with project-scoped, date-prefixed ids
//! - Incrementally maintained inverted indexes with full and keyword-only rebuilds
//! - Synonym-aware two-phase retrieval (index candidates, then weighted scoring)
//! - Self-healing index: corrupt or legacy index files are recovered on load
//!
//! ## Example
//!
//! ```rust,no_run
//! use sidecar_debug::{DebugKnowledgeBase, ErrorContext, RecordSubmission, SearchQuery};
//!
//! # fn main() -> sidecar_debug::Result<()> {
//! let mut kb = DebugKnowledgeBase::open(".");
//! let id = kb.record(RecordSubmission {
//!     context: ErrorContext::new("ImportError", "No module named 'six'"),
//!     cause: "six was dropped from requirements".to_string(),
//!     solution: "pin six in requirements.txt".to_string(),
//!     tags: vec!["python".to_string(), "dependency".to_string()],
//! })?;
//!
//! let result = kb.search(&SearchQuery::new("module six").with_limit(3))?;
//! assert!(result.results.iter().any(|hit| hit.record.id == id));
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::SidecarConfig;
pub use models::{
    CompactStats, DebugIndex, DebugRecord, ErrorContext, IndexEntry, IndexStats, RebuildStats,
    RecordId, RecordSubmission, SearchHit, SearchQuery, SearchResult,
};
pub use services::{DebugKnowledgeBase, InvertedIndexMaintainer, RetrievalEngine, SynonymExpander};
pub use storage::{FilesystemRecordStore, IndexFile, RecordStore};

/// Error type for knowledge base operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed submissions, unsafe record ids, zero search limits |
/// | `OperationFailed` | Disk writes fail, directories cannot be created, serialization fails |
///
/// Missing or unparsable records and index files are not errors: they are
/// reported as absent (`None`, empty results) and logged.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A legacy submission is not a JSON object
    /// - A record id contains path separators or other unsafe characters
    /// - A search is requested with `limit == 0`
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - A record file or the index file cannot be written
    /// - The storage directory cannot be created or listed
    /// - Logging cannot be initialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub(crate) fn failed(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for knowledge base operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::failed("write_record_file", "disk full");
        assert_eq!(
            err.to_string(),
            "operation 'write_record_file' failed: disk full"
        );
    }
}
