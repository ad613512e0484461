//! JSON index file persistence.

use crate::models::DebugIndex;
use crate::storage::migrations::migrate_index;
use crate::{Error, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// The `index.json` file of one project.
///
/// Loading never fails: a missing, unreadable, or corrupt file yields a fresh
/// empty index. Saving replaces the file atomically via a temporary sibling.
#[derive(Debug, Clone)]
pub struct IndexFile {
    path: PathBuf,
}

impl IndexFile {
    /// Creates a handle for the index file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the index file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the index, migrating older schemas.
    ///
    /// Any failure is logged and recovered by returning an empty index.
    #[must_use]
    pub fn load(&self) -> DebugIndex {
        if !self.path.exists() {
            return DebugIndex::new();
        }

        match self.try_load() {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Error loading index, creating new index"
                );
                metrics::counter!("debug_index_load_recovered_total").increment(1);
                DebugIndex::new()
            },
        }
    }

    fn try_load(&self) -> Result<DebugIndex> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| Error::failed("read_index_file", e))?;
        let raw = serde_json::from_str(&contents).map_err(|e| Error::failed("parse_index_file", e))?;
        migrate_index(raw)
    }

    /// Stamps `updated_at` and writes the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be serialized or written.
    pub fn save(&self, index: &mut DebugIndex) -> Result<()> {
        index.updated_at = Some(Local::now().naive_local());

        let json = serde_json::to_string(index).map_err(|e| Error::failed("serialize_index", e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::failed("create_storage_dir", e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::failed("write_index_file", e))?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::failed("replace_index_file", e))?;
        Ok(())
    }
}
