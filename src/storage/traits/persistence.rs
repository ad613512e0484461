//! Record store trait.

use crate::Result;
use crate::models::{DebugRecord, RecordId};
use std::path::PathBuf;

/// Outcome of reading one stored record during a full scan.
#[derive(Debug, Clone)]
pub enum ScannedRecord {
    /// The record parsed successfully.
    Parsed(DebugRecord),
    /// The file exists but could not be read or parsed.
    Corrupt {
        /// Path of the offending file.
        path: PathBuf,
        /// Why it could not be used.
        cause: String,
    },
}

/// Trait for record store backends.
///
/// Record stores are the authoritative source of truth for debug records.
/// Records are written once and never updated; the only deletion is a bulk
/// [`RecordStore::clear`].
pub trait RecordStore: Send + Sync {
    /// Writes a new record.
    ///
    /// Fails if a record with the same id already exists.
    fn write(&self, record: &DebugRecord) -> Result<()>;

    /// Retrieves a record by ID.
    ///
    /// Missing and unreadable records are both reported as `Ok(None)`.
    fn get(&self, id: &RecordId) -> Result<Option<DebugRecord>>;

    /// Returns true if anything is stored under `id`, parsable or not.
    fn contains(&self, id: &RecordId) -> bool;

    /// Reads every stored record, reporting corrupt entries instead of failing.
    fn scan(&self) -> Result<Vec<ScannedRecord>>;

    /// Deletes every stored record, returning how many were removed.
    fn clear(&self) -> Result<usize>;

    /// Returns the total count of stored records, including corrupt ones.
    fn count(&self) -> Result<usize> {
        Ok(self.scan()?.len())
    }
}
