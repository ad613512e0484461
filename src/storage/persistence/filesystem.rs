//! Filesystem-based record store.
//!
//! Stores each debug record as an individual JSON file named `{id}.json`
//! inside the debug storage directory, next to `index.json`.
//!
//! # Security
//!
//! This module includes protections against filesystem-based attacks:
//! - **Path traversal**: Record IDs are validated to prevent directory escape
//! - **File size limits**: Maximum file size enforced to prevent memory exhaustion

use crate::models::{DebugRecord, RecordId};
use crate::services::INDEX_FILE_NAME;
use crate::storage::traits::{RecordStore, ScannedRecord};
use crate::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Maximum file size for record files (1MB).
/// Prevents memory exhaustion from maliciously large files.
const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Filesystem-based record store.
#[derive(Debug, Clone)]
pub struct FilesystemRecordStore {
    /// Base directory for storage.
    base_path: PathBuf,
}

impl FilesystemRecordStore {
    /// Creates a new filesystem store.
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the path for a record file.
    ///
    /// # Security
    ///
    /// The record ID is sanitized to prevent path traversal attacks.
    /// Only alphanumeric characters, dashes, and underscores are allowed.
    fn record_path(&self, id: &RecordId) -> Result<PathBuf> {
        let id_str = id.as_str();

        if !Self::is_safe_filename(id_str) {
            return Err(Error::InvalidInput(format!(
                "Record ID contains invalid characters: {id_str}",
            )));
        }

        Ok(self.base_path.join(format!("{id_str}.json")))
    }

    /// Checks if a filename is safe (no path traversal).
    fn is_safe_filename(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 255
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Lists record file paths, sorted by name.
    ///
    /// Skips the index file, hidden files (including `._` resource forks),
    /// and anything that is not a `.json` file.
    fn record_files(&self) -> Result<Vec<PathBuf>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.base_path).map_err(|e| Error::OperationFailed {
            operation: "read_storage_dir".to_string(),
            cause: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::OperationFailed {
                operation: "read_dir_entry".to_string(),
                cause: e.to_string(),
            })?;
            let path = entry.path();
            if path.is_file() && is_record_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Reads and parses a record file.
    fn read_record(path: &Path) -> std::result::Result<DebugRecord, String> {
        let metadata = fs::metadata(path).map_err(|e| e.to_string())?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(format!(
                "record file exceeds maximum size of {MAX_FILE_SIZE} bytes"
            ));
        }

        let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&json).map_err(|e| e.to_string())
    }
}

impl RecordStore for FilesystemRecordStore {
    fn write(&self, record: &DebugRecord) -> Result<()> {
        fs::create_dir_all(&self.base_path).map_err(|e| Error::OperationFailed {
            operation: "create_storage_dir".to_string(),
            cause: e.to_string(),
        })?;

        let path = self.record_path(&record.id)?;
        let json = serde_json::to_string(record).map_err(|e| Error::OperationFailed {
            operation: "serialize_record".to_string(),
            cause: e.to_string(),
        })?;

        // Records are write-once: never clobber an existing file.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::OperationFailed {
                operation: "write_record_file".to_string(),
                cause: if e.kind() == ErrorKind::AlreadyExists {
                    format!("record {} already exists", record.id)
                } else {
                    e.to_string()
                },
            })?;

        file.write_all(json.as_bytes())
            .map_err(|e| Error::OperationFailed {
                operation: "write_record_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(())
    }

    fn get(&self, id: &RecordId) -> Result<Option<DebugRecord>> {
        let Ok(path) = self.record_path(id) else {
            return Ok(None); // Invalid ID means no record
        };

        if !path.exists() {
            return Ok(None);
        }

        match Self::read_record(&path) {
            Ok(record) => Ok(Some(record)),
            Err(cause) => {
                tracing::warn!(record_id = %id, %cause, "Unreadable record file treated as absent");
                Ok(None)
            },
        }
    }

    fn contains(&self, id: &RecordId) -> bool {
        self.record_path(id).is_ok_and(|path| path.exists())
    }

    fn scan(&self) -> Result<Vec<ScannedRecord>> {
        let scanned = self
            .record_files()?
            .into_iter()
            .map(|path| match Self::read_record(&path) {
                Ok(record) => ScannedRecord::Parsed(record),
                Err(cause) => ScannedRecord::Corrupt { path, cause },
            })
            .collect();
        Ok(scanned)
    }

    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.json_files_except_index()? {
            fs::remove_file(&path).map_err(|e| Error::OperationFailed {
                operation: "delete_record_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
            removed += 1;
        }
        Ok(removed)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.record_files()?.len())
    }
}

impl FilesystemRecordStore {
    /// Lists every `.json` file except the index, hidden files included.
    fn json_files_except_index(&self) -> Result<Vec<PathBuf>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.base_path).map_err(|e| Error::OperationFailed {
            operation: "read_storage_dir".to_string(),
            cause: e.to_string(),
        })?;

        Ok(entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && has_json_extension(path)
                    && path.file_name().is_some_and(|n| n != INDEX_FILE_NAME)
            })
            .collect())
    }
}

fn has_json_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Returns true for visible `.json` files other than the index.
fn is_record_file(path: &Path) -> bool {
    if !has_json_extension(path) {
        return false;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name != INDEX_FILE_NAME && !name.starts_with('.'))
}
