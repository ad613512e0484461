//! Centralized path management for debug knowledge base storage.
//!
//! This module centralizes:
//!
//! - Path constants (directory names, file names)
//! - Project identity hashing used by storage locations and record ids
//! - Directory creation with proper error handling
//!
//! # Examples
//!
//! ```rust,no_run
//! use sidecar_debug::services::PathManager;
//!
//! // {project}/.mcp-sidecar/debug/
//! let manager = PathManager::for_project("/path/to/project");
//! let index_path = manager.index_path();
//! manager.ensure_storage_dir()?;
//! # Ok::<(), sidecar_debug::Error>(())
//! ```

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Name of the per-project sidecar directory.
pub const SIDECAR_DIR_NAME: &str = ".mcp-sidecar";

/// Name of the debug storage subdirectory.
pub const DEBUG_DIR_NAME: &str = "debug";

/// Name of the index file inside the debug storage directory.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Length of the project hash embedded in record ids.
pub const RECORD_ID_HASH_LEN: usize = 4;

/// Length of the project hash used for global storage directories.
pub const GLOBAL_DIR_HASH_LEN: usize = 12;

/// Manages storage paths for one project's debug records.
#[derive(Debug, Clone)]
pub struct PathManager {
    /// Absolute project root.
    project_dir: PathBuf,
    /// Directory holding `index.json` and the record files.
    storage_dir: PathBuf,
}

impl PathManager {
    /// Creates a `PathManager` for project-level storage at
    /// `{project}/.mcp-sidecar/debug/`.
    #[must_use]
    pub fn for_project(project_dir: impl AsRef<Path>) -> Self {
        let project_dir = absolute_project_dir(project_dir.as_ref());
        let storage_dir = project_dir.join(SIDECAR_DIR_NAME).join(DEBUG_DIR_NAME);
        Self {
            project_dir,
            storage_dir,
        }
    }

    /// Creates a `PathManager` for global storage at
    /// `{config_dir}/mcp-sidecar/projects/{hash12}/debug/`.
    ///
    /// Falls back to project-level storage if the user config directory cannot be resolved.
    #[must_use]
    pub fn for_project_global(project_dir: impl AsRef<Path>) -> Self {
        let project_dir = absolute_project_dir(project_dir.as_ref());
        let Some(config_dir) = global_config_dir() else {
            tracing::warn!(
                project = %project_dir.display(),
                "Failed to resolve user config dir; using project-level storage"
            );
            return Self::for_project(project_dir);
        };
        let storage_dir = config_dir
            .join("projects")
            .join(project_hash(&project_dir, GLOBAL_DIR_HASH_LEN))
            .join(DEBUG_DIR_NAME);
        Self {
            project_dir,
            storage_dir,
        }
    }

    /// Returns the absolute project root.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Returns the debug storage directory.
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Returns the path of `index.json`.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.storage_dir.join(INDEX_FILE_NAME)
    }

    /// Returns the short project hash embedded in record ids.
    #[must_use]
    pub fn record_id_hash(&self) -> String {
        project_hash(&self.project_dir, RECORD_ID_HASH_LEN)
    }

    /// Ensures the storage directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_storage_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage_dir).map_err(|e| Error::OperationFailed {
            operation: "create_storage_dir".to_string(),
            cause: format!("{}: {e}", self.storage_dir.display()),
        })
    }
}

/// Returns the global sidecar config directory (`~/.config/mcp-sidecar` on Linux).
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.config_dir().join("mcp-sidecar"))
}

/// Returns the first `len` hex characters of the SHA-256 of a project path.
#[must_use]
pub fn project_hash(project_dir: &Path, len: usize) -> String {
    let digest = Sha256::digest(project_dir.to_string_lossy().as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(len);
    hash
}

/// Resolves a project directory to an absolute path, following symlinks when possible.
fn absolute_project_dir(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
