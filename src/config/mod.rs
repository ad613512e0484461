//! Configuration management.
//!
//! Settings come from, in increasing precedence: built-in defaults, the
//! TOML config file, environment variables, and finally CLI flags applied
//! by the binary.

use crate::services::{PathManager, global_config_dir};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default number of search results.
pub const DEFAULT_LIMIT: usize = 5;

/// Largest number of search results a caller may request.
pub const MAX_LIMIT: usize = 20;

/// Main configuration for the debug knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarConfig {
    /// Project whose knowledge base is used.
    pub project_dir: PathBuf,
    /// Store records under the user config dir instead of the project.
    pub use_global_storage: bool,
    /// Results returned when a search does not specify a limit.
    pub default_limit: usize,
    /// Upper bound for requested limits.
    pub max_limit: usize,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Log format: "pretty" or "json".
    pub format: Option<String>,
    /// `EnvFilter` directive, e.g. `"sidecar_debug=debug"`.
    pub filter: Option<String>,
    /// Optional log file path; logs go to stderr otherwise.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Project directory.
    pub project_dir: Option<String>,
    /// Global storage toggle.
    pub use_global_storage: Option<bool>,
    /// Default search limit.
    pub default_limit: Option<usize>,
    /// Maximum search limit.
    pub max_limit: Option<usize>,
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            use_global_storage: false,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            logging: LoggingSettings::default(),
        }
    }
}

impl SidecarConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/mcp-sidecar/` on macOS)
    /// 2. XDG config dir (`~/.config/mcp-sidecar/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found. A file that
    /// exists but fails to parse is logged and skipped.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            global_config_dir().map(|dir| dir.join("config.toml")),
            Some(
                base_dirs
                    .home_dir()
                    .join(".config")
                    .join("mcp-sidecar")
                    .join("config.toml"),
            ),
        ];

        for path in candidates.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                },
            }
        }

        Self::default()
    }

    /// Applies `SIDECAR_PROJECT_DIR` and `SIDECAR_GLOBAL_STORAGE` overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("SIDECAR_PROJECT_DIR").filter(|v| !v.trim().is_empty()) {
            self.project_dir = PathBuf::from(dir);
        }
        if let Some(global) = lookup("SIDECAR_GLOBAL_STORAGE").as_deref().and_then(parse_bool) {
            self.use_global_storage = global;
        }
        self
    }

    /// Converts a `ConfigFile` to `SidecarConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(project_dir) = file.project_dir {
            config.project_dir = PathBuf::from(project_dir);
        }
        if let Some(global) = file.use_global_storage {
            config.use_global_storage = global;
        }
        if let Some(max_limit) = file.max_limit {
            config.max_limit = max_limit.max(1);
        }
        if let Some(default_limit) = file.default_limit {
            config.default_limit = default_limit;
        }
        config.default_limit = config.default_limit.clamp(1, config.max_limit);
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Sets the project directory.
    #[must_use]
    pub fn with_project_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_dir = path.into();
        self
    }

    /// Enables or disables global storage.
    #[must_use]
    pub const fn with_global_storage(mut self, enabled: bool) -> Self {
        self.use_global_storage = enabled;
        self
    }

    /// Clamps a requested result limit to `1..=max_limit`, defaulting when absent.
    #[must_use]
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }

    /// Resolves the storage paths for the configured project.
    #[must_use]
    pub fn path_manager(&self) -> PathManager {
        if self.use_global_storage {
            PathManager::for_project_global(&self.project_dir)
        } else {
            PathManager::for_project(&self.project_dir)
        }
    }
}

/// Parses common boolean spellings.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = SidecarConfig::new();
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.max_limit, 20);
        assert!(!config.use_global_storage);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
project_dir = "/work/app"
use_global_storage = true
default_limit = 8

[logging]
format = "json"
filter = "sidecar_debug=trace"
"#,
        )
        .unwrap();

        let config = SidecarConfig::load_from_file(&path).unwrap();
        assert_eq!(config.project_dir, PathBuf::from("/work/app"));
        assert!(config.use_global_storage);
        assert_eq!(config.default_limit, 8);
        assert_eq!(config.max_limit, 20);
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(config.logging.filter.as_deref(), Some("sidecar_debug=trace"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_limit = \"many\"").unwrap();

        assert!(SidecarConfig::load_from_file(&path).is_err());
        assert!(SidecarConfig::load_from_file(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_default_limit_is_clamped_to_max() {
        let file = ConfigFile {
            default_limit: Some(50),
            max_limit: Some(10),
            ..ConfigFile::default()
        };
        assert_eq!(SidecarConfig::from_config_file(file).default_limit, 10);
    }

    #[test_case(None, 5 ; "absent uses default")]
    #[test_case(Some(0), 1 ; "zero raised to one")]
    #[test_case(Some(7), 7 ; "in range kept")]
    #[test_case(Some(100), 20 ; "large capped")]
    fn test_clamp_limit(requested: Option<usize>, expected: usize) {
        assert_eq!(SidecarConfig::new().clamp_limit(requested), expected);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SIDECAR_PROJECT_DIR", "/srv/project"),
            ("SIDECAR_GLOBAL_STORAGE", "yes"),
        ]
        .into_iter()
        .collect();

        let config = SidecarConfig::new()
            .with_overrides_from(|key| env.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.project_dir, PathBuf::from("/srv/project"));
        assert!(config.use_global_storage);
    }

    #[test]
    fn test_unparsable_bool_override_is_ignored() {
        let config = SidecarConfig::new()
            .with_global_storage(true)
            .with_overrides_from(|key| (key == "SIDECAR_GLOBAL_STORAGE").then(|| "maybe".to_string()));
        assert!(config.use_global_storage);
    }

    #[test]
    fn test_path_manager_project_layout() {
        let dir = TempDir::new().unwrap();
        let config = SidecarConfig::new().with_project_dir(dir.path());
        assert!(config.path_manager().storage_dir().ends_with(".mcp-sidecar/debug"));
    }
}
