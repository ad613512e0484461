//! Structured logging configuration.

use crate::config::{LoggingSettings, parse_bool};
use std::path::PathBuf;

/// Filter used when nothing else is configured.
const DEFAULT_FILTER: &str = "warn";

/// Filter used for verbose output and the legacy debug flag.
const VERBOSE_FILTER: &str = "debug";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
    /// Optional log file; stderr when absent.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from environment variables.
    #[must_use]
    pub fn from_env(verbose: bool) -> Self {
        Self::from_settings(None, verbose)
    }

    /// Builds logging configuration from config settings with env overrides.
    ///
    /// The filter is taken from the first of: `SIDECAR_LOG`, the legacy
    /// `MCP_DEBUG` flag, `verbose`, the config file, then `warn`.
    /// `SIDECAR_LOG_FORMAT` and `SIDECAR_LOG_FILE` override the other settings.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    fn resolve(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let legacy_debug = lookup("MCP_DEBUG")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(false);

        let filter = lookup("SIDECAR_LOG")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| (legacy_debug || verbose).then(|| VERBOSE_FILTER.to_string()))
            .or_else(|| settings.and_then(|s| s.filter.clone()))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let format = lookup("SIDECAR_LOG_FORMAT")
            .or_else(|| settings.and_then(|s| s.format.clone()))
            .map(|f| LogFormat::parse(&f))
            .unwrap_or_default();

        let file = lookup("SIDECAR_LOG_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| settings.and_then(|s| s.file.clone()));

        Self {
            format,
            filter,
            file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn resolve_with(env: &[(&str, &str)], settings: Option<&LoggingSettings>, verbose: bool) -> LoggingConfig {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LoggingConfig::resolve(settings, verbose, |key| env.get(key).cloned())
    }

    #[test_case(&[], false, "warn" ; "default is warn")]
    #[test_case(&[], true, "debug" ; "verbose flag")]
    #[test_case(&[("MCP_DEBUG", "true")], false, "debug" ; "legacy flag")]
    #[test_case(&[("MCP_DEBUG", "0")], false, "warn" ; "legacy flag off")]
    #[test_case(&[("SIDECAR_LOG", "sidecar_debug=trace"), ("MCP_DEBUG", "1")], false, "sidecar_debug=trace" ; "explicit filter wins")]
    fn test_filter_resolution(env: &[(&str, &str)], verbose: bool, expected: &str) {
        assert_eq!(resolve_with(env, None, verbose).filter, expected);
    }

    #[test]
    fn test_settings_fill_gaps() {
        let settings = LoggingSettings {
            format: Some("json".to_string()),
            filter: Some("info".to_string()),
            file: Some(PathBuf::from("/tmp/sidecar.log")),
        };

        let config = resolve_with(&[], Some(&settings), false);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter, "info");
        assert_eq!(config.file, Some(PathBuf::from("/tmp/sidecar.log")));

        let config = resolve_with(&[("SIDECAR_LOG_FORMAT", "pretty")], Some(&settings), true);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, "debug");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Pretty);
    }
}
