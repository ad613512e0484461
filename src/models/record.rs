//! Debug record types and identifiers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Error type recorded when a submission does not name one.
pub const DEFAULT_ERROR_TYPE: &str = "Unknown";

/// Error message recorded when a submission does not carry one.
pub const DEFAULT_ERROR_MESSAGE: &str = "No message provided";

/// Unique identifier for a debug record.
///
/// Ids have the form `{YYYYMMDD}_{hash4}_{counter3}` and double as the
/// record's file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new record ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The error context a debug experience started from.
///
/// Contexts are caller-shaped JSON, so deserialization never fails on field
/// types: `null` or missing `error_type`/`error_message` take their
/// defaults, numbers and booleans are kept as text, a `line` given as a
/// numeric string is parsed, and any value that does not fit a typed field
/// stays in [`ErrorContext::extra`] under its original key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ErrorContext {
    /// Error class or kind, e.g. `ImportError`.
    pub error_type: String,
    /// The error message as observed.
    pub error_message: String,
    /// Source file the error surfaced in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line number the error surfaced at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Any additional caller-provided fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for ErrorContext {
    fn from(mut fields: Map<String, Value>) -> Self {
        let error_type = take_scalar_text(&mut fields, "error_type")
            .unwrap_or_else(|| DEFAULT_ERROR_TYPE.to_string());
        let error_message = take_scalar_text(&mut fields, "error_message")
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
        let file = take_scalar_text(&mut fields, "file");
        let line = take_line(&mut fields);

        Self {
            error_type,
            error_message,
            file,
            line,
            extra: fields,
        }
    }
}

/// Removes `key` as text. Structured values are left in place.
fn take_scalar_text(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        scalar @ (Value::Bool(_) | Value::Number(_)) => Some(scalar.to_string()),
        structured => {
            fields.insert(key.to_string(), structured);
            None
        },
    }
}

/// Removes `line` if it is a line number or a numeric string.
fn take_line(fields: &mut Map<String, Value>) -> Option<u32> {
    let parsed = match fields.get("line")? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_some() || matches!(fields.get("line"), Some(Value::Null)) {
        fields.remove("line");
    }
    parsed
}

/// Reads a context object, treating `null` as an empty context.
fn context_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ErrorContext, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?
        .map(ErrorContext::from)
        .unwrap_or_default())
}

/// Reads free text, treating `null` as empty and keeping scalars as text.
fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(value_text)
        .unwrap_or_default())
}

/// Reads tags from a list, a single string, or `null`.
fn tags_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(value_text)
            .collect(),
        Some(other) => vec![value_text(other)],
    })
}

fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

impl ErrorContext {
    /// Creates a context with an error type and message.
    #[must_use]
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
            file: None,
            line: None,
            extra: Map::new(),
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_TYPE, DEFAULT_ERROR_MESSAGE)
    }
}

/// A recorded debug experience: error, root cause, and solution.
///
/// Records are written once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugRecord {
    /// Unique identifier.
    pub id: RecordId,
    /// Creation time (local, ISO 8601).
    pub timestamp: NaiveDateTime,
    /// The error context.
    #[serde(default, deserialize_with = "context_or_default")]
    pub context: ErrorContext,
    /// Root-cause analysis.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub cause: String,
    /// The remedy that worked.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub solution: String,
    /// Tags, case-preserved; matched case-insensitively.
    #[serde(default, deserialize_with = "tags_or_empty")]
    pub tags: Vec<String>,
}

impl DebugRecord {
    /// Returns the tags joined by single spaces.
    #[must_use]
    pub fn joined_tags(&self) -> String {
        self.tags.join(" ")
    }

    /// Returns true if any tag equals `tag` ignoring case.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }
}

/// Input for recording a new debug experience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSubmission {
    /// The error context.
    #[serde(default, deserialize_with = "context_or_default")]
    pub context: ErrorContext,
    /// Root-cause analysis.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub cause: String,
    /// The remedy that worked.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub solution: String,
    /// Optional tags.
    #[serde(default, deserialize_with = "tags_or_empty")]
    pub tags: Vec<String>,
}

impl RecordSubmission {
    /// Creates a submission from its four parts.
    #[must_use]
    pub fn new(
        context: ErrorContext,
        cause: impl Into<String>,
        solution: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            context,
            cause: cause.into(),
            solution: solution.into(),
            tags,
        }
    }
}
