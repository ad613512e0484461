//! Adapter for loosely shaped record submissions.
//!
//! Older callers send one of two shapes:
//!
//! - **Nested**: `{"context": {...}, "cause": "...", "solution": "...", "tags": [...]}`
//!   (`data` is accepted in place of `context`)
//! - **Flat**: the error context itself, with `cause`, `solution`, and
//!   `tags` optionally mixed in as sibling keys
//!
//! Both are normalized into a [`RecordSubmission`]. Missing `cause` and
//! `solution` become empty strings; missing or null `error_type` and
//! `error_message` take their defaults. Context fields are read the same
//! tolerant way as stored records, so `"line": "42"` is accepted.

use crate::models::{ErrorContext, RecordSubmission};
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Converts a legacy JSON submission into a [`RecordSubmission`].
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the value is not an object or a field
/// has the wrong type (for example, a numeric `cause`).
pub fn submission_from_value(value: Value) -> Result<RecordSubmission> {
    let Value::Object(mut object) = value else {
        return Err(Error::InvalidInput(
            "record submission must be a JSON object".to_string(),
        ));
    };

    let cause = take_text(&mut object, "cause")?;
    let solution = take_text(&mut object, "solution")?;
    let tags = take_tags(&mut object)?;

    let context = nested_context(&mut object).unwrap_or(object);

    Ok(RecordSubmission {
        context: ErrorContext::from(context),
        cause,
        solution,
        tags,
    })
}

/// Builds a submission from a context object and separately supplied parts.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `context` is not an object or a
/// sibling field has the wrong type.
pub fn submission_from_parts(
    context: Value,
    cause: Option<String>,
    solution: Option<String>,
    tags: Option<Vec<String>>,
) -> Result<RecordSubmission> {
    let mut submission = submission_from_value(context)?;
    if let Some(cause) = cause {
        submission.cause = cause;
    }
    if let Some(solution) = solution {
        submission.solution = solution;
    }
    if let Some(tags) = tags {
        submission.tags = tags;
    }
    Ok(submission)
}

/// Removes and returns the nested context object, if this is a nested submission.
fn nested_context(object: &mut Map<String, Value>) -> Option<Map<String, Value>> {
    for key in ["context", "data"] {
        if matches!(object.get(key), Some(Value::Object(_))) {
            if let Some(Value::Object(context)) = object.remove(key) {
                return Some(context);
            }
        }
    }
    None
}

fn take_text(object: &mut Map<String, Value>, key: &str) -> Result<String> {
    match object.remove(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(Error::InvalidInput(format!(
            "'{key}' must be a string, got {other}"
        ))),
    }
}

fn take_tags(object: &mut Map<String, Value>) -> Result<Vec<String>> {
    match object.remove("tags") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(tag) => Ok(tag),
                other => Err(Error::InvalidInput(format!("tag must be a string, got {other}"))),
            })
            .collect(),
        Some(Value::String(tag)) => Ok(vec![tag]),
        Some(other) => Err(Error::InvalidInput(format!(
            "'tags' must be a list of strings, got {other}"
        ))),
    }
}
