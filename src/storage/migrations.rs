//! Versioned migrations for the on-disk index schema.
//!
//! The index file is parsed as raw JSON first, upgraded step by step to
//! [`CURRENT_INDEX_VERSION`], and only then deserialized into the canonical
//! [`DebugIndex`]. Core code never needs to know which key names an older
//! file used.
//!
//! # Version history
//!
//! | Version | Change |
//! |---------|--------|
//! | 1-2 | Records carried full key names; `keywords`/`error_types` could be missing |
//! | 3 | Compact record keys `ts` and `et`; keywords became lazily rebuildable |
//! | 4 | Canonical record keys `timestamp` and `error_type` |

use crate::models::{CURRENT_INDEX_VERSION, DebugIndex, IndexEntry};
use crate::{Error, Result};
use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};

/// A single index schema migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version this migration upgrades to.
    pub version: u32,
    /// Human-readable description.
    pub description: &'static str,
    /// Rewrites the raw index object in place.
    pub apply: fn(&mut Map<String, Value>),
}

/// Migrations in ascending version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 4,
    description: "rename compact record keys ts/et to timestamp/error_type",
    apply: expand_compact_record_keys,
}];

/// Version assumed for files that carry no version field.
const UNVERSIONED: u32 = 1;

/// Upgrades a raw index document and parses it into a [`DebugIndex`].
///
/// Record entries that still fail to parse after migration are dropped with
/// a warning; a full rebuild restores them from the record files.
///
/// # Errors
///
/// Returns an error if the document is not an object or its maps are malformed.
pub fn migrate_index(raw: Value) -> Result<DebugIndex> {
    let Value::Object(mut doc) = raw else {
        return Err(Error::failed("migrate_index", "index root is not an object"));
    };

    let from_version = doc
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(UNVERSIONED);

    for migration in MIGRATIONS.iter().filter(|m| m.version > from_version) {
        tracing::debug!(
            version = migration.version,
            description = migration.description,
            "Applying index migration"
        );
        (migration.apply)(&mut doc);
    }

    normalize_timestamps(&mut doc);
    let records = take_valid_entries(&mut doc);

    doc.insert(
        "version".to_string(),
        Value::from(from_version.max(CURRENT_INDEX_VERSION)),
    );

    let mut index: DebugIndex = serde_json::from_value(Value::Object(doc))
        .map_err(|e| Error::failed("migrate_index", e))?;
    index.records = records;
    Ok(index)
}

/// Renames `ts`/`et` to `timestamp`/`error_type` on every record entry.
fn expand_compact_record_keys(doc: &mut Map<String, Value>) {
    let Some(Value::Array(records)) = doc.get_mut("records") else {
        return;
    };
    for entry in records.iter_mut().filter_map(Value::as_object_mut) {
        rename_key(entry, "ts", "timestamp");
        rename_key(entry, "et", "error_type");
    }
}

fn rename_key(entry: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = entry.remove(from) {
        entry.entry(to.to_string()).or_insert(value);
    }
}

/// Ensures `created_at` is valid and drops unparsable optional timestamps.
fn normalize_timestamps(doc: &mut Map<String, Value>) {
    if !doc.get("created_at").is_some_and(is_timestamp) {
        let now = Local::now().naive_local();
        doc.insert(
            "created_at".to_string(),
            serde_json::to_value(now).unwrap_or(Value::Null),
        );
    }
    for key in ["updated_at", "rebuilt_at"] {
        if doc.get(key).is_some_and(|v| !is_timestamp(v)) {
            doc.remove(key);
        }
    }
}

fn is_timestamp(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.parse::<NaiveDateTime>().is_ok())
}

/// Removes the `records` array from the document and parses each entry on its own.
fn take_valid_entries(doc: &mut Map<String, Value>) -> Vec<IndexEntry> {
    let Some(Value::Array(raw_entries)) = doc.remove("records") else {
        return Vec::new();
    };

    let total = raw_entries.len();
    let entries: Vec<IndexEntry> = raw_entries
        .into_iter()
        .filter_map(|raw| serde_json::from_value(raw).ok())
        .collect();

    let dropped = total - entries.len();
    if dropped > 0 {
        tracing::warn!(
            dropped,
            "Dropped malformed index entries during migration; rebuild the index to restore them"
        );
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_keys_are_expanded() {
        let raw = json!({
            "version": 3,
            "created_at": "2026-01-18T09:00:00.000001",
            "records": [
                {"id": "20260118_ab12_001", "ts": "2026-01-18T10:00:00.5", "et": "ImportError", "tags": ["python"]}
            ],
            "tags": {"python": ["20260118_ab12_001"]},
            "keywords": {},
            "error_types": {"importerror": ["20260118_ab12_001"]}
        });

        let index = migrate_index(raw).unwrap();
        assert_eq!(index.version, CURRENT_INDEX_VERSION);
        assert_eq!(index.records.len(), 1);
        assert_eq!(index.records[0].error_type, "ImportError");
        assert_eq!(index.records[0].tags, vec!["python".to_string()]);
    }

    #[test]
    fn test_unversioned_index_gets_missing_maps() {
        let raw = json!({
            "created_at": "2026-01-18T09:00:00",
            "records": [],
            "tags": {}
        });

        let index = migrate_index(raw).unwrap();
        assert!(index.keywords.is_empty());
        assert!(index.error_types.is_empty());
        assert_eq!(index.version, CURRENT_INDEX_VERSION);
    }

    #[test]
    fn test_entries_with_bad_timestamps_are_dropped() {
        let raw = json!({
            "version": 3,
            "created_at": "2026-01-18T09:00:00",
            "records": [
                {"id": "20260118_ab12_001", "ts": "", "et": "TypeError", "tags": []},
                {"id": "20260118_ab12_002", "ts": "2026-01-18T11:00:00", "et": "TypeError", "tags": []}
            ]
        });

        let index = migrate_index(raw).unwrap();
        assert_eq!(index.records.len(), 1);
        assert_eq!(index.records[0].id.as_str(), "20260118_ab12_002");
    }

    #[test]
    fn test_current_version_is_untouched() {
        let raw = json!({
            "version": 4,
            "created_at": "2026-01-18T09:00:00",
            "updated_at": "garbage",
            "records": [
                {"id": "20260118_ab12_001", "timestamp": "2026-01-18T10:00:00", "error_type": "KeyError", "tags": []}
            ]
        });

        let index = migrate_index(raw).unwrap();
        assert_eq!(index.records[0].error_type, "KeyError");
        assert!(index.updated_at.is_none());
    }

    #[test]
    fn test_missing_created_at_is_filled() {
        let index = migrate_index(json!({"records": []})).unwrap();
        assert!(index.records.is_empty());
        assert!(index.created_at <= Local::now().naive_local());
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        assert!(migrate_index(json!([1, 2, 3])).is_err());
        assert!(migrate_index(json!({"records": [], "tags": "oops"})).is_err());
    }
}
