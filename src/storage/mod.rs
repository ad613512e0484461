//! Storage layer.
//!
//! Two layers back every project:
//! - **Persistence**: authoritative, write-once record files (`{id}.json`)
//! - **Index**: the derived `index.json` holding projections and inverted indexes
//!
//! The index can always be regenerated from the persistence layer.

pub mod index;
pub mod migrations;
pub mod persistence;
pub mod traits;

pub use index::IndexFile;
pub use migrations::{MIGRATIONS, Migration, migrate_index};
pub use persistence::FilesystemRecordStore;
pub use traits::{RecordStore, ScannedRecord};
