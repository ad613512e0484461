//! Index file persistence.

mod file;

pub use file::IndexFile;
