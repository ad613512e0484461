//! Record store implementations.

mod filesystem;

pub use filesystem::FilesystemRecordStore;
