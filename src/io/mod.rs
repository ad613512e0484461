//! Input adapters at the API boundary.
//!
//! The core only accepts [`RecordSubmission`](crate::models::RecordSubmission).
//! Loosely shaped JSON from older callers is normalized here first.

pub mod legacy;

pub use legacy::{submission_from_parts, submission_from_value};
