//! # API Route Modules
//!
//! - `deposits`: deposit create, read, metadata replace, delete.
//! - `actions`: lifecycle actions (publish, edit, discard, delete).
//! - `files`: ordered file management on a deposit's working bucket.
//! - `records`: read-only lookup of published records by record PID.
//! - `buckets`: read-only bucket listings, including publish snapshots.

pub mod actions;
pub mod buckets;
pub mod deposits;
pub mod files;
pub mod records;

/// Path of a deposit resource.
pub(crate) fn deposit_path(pid_value: &str) -> String {
    format!("/api/deposits/{pid_value}")
}
