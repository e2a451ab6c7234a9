//! # deposit-core — Foundational Types for the Deposit Stack
//!
//! This crate is the leaf of the workspace dependency graph. It defines the
//! primitives every other crate agrees on: identifier newtypes, persistent
//! identifiers, schema URL resolution, file checksums, configuration and the
//! shared error taxonomy.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `DepositId`, `BucketId`,
//!    `ObjectVersionId`, `FileId` are distinct types. A bucket id
//!    can never be passed where a deposit id is expected.
//!
//! 2. **Schema pointers are resolved, never string-mangled in place.**
//!    [`SchemaResolver`] is the single place that converts between deposit
//!    schemas (`{base}deposits/...`) and record schemas (`{base}...`).
//!
//! 3. **One error vocabulary.** [`DepositError`] carries the failure kinds the
//!    lifecycle protocol can surface; [`StoreError`] carries adapter failures.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `deposit-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod digest;
pub mod error;
pub mod identity;
pub mod pid;
pub mod schema;

// Re-export primary types for ergonomic imports.
pub use config::DepositConfig;
pub use digest::{sha256_checksum, Checksum};
pub use error::{DepositError, StoreError};
pub use identity::{BucketId, DepositId, FileId, ObjectVersionId, PrincipalId};
pub use pid::{PersistentIdentifier, PidStatus, PublishedPid};
pub use schema::SchemaResolver;
