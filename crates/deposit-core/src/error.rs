//! # Error Types — Structured Error Hierarchy
//!
//! Two layers, both `thiserror` derived:
//!
//! - [`StoreError`] — failures reported by the storage adapters (record
//!   store, PID registry, bucket store). Propagated unmodified unless the
//!   lifecycle layer has a more precise kind for them.
//! - [`DepositError`] — the failure kinds of the deposit lifecycle protocol.
//!   Every guard violation is [`DepositError::InvalidAction`] and is raised
//!   before anything is written.

use thiserror::Error;

use crate::identity::BucketId;

/// Failures of the lifecycle protocol and the file-ordering subsystem.
#[derive(Error, Debug)]
pub enum DepositError {
    /// The requested transition is illegal for the current status/history.
    #[error("invalid action {action}: {reason}")]
    InvalidAction {
        /// The operation that was refused (e.g. "publish").
        action: &'static str,
        /// Why it was refused.
        reason: String,
    },

    /// Declared schema identifier is not a registered schema.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// File operation referenced a key that is not in the deposit.
    #[error("file key not found: {0}")]
    KeyNotFound(String),

    /// File operation would collide with an existing key.
    #[error("file key already exists: {0}")]
    AlreadyExists(String),

    /// The published record moved since the deposit last looked at it.
    #[error("stale revision: {0}")]
    StaleRevision(String),

    /// A reorder request was not a complete permutation of the file list.
    #[error("invalid file order: {0}")]
    InvalidOrder(String),

    /// A document or value failed structural checks.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The deposit (or its published record) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The bucket is locked by a snapshot and refuses writes.
    #[error("bucket {0} is locked")]
    BucketLocked(BucketId),

    /// Any other adapter failure.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl DepositError {
    /// Shorthand for building an [`DepositError::InvalidAction`].
    pub fn invalid_action(action: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            action,
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for DepositError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BucketLocked(bucket) => Self::BucketLocked(bucket),
            other => Self::Store(other),
        }
    }
}

impl From<serde_json::Error> for DepositError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDocument(err.to_string())
    }
}

/// Failures reported by storage adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No object of this kind with this id.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Object kind ("record", "pid", "bucket", "object").
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The object exists but was soft-deleted.
    #[error("{kind} {id} was deleted")]
    Deleted {
        /// Object kind.
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// An object with this identifier already exists.
    #[error("{kind} {id} already exists")]
    AlreadyExists {
        /// Object kind.
        kind: &'static str,
        /// Conflicting identifier.
        id: String,
    },

    /// Optimistic-concurrency check failed on commit.
    #[error("revision conflict on {id}: expected {expected}, stored {actual}")]
    RevisionConflict {
        /// Document identifier.
        id: String,
        /// Revision the caller based its write on.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// The bucket is locked and refuses writes.
    #[error("bucket {0} is locked")]
    BucketLocked(BucketId),

    /// The backend could not serve the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
