//! # Record Store
//!
//! Persists JSON documents keyed by an opaque UUID. Every write produces a
//! new immutable revision; `revision_id` starts at 0 on create and grows by
//! one per commit. Commits are optimistic: the caller names the revision it
//! based its write on and the store refuses the write if the head moved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use deposit_core::StoreError;

use crate::memory::Store;

/// One revision of a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Document identifier.
    pub id: Uuid,
    /// Revision counter of this version.
    pub revision_id: u64,
    /// Document body. `Null` for a soft-deleted revision.
    pub json: Value,
    /// When the document was first created.
    pub created_at: DateTime<Utc>,
    /// When this revision was written.
    pub updated_at: DateTime<Utc>,
    /// Whether this revision marks the document as deleted.
    pub deleted: bool,
}

/// Versioned JSON document persistence.
pub trait RecordStore: Send + Sync {
    /// Create a document at revision 0.
    fn create(&self, id: Uuid, json: Value) -> Result<Record, StoreError>;

    /// Fetch the head revision. Soft-deleted documents are returned only
    /// when `include_deleted` is set.
    fn get(&self, id: Uuid, include_deleted: bool) -> Result<Record, StoreError>;

    /// Fetch a specific revision.
    fn get_revision(&self, id: Uuid, revision_id: u64) -> Result<Record, StoreError>;

    /// All revisions, oldest first.
    fn revisions(&self, id: Uuid) -> Result<Vec<Record>, StoreError>;

    /// Write a new revision on top of `expected_revision`.
    fn commit(&self, id: Uuid, json: Value, expected_revision: u64)
        -> Result<Record, StoreError>;

    /// Delete a document. `force` removes every revision; otherwise a
    /// deleted revision is appended.
    fn delete(&self, id: Uuid, force: bool) -> Result<(), StoreError>;

    /// Discard revisions newer than `to_revision`, or the whole document when
    /// `None`. Used to undo the writes of a failed transaction.
    fn rollback(&self, id: Uuid, to_revision: Option<u64>) -> Result<(), StoreError>;
}

/// In-memory [`RecordStore`] keeping the full revision history.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    documents: Store<Uuid, Vec<Record>>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents, deleted ones included.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document is stored.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn head(id: Uuid, revisions: &[Record]) -> Result<&Record, StoreError> {
    revisions.last().ok_or_else(|| StoreError::not_found("record", id))
}

impl RecordStore for InMemoryRecordStore {
    fn create(&self, id: Uuid, json: Value) -> Result<Record, StoreError> {
        let now = Utc::now();
        let record = Record {
            id,
            revision_id: 0,
            json,
            created_at: now,
            updated_at: now,
            deleted: false,
        };
        if !self.documents.insert_new(id, vec![record.clone()]) {
            return Err(StoreError::AlreadyExists {
                kind: "record",
                id: id.to_string(),
            });
        }
        Ok(record)
    }

    fn get(&self, id: Uuid, include_deleted: bool) -> Result<Record, StoreError> {
        let record = self
            .documents
            .read(&id, |revisions| head(id, revisions).cloned())
            .ok_or_else(|| StoreError::not_found("record", id))??;
        if record.deleted && !include_deleted {
            return Err(StoreError::Deleted {
                kind: "record",
                id: id.to_string(),
            });
        }
        Ok(record)
    }

    fn get_revision(&self, id: Uuid, revision_id: u64) -> Result<Record, StoreError> {
        self.documents
            .read(&id, |revisions| {
                revisions
                    .iter()
                    .find(|r| r.revision_id == revision_id)
                    .cloned()
            })
            .flatten()
            .ok_or_else(|| StoreError::not_found("record revision", format!("{id}@{revision_id}")))
    }

    fn revisions(&self, id: Uuid) -> Result<Vec<Record>, StoreError> {
        self.documents
            .get(&id)
            .ok_or_else(|| StoreError::not_found("record", id))
    }

    fn commit(
        &self,
        id: Uuid,
        json: Value,
        expected_revision: u64,
    ) -> Result<Record, StoreError> {
        self.documents
            .try_update(&id, |revisions| {
                let current = head(id, revisions)?;
                if current.deleted {
                    return Err(StoreError::Deleted {
                        kind: "record",
                        id: id.to_string(),
                    });
                }
                if current.revision_id != expected_revision {
                    return Err(StoreError::RevisionConflict {
                        id: id.to_string(),
                        expected: expected_revision,
                        actual: current.revision_id,
                    });
                }
                let next = Record {
                    id,
                    revision_id: current.revision_id + 1,
                    json,
                    created_at: current.created_at,
                    updated_at: Utc::now(),
                    deleted: false,
                };
                revisions.push(next.clone());
                Ok(next)
            })
            .ok_or_else(|| StoreError::not_found("record", id))?
    }

    fn delete(&self, id: Uuid, force: bool) -> Result<(), StoreError> {
        if force {
            return self
                .documents
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found("record", id));
        }
        self.documents
            .try_update(&id, |revisions| {
                let current = head(id, revisions)?;
                let marker = Record {
                    id,
                    revision_id: current.revision_id + 1,
                    json: Value::Null,
                    created_at: current.created_at,
                    updated_at: Utc::now(),
                    deleted: true,
                };
                revisions.push(marker);
                Ok(())
            })
            .ok_or_else(|| StoreError::not_found("record", id))?
    }

    fn rollback(&self, id: Uuid, to_revision: Option<u64>) -> Result<(), StoreError> {
        match to_revision {
            None => {
                self.documents.remove(&id);
                Ok(())
            }
            Some(revision) => self
                .documents
                .try_update(&id, |revisions| {
                    revisions.retain(|r| r.revision_id <= revision);
                    Ok(())
                })
                .ok_or_else(|| StoreError::not_found("record", id))?,
        }
    }
}
