//! # Persistent Identifiers
//!
//! A PID is a `(type, value)` pair bound to one stored object, with a
//! lifecycle status. Deposits are minted under the `depid` type, published
//! records under `recid` (both configurable in [`crate::DepositConfig`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a persistent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PidStatus {
    /// Minted but not yet bound to an object.
    New,
    /// Reserved for an object that is not public yet.
    Reserved,
    /// Registered and resolvable.
    Registered,
    /// Deleted; resolves to nothing.
    Deleted,
}

impl PidStatus {
    /// Return the string representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reserved => "reserved",
            Self::Registered => "registered",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for PidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persistent identifier as stored by the PID registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentIdentifier {
    /// PID type, e.g. `depid` or `recid`.
    pub pid_type: String,
    /// PID value, unique within its type.
    pub pid_value: String,
    /// UUID of the object the PID points at.
    pub object_uuid: Uuid,
    /// Current lifecycle status.
    pub status: PidStatus,
    /// When the PID was minted.
    pub created_at: DateTime<Utc>,
}

impl PersistentIdentifier {
    /// Whether the PID is in the registered state.
    pub fn is_registered(&self) -> bool {
        self.status == PidStatus::Registered
    }

    /// Whether the PID was deleted.
    pub fn is_deleted(&self) -> bool {
        self.status == PidStatus::Deleted
    }
}

impl std::fmt::Display for PersistentIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.pid_type, self.pid_value)
    }
}

/// Reference from a deposit to its published record.
///
/// `revision_id` is the record revision the deposit's current draft was
/// derived from; republishing checks it against the record's head revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPid {
    /// PID type of the published record.
    #[serde(rename = "type")]
    pub pid_type: String,
    /// PID value of the published record.
    pub value: String,
    /// Record revision this draft is based on.
    pub revision_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_pid_uses_type_key() {
        let pid = PublishedPid {
            pid_type: "recid".into(),
            value: "1".into(),
            revision_id: 0,
        };
        let json = serde_json::to_value(&pid).unwrap();
        assert_eq!(json["type"], "recid");
        assert_eq!(json["revision_id"], 0);
    }

    #[test]
    fn status_predicates() {
        let mut pid = PersistentIdentifier {
            pid_type: "depid".into(),
            pid_value: "abc".into(),
            object_uuid: Uuid::new_v4(),
            status: PidStatus::Registered,
            created_at: Utc::now(),
        };
        assert!(pid.is_registered());
        pid.status = PidStatus::Deleted;
        assert!(!pid.is_registered());
        assert!(pid.is_deleted());
        assert_eq!(pid.to_string(), "depid:abc");
    }
}
