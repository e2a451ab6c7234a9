//! # PID Registry
//!
//! Mints and resolves persistent identifiers. A PID value is either supplied
//! by the caller (deposits use their own UUID) or assigned by the registry
//! from a per-type counter (records get `1`, `2`, ...).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use deposit_core::{PersistentIdentifier, PidStatus, StoreError};

use crate::memory::Store;

/// Identifier minting and resolution.
pub trait PidRegistry: Send + Sync {
    /// Mint a PID bound to `object_uuid`. When `pid_value` is `None` the
    /// registry assigns the next value for `pid_type`.
    fn mint(
        &self,
        pid_type: &str,
        pid_value: Option<&str>,
        object_uuid: Uuid,
        status: PidStatus,
    ) -> Result<PersistentIdentifier, StoreError>;

    /// Fetch a PID regardless of status.
    fn get(&self, pid_type: &str, pid_value: &str) -> Result<PersistentIdentifier, StoreError>;

    /// Resolve a PID to its object. Deleted PIDs do not resolve.
    fn resolve(&self, pid_type: &str, pid_value: &str)
        -> Result<PersistentIdentifier, StoreError>;

    /// Mark a PID as deleted.
    fn delete(&self, pid_type: &str, pid_value: &str) -> Result<PersistentIdentifier, StoreError>;

    /// Set the status of an existing PID.
    fn set_status(
        &self,
        pid_type: &str,
        pid_value: &str,
        status: PidStatus,
    ) -> Result<PersistentIdentifier, StoreError>;

    /// Remove a PID entirely, as if it had never been minted. Used to undo
    /// a mint inside a failed transaction.
    fn discard(&self, pid_type: &str, pid_value: &str) -> Result<(), StoreError>;
}

type PidKey = (String, String);

/// In-memory [`PidRegistry`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryPidRegistry {
    pids: Store<PidKey, PersistentIdentifier>,
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl InMemoryPidRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_value(&self, pid_type: &str) -> String {
        let mut counters = self.counters.lock();
        let counter = counters.entry(pid_type.to_string()).or_insert(0);
        *counter += 1;
        counter.to_string()
    }
}

fn key(pid_type: &str, pid_value: &str) -> PidKey {
    (pid_type.to_string(), pid_value.to_string())
}

impl PidRegistry for InMemoryPidRegistry {
    fn mint(
        &self,
        pid_type: &str,
        pid_value: Option<&str>,
        object_uuid: Uuid,
        status: PidStatus,
    ) -> Result<PersistentIdentifier, StoreError> {
        let pid_value = match pid_value {
            Some(value) => value.to_string(),
            None => self.next_value(pid_type),
        };
        let pid = PersistentIdentifier {
            pid_type: pid_type.to_string(),
            pid_value: pid_value.clone(),
            object_uuid,
            status,
            created_at: Utc::now(),
        };
        if !self.pids.insert_new(key(pid_type, &pid_value), pid.clone()) {
            return Err(StoreError::AlreadyExists {
                kind: "pid",
                id: pid.to_string(),
            });
        }
        tracing::debug!(pid = %pid, object = %object_uuid, "minted pid");
        Ok(pid)
    }

    fn get(&self, pid_type: &str, pid_value: &str) -> Result<PersistentIdentifier, StoreError> {
        self.pids
            .get(&key(pid_type, pid_value))
            .ok_or_else(|| StoreError::not_found("pid", format!("{pid_type}:{pid_value}")))
    }

    fn resolve(
        &self,
        pid_type: &str,
        pid_value: &str,
    ) -> Result<PersistentIdentifier, StoreError> {
        let pid = self.get(pid_type, pid_value)?;
        if pid.is_deleted() {
            return Err(StoreError::Deleted {
                kind: "pid",
                id: pid.to_string(),
            });
        }
        Ok(pid)
    }

    fn delete(&self, pid_type: &str, pid_value: &str) -> Result<PersistentIdentifier, StoreError> {
        self.set_status(pid_type, pid_value, PidStatus::Deleted)
    }

    fn set_status(
        &self,
        pid_type: &str,
        pid_value: &str,
        status: PidStatus,
    ) -> Result<PersistentIdentifier, StoreError> {
        self.pids
            .try_update(&key(pid_type, pid_value), |pid| {
                pid.status = status;
                Ok(pid.clone())
            })
            .ok_or_else(|| StoreError::not_found("pid", format!("{pid_type}:{pid_value}")))?
    }

    fn discard(&self, pid_type: &str, pid_value: &str) -> Result<(), StoreError> {
        self.pids
            .remove(&key(pid_type, pid_value))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("pid", format!("{pid_type}:{pid_value}")))
    }
}
