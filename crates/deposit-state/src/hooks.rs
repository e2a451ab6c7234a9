//! # Lifecycle Observers
//!
//! Observers are owned by the [`DepositContext`](crate::DepositContext) and
//! run at the persistence boundary:
//!
//! - `before_commit` runs before a deposit revision is written and may abort
//!   the write by returning an error.
//! - `after_commit`, `after_publish` and `after_delete` run once the write
//!   is durable. Their failures are logged and never undo the write.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use deposit_core::{DepositError, DepositId};
use deposit_store::{IndexError, Record, SearchIndex};

use crate::deposit::Deposit;

/// Failure reported by an observer after a durable write.
#[derive(Error, Debug)]
pub enum ObserverError {
    /// The search index refused the notification.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Any other observer failure.
    #[error("{0}")]
    Other(String),
}

/// Hooks around deposit persistence.
pub trait DepositObserver: Send + Sync {
    /// Runs before a deposit revision is written. An error aborts the write.
    fn before_commit(&self, _deposit: &Deposit) -> Result<(), DepositError> {
        Ok(())
    }

    /// Runs after a deposit revision was written.
    fn after_commit(&self, _deposit: &Deposit) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Runs after a publish wrote the record.
    fn after_publish(&self, _deposit: &Deposit, _record: &Record) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Runs after a deposit was deleted.
    fn after_delete(&self, _id: DepositId) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Keeps the search index in step with deposits and records.
pub struct IndexingObserver {
    index: Arc<dyn SearchIndex>,
}

impl IndexingObserver {
    /// Notify `index` of every change.
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }
}

impl DepositObserver for IndexingObserver {
    fn after_commit(&self, deposit: &Deposit) -> Result<(), ObserverError> {
        let document = deposit.to_json()?;
        self.index.upsert(*deposit.id().as_uuid(), &document)?;
        Ok(())
    }

    fn after_publish(&self, _deposit: &Deposit, record: &Record) -> Result<(), ObserverError> {
        self.index.upsert(record.id, &record.json)?;
        Ok(())
    }

    fn after_delete(&self, id: DepositId) -> Result<(), ObserverError> {
        let uuid: Uuid = *id.as_uuid();
        self.index.delete(uuid)?;
        Ok(())
    }
}

impl From<DepositError> for ObserverError {
    fn from(err: DepositError) -> Self {
        Self::Other(err.to_string())
    }
}
