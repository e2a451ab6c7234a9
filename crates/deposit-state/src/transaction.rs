//! # Transactions
//!
//! Adapters have no shared transaction manager, so every mutating deposit
//! operation runs inside a [`Transaction`] that journals one
//! [`Compensation`] per durable write. If a later step fails the journal is
//! replayed in reverse and the operation leaves nothing behind.
//!
//! A compensation that itself fails is logged at `error` with the
//! operation and the failed step; the original error is still returned.

use uuid::Uuid;

use deposit_core::{BucketId, DepositError, FileId, PidStatus, StoreError};

use crate::context::DepositContext;

/// Undo step for one durable write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Forget a freshly minted PID.
    DiscardPid {
        /// PID type.
        pid_type: String,
        /// PID value.
        pid_value: String,
    },
    /// Put a PID back into the status it had before the operation.
    RestorePid {
        /// PID type.
        pid_type: String,
        /// PID value.
        pid_value: String,
        /// Status before the operation.
        status: PidStatus,
    },
    /// Drop record revisions newer than `to`, or the whole record for `None`.
    RollbackRecord {
        /// Record identifier.
        id: Uuid,
        /// Revision to return to.
        to: Option<u64>,
    },
    /// Drop a bucket created by the operation.
    RemoveBucket(BucketId),
    /// Lift a lock taken by the operation.
    UnlockBucket(BucketId),
    /// Point `key` back at `previous`, or delete it for `None`.
    RestoreObject {
        /// Bucket holding the key.
        bucket: BucketId,
        /// Object key.
        key: String,
        /// Content the key linked before the operation.
        previous: Option<FileId>,
    },
}

impl Compensation {
    fn apply(&self, ctx: &DepositContext) -> Result<(), StoreError> {
        match self {
            Self::DiscardPid {
                pid_type,
                pid_value,
            } => ctx.pids().discard(pid_type, pid_value),
            Self::RestorePid {
                pid_type,
                pid_value,
                status,
            } => ctx
                .pids()
                .set_status(pid_type, pid_value, *status)
                .map(|_| ()),
            Self::RollbackRecord { id, to } => ctx.records().rollback(*id, *to),
            Self::RemoveBucket(bucket) => ctx.files().remove_bucket(*bucket),
            Self::UnlockBucket(bucket) => ctx.files().unlock(*bucket).map(|_| ()),
            Self::RestoreObject {
                bucket,
                key,
                previous,
            } => match previous {
                Some(file) => ctx.files().link(*bucket, key, *file).map(|_| ()),
                None => ctx.files().delete(*bucket, key).map(|_| ()),
            },
        }
    }
}

impl std::fmt::Display for Compensation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiscardPid {
                pid_type,
                pid_value,
            } => write!(f, "discard pid {pid_type}:{pid_value}"),
            Self::RestorePid {
                pid_type,
                pid_value,
                status,
            } => write!(f, "restore pid {pid_type}:{pid_value} to {status}"),
            Self::RollbackRecord { id, to: Some(to) } => {
                write!(f, "roll back record {id} to revision {to}")
            }
            Self::RollbackRecord { id, to: None } => write!(f, "remove record {id}"),
            Self::RemoveBucket(bucket) => write!(f, "remove bucket {bucket}"),
            Self::UnlockBucket(bucket) => write!(f, "unlock bucket {bucket}"),
            Self::RestoreObject { bucket, key, .. } => write!(f, "restore {bucket}/{key}"),
        }
    }
}

/// Compensation journal for one operation.
pub struct Transaction<'a> {
    ctx: &'a DepositContext,
    operation: &'static str,
    journal: Vec<Compensation>,
}

impl<'a> Transaction<'a> {
    /// Run `body` as `operation`. On error every journaled compensation is
    /// applied newest first and the error is returned.
    pub fn run<T>(
        ctx: &'a DepositContext,
        operation: &'static str,
        body: impl FnOnce(&mut Transaction<'a>) -> Result<T, DepositError>,
    ) -> Result<T, DepositError> {
        let mut tx = Transaction {
            ctx,
            operation,
            journal: Vec::new(),
        };
        match body(&mut tx) {
            Ok(value) => Ok(value),
            Err(err) => {
                tx.rollback(&err);
                Err(err)
            }
        }
    }

    /// The context the transaction runs against.
    pub fn context(&self) -> &'a DepositContext {
        self.ctx
    }

    /// Record how to undo a write that just succeeded.
    pub fn journal(&mut self, compensation: Compensation) {
        self.journal.push(compensation);
    }

    /// Number of journaled compensations.
    pub fn len(&self) -> usize {
        self.journal.len()
    }

    /// Whether nothing was journaled yet.
    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    fn rollback(&mut self, cause: &DepositError) {
        tracing::warn!(
            action = self.operation,
            steps = self.journal.len(),
            error = %cause,
            "rolling back"
        );
        while let Some(step) = self.journal.pop() {
            match step.apply(self.ctx) {
                Ok(()) => tracing::debug!(action = self.operation, step = %step, "compensated"),
                Err(e) => tracing::error!(
                    action = self.operation,
                    step = %step,
                    error = %e,
                    "compensation failed"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deposit_core::PidStatus;
    use deposit_store::BucketOptions;

    #[test]
    fn failed_body_replays_journal_in_reverse() {
        let ctx = DepositContext::default();
        let record_id = Uuid::new_v4();
        let existing = ctx.files().create_bucket(BucketOptions::default()).unwrap().id;
        let mut created = None;
        let result: Result<(), DepositError> = Transaction::run(&ctx, "test", |tx| {
            let pid = ctx
                .pids()
                .mint("recid", None, record_id, PidStatus::Registered)?;
            tx.journal(Compensation::DiscardPid {
                pid_type: pid.pid_type.clone(),
                pid_value: pid.pid_value.clone(),
            });
            let bucket = ctx.files().create_bucket(BucketOptions::default())?;
            tx.journal(Compensation::RemoveBucket(bucket.id));
            created = Some(bucket.id);
            ctx.files().lock(bucket.id)?;
            tx.journal(Compensation::UnlockBucket(bucket.id));

            // Two writes to one key: only newest-first replay ends with no key.
            let first = ctx.files().put(existing, "a", b"1")?;
            tx.journal(Compensation::RestoreObject {
                bucket: existing,
                key: "a".to_string(),
                previous: None,
            });
            ctx.files().put(existing, "a", b"2")?;
            tx.journal(Compensation::RestoreObject {
                bucket: existing,
                key: "a".to_string(),
                previous: first.file.map(|f| f.id),
            });
            assert_eq!(tx.len(), 5);
            Err(DepositError::InvalidDocument("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(ctx.pids().get("recid", "1").is_err());
        assert!(matches!(
            ctx.files().bucket(created.unwrap()),
            Err(StoreError::NotFound { .. })
        ));
        assert!(ctx.files().get(existing, "a", None).is_err());
        assert!(ctx.files().list(existing).unwrap().is_empty());
    }

    #[test]
    fn failed_body_puts_deleted_pid_back() {
        let ctx = DepositContext::default();
        let object = Uuid::new_v4();
        ctx.pids()
            .mint("depid", Some("x"), object, PidStatus::Registered)
            .unwrap();
        let result: Result<(), DepositError> = Transaction::run(&ctx, "test", |tx| {
            ctx.pids().delete("depid", "x")?;
            tx.journal(Compensation::RestorePid {
                pid_type: "depid".to_string(),
                pid_value: "x".to_string(),
                status: PidStatus::Registered,
            });
            Err(DepositError::InvalidDocument("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(ctx.pids().resolve("depid", "x").unwrap().object_uuid, object);
    }

    #[test]
    fn successful_body_keeps_writes() {
        let ctx = DepositContext::default();
        let record_id = Uuid::new_v4();
        Transaction::run(&ctx, "test", |tx| {
            ctx.records().create(record_id, serde_json::json!({}))?;
            tx.journal(Compensation::RollbackRecord {
                id: record_id,
                to: None,
            });
            Ok(())
        })
        .unwrap();
        assert!(ctx.records().get(record_id, false).is_ok());
    }

    #[test]
    fn compensation_display_names_the_step() {
        let bucket = BucketId::new();
        assert_eq!(
            Compensation::UnlockBucket(bucket).to_string(),
            format!("unlock bucket {bucket}")
        );
    }
}
