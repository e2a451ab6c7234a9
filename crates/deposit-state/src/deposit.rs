//! # Deposit Lifecycle
//!
//! A [`Deposit`] is a mutable draft wrapping a versioned document in the
//! record store. Publishing copies it into a separate record under its own
//! PID; editing brings the published record back as a new draft revision.
//!
//! ## Revisions
//!
//! `revision_id` is the record-store revision of the deposit document. It
//! is 0 after `create` and grows by one on every persisted mutation. The
//! control block's `pid.revision_id` is the record revision the draft was
//! derived from; republishing refuses to overwrite a record that moved.
//!
//! ## Buckets
//!
//! Publishing locks the working bucket and lists the files against a locked
//! snapshot. Editing or discarding continues in a fresh unlocked bucket
//! seeded from that snapshot.
//!
//! ## Guards
//!
//! | Operation | Allowed from                        |
//! |-----------|-------------------------------------|
//! | `publish` | draft                               |
//! | `edit`    | published                           |
//! | `discard` | draft of a previously published one |
//! | `delete`  | draft that was never published      |
//!
//! A guard violation is [`DepositError::InvalidAction`] and is raised before
//! anything is written.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use deposit_core::{
    BucketId, DepositError, DepositId, PersistentIdentifier, PidStatus, PrincipalId,
    PublishedPid, StoreError,
};
use deposit_store::{BucketOptions, Record};

use crate::context::DepositContext;
use crate::document::{is_control_key, Envelope, CONTROL_KEY, SCHEMA_KEY};
use crate::files::{FileEntry, FileOrder};
use crate::status::{DepositControl, DepositStatus};
use crate::transaction::{Compensation, Transaction};

/// A deposit loaded from the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct Deposit {
    pub(crate) control: DepositControl,
    pub(crate) schema: String,
    pub(crate) metadata: Map<String, Value>,
    pub(crate) files: FileOrder,
    pub(crate) bucket: Option<BucketId>,
    pub(crate) revision_id: u64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

fn not_found(err: StoreError, what: impl std::fmt::Display) -> DepositError {
    match err {
        StoreError::NotFound { .. } | StoreError::Deleted { .. } => {
            DepositError::NotFound(what.to_string())
        }
        other => other.into(),
    }
}

impl Deposit {
    // ── Loading ─────────────────────────────────────────────────────

    /// Create a draft from `metadata`.
    ///
    /// Assigns the default deposit schema when `$schema` is absent, mints
    /// the deposit PID (value = id), creates the working bucket and writes
    /// revision 0. Owners are `principal` plus any owners listed in the
    /// input `_deposit` block.
    pub fn create(
        ctx: &DepositContext,
        metadata: Value,
        id: Option<DepositId>,
        principal: Option<&PrincipalId>,
    ) -> Result<Self, DepositError> {
        let Value::Object(mut metadata) = metadata else {
            return Err(DepositError::InvalidDocument(
                "deposit metadata must be a JSON object".to_string(),
            ));
        };

        let schema = match metadata.remove(SCHEMA_KEY) {
            None | Some(Value::Null) => ctx.schemas().default_deposit_schema(),
            Some(Value::String(schema)) => schema,
            Some(other) => {
                return Err(DepositError::InvalidDocument(format!(
                    "{SCHEMA_KEY} must be a string, got {other}"
                )))
            }
        };
        ctx.schemas().validate_deposit_schema(&schema)?;

        let mut owners = requested_owners(metadata.get(CONTROL_KEY))?;
        if let Some(principal) = principal {
            owners.insert(principal.clone());
        }
        metadata.retain(|key, _| !is_control_key(key));

        let id = id.unwrap_or_default();
        let pid_type = ctx.config().deposit_pid_type.clone();

        let (bucket, record) = Transaction::run(ctx, "create", |tx| {
            let pid = ctx.pids().mint(
                &pid_type,
                Some(&id.to_string()),
                *id.as_uuid(),
                PidStatus::Registered,
            )?;
            tx.journal(Compensation::DiscardPid {
                pid_type: pid.pid_type,
                pid_value: pid.pid_value,
            });

            let bucket = ctx.files().create_bucket(BucketOptions {
                storage_class: ctx.config().default_storage_class.clone(),
            })?;
            tx.journal(Compensation::RemoveBucket(bucket.id));

            let envelope = Envelope {
                schema: schema.clone(),
                control: DepositControl::draft(id, owners.clone()),
                bucket: Some(bucket.id),
                files: Value::Array(Vec::new()),
                metadata: metadata.clone(),
            };
            let record = ctx.records().create(*id.as_uuid(), envelope.into_value()?)?;
            tx.journal(Compensation::RollbackRecord {
                id: record.id,
                to: None,
            });
            Ok((bucket.id, record))
        })?;

        let deposit = Self {
            control: DepositControl::draft(id, owners),
            schema,
            metadata,
            files: FileOrder::default(),
            bucket: Some(bucket),
            revision_id: record.revision_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        ctx.notify_committed(&deposit);
        tracing::info!(deposit_id = %id, revision_id = deposit.revision_id, "deposit created");
        Ok(deposit)
    }

    /// Load a deposit by id.
    pub fn get(ctx: &DepositContext, id: DepositId) -> Result<Self, DepositError> {
        let record = ctx
            .records()
            .get(*id.as_uuid(), false)
            .map_err(|e| not_found(e, format!("deposit {id}")))?;
        let deposit = Self::from_record(&record)?;
        // Published records carry a copy of the control block too.
        if deposit.id() != id {
            return Err(DepositError::NotFound(format!("deposit {id}")));
        }
        Ok(deposit)
    }

    /// Load a deposit through its deposit PID.
    pub fn resolve(ctx: &DepositContext, pid_value: &str) -> Result<Self, DepositError> {
        let pid = ctx
            .pids()
            .resolve(&ctx.config().deposit_pid_type, pid_value)
            .map_err(|e| not_found(e, format!("deposit pid {pid_value}")))?;
        Self::get(ctx, DepositId::from_uuid(pid.object_uuid))
    }

    /// Rebuild a deposit from a stored revision.
    pub fn from_record(record: &Record) -> Result<Self, DepositError> {
        let envelope = Envelope::parse(record.json.clone())?;
        let files: FileOrder = serde_json::from_value(envelope.files)?;
        Ok(Self {
            control: envelope.control,
            schema: envelope.schema,
            metadata: envelope.metadata,
            files,
            bucket: envelope.bucket,
            revision_id: record.revision_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// The stored document.
    pub fn to_json(&self) -> Result<Value, DepositError> {
        Envelope {
            schema: self.schema.clone(),
            control: self.control.clone(),
            bucket: self.bucket,
            files: serde_json::to_value(&self.files)?,
            metadata: self.metadata.clone(),
        }
        .into_value()
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn id(&self) -> DepositId {
        self.control.id
    }

    pub fn status(&self) -> DepositStatus {
        self.control.status
    }

    pub fn revision_id(&self) -> u64 {
        self.revision_id
    }

    pub fn owners(&self) -> &BTreeSet<PrincipalId> {
        &self.control.owners
    }

    /// Whether `principal` may mutate this deposit.
    pub fn is_owned_by(&self, principal: &PrincipalId) -> bool {
        self.control.owners.contains(principal)
    }

    /// Pointer at the published record, once published.
    pub fn published_pid(&self) -> Option<&PublishedPid> {
        self.control.pid.as_ref()
    }

    pub fn control(&self) -> &DepositControl {
        &self.control
    }

    /// `$schema` URL.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Working bucket.
    pub fn bucket(&self) -> Option<BucketId> {
        self.bucket
    }

    /// Ordered file references.
    pub fn files(&self) -> &FileOrder {
        &self.files
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ── Metadata ────────────────────────────────────────────────────

    /// Domain metadata. Never contains control keys.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// One metadata field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Mutable metadata, refused while published. Control keys inserted
    /// here are dropped when the deposit is written.
    pub fn metadata_mut(&mut self) -> Result<&mut Map<String, Value>, DepositError> {
        self.require_status(DepositStatus::Draft, "update")?;
        Ok(&mut self.metadata)
    }

    /// Set one field. Not persisted until the next commit.
    pub fn set(&mut self, key: &str, value: Value) -> Result<Option<Value>, DepositError> {
        self.require_status(DepositStatus::Draft, "update")?;
        if is_control_key(key) {
            return Err(DepositError::InvalidDocument(format!(
                "{key} is a control field"
            )));
        }
        Ok(self.metadata.insert(key.to_string(), value))
    }

    /// Merge the fields of a JSON object. Control keys are ignored.
    pub fn update(&mut self, fields: Value) -> Result<(), DepositError> {
        self.require_status(DepositStatus::Draft, "update")?;
        let fields = metadata_object(fields)?;
        self.metadata.extend(fields);
        Ok(())
    }

    /// Remove every metadata field.
    pub fn clear(&mut self) -> Result<(), DepositError> {
        self.require_status(DepositStatus::Draft, "update")?;
        self.metadata.clear();
        Ok(())
    }

    /// Replace all metadata with the fields of a JSON object. Control keys
    /// in the input are ignored, so a document read back from the API can
    /// be sent as is.
    pub fn replace_metadata(&mut self, fields: Value) -> Result<(), DepositError> {
        self.require_status(DepositStatus::Draft, "update")?;
        self.metadata = metadata_object(fields)?;
        Ok(())
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Persist the in-memory state as a new revision.
    pub fn commit(&mut self, ctx: &DepositContext) -> Result<(), DepositError> {
        let mut next = self.clone();
        Transaction::run(ctx, "commit", |tx| next.write(tx))?;
        *self = next;
        ctx.notify_committed(self);
        tracing::debug!(deposit_id = %self.id(), revision_id = self.revision_id, "deposit committed");
        Ok(())
    }

    /// Publish the draft.
    ///
    /// The first publish mints the record PID, snapshots the working
    /// bucket when it holds files, and creates the record. Later publishes
    /// overwrite the record with a new revision, provided it has not moved
    /// since the draft was derived from it, and take a new snapshot unless
    /// the file set is the one the record already lists. Either way the
    /// working bucket is locked and the deposit is committed as published.
    pub fn publish(&mut self, ctx: &DepositContext) -> Result<(), DepositError> {
        self.require_status(DepositStatus::Draft, "publish")?;
        let own = ctx
            .pids()
            .get(&ctx.config().deposit_pid_type, &self.id().to_string())?;
        if !own.is_registered() {
            return Err(DepositError::invalid_action(
                "publish",
                format!("deposit pid is {}", own.status),
            ));
        }

        let mut next = self.clone();
        let record = Transaction::run(ctx, "publish", |tx| {
            next.control.status = DepositStatus::Published;
            next.lock_working_bucket(tx)?;
            let record = match next.control.pid.clone() {
                None => next.publish_new(tx)?,
                Some(pid) => next.publish_existing(tx, &pid)?,
            };
            next.write(tx)?;
            Ok(record)
        })?;
        *self = next;

        ctx.notify_committed(self);
        ctx.notify_published(self, &record);
        tracing::info!(
            deposit_id = %self.id(),
            revision_id = self.revision_id,
            record_id = %record.id,
            record_revision = record.revision_id,
            action = "publish",
            "deposit published"
        );
        Ok(())
    }

    /// Reopen a published deposit as a draft of its published record.
    pub fn edit(&mut self, ctx: &DepositContext) -> Result<(), DepositError> {
        self.require_status(DepositStatus::Published, "edit")?;
        let (pid, record) = self.fetch_published(ctx)?;
        if !pid.is_registered() {
            return Err(DepositError::invalid_action(
                "edit",
                format!("record pid {pid} is {}", pid.status),
            ));
        }
        let published = Envelope::parse(record.json.clone())?;
        if published.control != self.control {
            return Err(DepositError::StaleRevision(format!(
                "record {} was modified outside deposit {}",
                record.id,
                self.id()
            )));
        }
        self.reload_published(ctx, &record, "edit")
    }

    /// Abandon draft changes and return to the last published content.
    pub fn discard(&mut self, ctx: &DepositContext) -> Result<(), DepositError> {
        self.require_status(DepositStatus::Draft, "discard")?;
        if self.control.pid.is_none() {
            return Err(DepositError::invalid_action(
                "discard",
                "deposit was never published",
            ));
        }
        let (_, record) = self.fetch_published(ctx)?;
        self.reload_published(ctx, &record, "discard")
    }

    /// Delete a deposit that was never published: its PID, its document and
    /// its working bucket.
    ///
    /// The PID goes first and is put back if the document cannot be
    /// deleted. The bucket is removed only once both are gone.
    pub fn delete(self, ctx: &DepositContext) -> Result<(), DepositError> {
        if self.control.status == DepositStatus::Published || self.control.pid.is_some() {
            return Err(DepositError::invalid_action(
                "delete",
                "deposit has been published",
            ));
        }
        let id = self.id();
        Transaction::run(ctx, "delete", |tx| {
            let pid_type = &ctx.config().deposit_pid_type;
            let pid_value = id.to_string();
            let before = ctx.pids().get(pid_type, &pid_value)?.status;
            ctx.pids().delete(pid_type, &pid_value)?;
            tx.journal(Compensation::RestorePid {
                pid_type: pid_type.clone(),
                pid_value,
                status: before,
            });
            ctx.records().delete(*id.as_uuid(), true)?;
            Ok(())
        })?;
        if let Some(bucket) = self.bucket {
            self.remove_retired_bucket(ctx, bucket);
        }
        ctx.notify_deleted(id);
        tracing::info!(deposit_id = %id, action = "delete", "deposit deleted");
        Ok(())
    }

    /// The published record and its PID.
    pub fn fetch_published(
        &self,
        ctx: &DepositContext,
    ) -> Result<(PersistentIdentifier, Record), DepositError> {
        let published = self.control.pid.as_ref().ok_or_else(|| {
            DepositError::NotFound(format!("deposit {} has no published record", self.id()))
        })?;
        let pid = ctx
            .pids()
            .get(&published.pid_type, &published.value)
            .map_err(|e| not_found(e, format!("record pid {}", published.value)))?;
        let record = ctx
            .records()
            .get(pid.object_uuid, true)
            .map_err(|e| not_found(e, format!("record {}", pid.object_uuid)))?;
        Ok((pid, record))
    }

    // ── Internals ───────────────────────────────────────────────────

    pub(crate) fn require_status(
        &self,
        expected: DepositStatus,
        action: &'static str,
    ) -> Result<(), DepositError> {
        if self.control.status != expected {
            return Err(DepositError::invalid_action(
                action,
                format!("deposit is {}, expected {}", self.control.status, expected),
            ));
        }
        Ok(())
    }

    pub(crate) fn working_bucket(&self) -> Result<BucketId, DepositError> {
        self.bucket.ok_or_else(|| {
            DepositError::InvalidDocument(format!("deposit {} has no bucket", self.id()))
        })
    }

    /// Write the current state as the next revision, running
    /// `before_commit` observers first.
    pub(crate) fn write(&mut self, tx: &mut Transaction<'_>) -> Result<(), DepositError> {
        let ctx = tx.context();
        for observer in ctx.observers() {
            observer.before_commit(self)?;
        }
        let base = self.revision_id;
        let id = *self.id().as_uuid();
        let record = ctx.records().commit(id, self.to_json()?, base)?;
        tx.journal(Compensation::RollbackRecord { id, to: Some(base) });
        self.revision_id = record.revision_id;
        self.updated_at = record.updated_at;
        Ok(())
    }

    /// Best effort: the operation that let go of `bucket` is already durable.
    fn remove_retired_bucket(&self, ctx: &DepositContext, bucket: BucketId) {
        if let Err(e) = ctx.files().remove_bucket(bucket) {
            tracing::warn!(
                deposit_id = %self.id(),
                bucket = %bucket,
                error = %e,
                "failed to remove retired working bucket"
            );
        }
    }

    fn lock_working_bucket(&self, tx: &mut Transaction<'_>) -> Result<(), DepositError> {
        let Some(bucket) = self.bucket else {
            return Ok(());
        };
        let files = tx.context().files();
        if !files.bucket(bucket)?.locked {
            files.lock(bucket)?;
            tx.journal(Compensation::UnlockBucket(bucket));
        }
        Ok(())
    }

    fn snapshot(&self, tx: &mut Transaction<'_>) -> Result<Option<BucketId>, DepositError> {
        let (Some(bucket), false) = (self.bucket, self.files.is_empty()) else {
            return Ok(None);
        };
        let snapshot = tx.context().files().snapshot(bucket, true)?;
        tx.journal(Compensation::RemoveBucket(snapshot.id));
        Ok(Some(snapshot.id))
    }

    fn publish_new(&mut self, tx: &mut Transaction<'_>) -> Result<Record, DepositError> {
        let ctx = tx.context();
        let record_id = uuid::Uuid::new_v4();
        let pid = ctx.pids().mint(
            &ctx.config().record_pid_type,
            None,
            record_id,
            PidStatus::Registered,
        )?;
        tx.journal(Compensation::DiscardPid {
            pid_type: pid.pid_type.clone(),
            pid_value: pid.pid_value.clone(),
        });
        self.control.pid = Some(PublishedPid {
            pid_type: pid.pid_type,
            value: pid.pid_value,
            revision_id: 0,
        });

        let snapshot = self.snapshot(tx)?;
        let document = self.record_document(ctx, snapshot)?;
        let record = ctx.records().create(record_id, document)?;
        tx.journal(Compensation::RollbackRecord {
            id: record_id,
            to: None,
        });
        Ok(record)
    }

    fn publish_existing(
        &mut self,
        tx: &mut Transaction<'_>,
        published: &PublishedPid,
    ) -> Result<Record, DepositError> {
        let ctx = tx.context();
        let (_, record) = self.fetch_published(ctx)?;
        if record.revision_id != published.revision_id {
            return Err(DepositError::StaleRevision(format!(
                "record {} is at revision {}, draft was derived from revision {}",
                record.id, record.revision_id, published.revision_id
            )));
        }
        let previous = Envelope::parse(record.json.clone())?;
        let listing: Vec<FileEntry> = serde_json::from_value(previous.files)?;
        let snapshot = match previous.bucket {
            Some(bucket) if self.lists_same_files(&listing) => Some(bucket),
            _ => self.snapshot(tx)?,
        };
        let document = self.record_document(ctx, snapshot)?;
        let committed = ctx
            .records()
            .commit(record.id, document, record.revision_id)?;
        tx.journal(Compensation::RollbackRecord {
            id: record.id,
            to: Some(record.revision_id),
        });
        Ok(committed)
    }

    /// Whether `listing` names exactly the current keys with the same content.
    fn lists_same_files(&self, listing: &[FileEntry]) -> bool {
        listing.len() == self.files.len()
            && listing.iter().all(|entry| {
                self.files
                    .get(&entry.key)
                    .is_some_and(|file| file.file_id == entry.file_id)
            })
    }

    /// The record body for the current state: record schema, same control
    /// block, file listing serialized against `snapshot`.
    fn record_document(
        &self,
        ctx: &DepositContext,
        snapshot: Option<BucketId>,
    ) -> Result<Value, DepositError> {
        let listing = match snapshot {
            Some(bucket) => self.serialize_files(ctx, Some(bucket))?,
            None => Vec::new(),
        };
        Envelope {
            schema: ctx.schemas().record_schema(&self.schema)?,
            control: self.control.clone(),
            bucket: snapshot,
            files: serde_json::to_value(listing)?,
            metadata: self.metadata.clone(),
        }
        .into_value()
    }

    /// Replace the draft with the content of `record` and commit it. The
    /// draft continues in a fresh working bucket seeded from the record's
    /// snapshot; the bucket it leaves behind is removed afterwards.
    fn reload_published(
        &mut self,
        ctx: &DepositContext,
        record: &Record,
        action: &'static str,
    ) -> Result<(), DepositError> {
        let published = Envelope::parse(record.json.clone())?;
        let listing: Vec<FileEntry> = serde_json::from_value(published.files)?;
        let keys: Vec<&str> = listing.iter().map(|entry| entry.key.as_str()).collect();
        let snapshot = published.bucket;

        let mut next = self.clone();
        next.schema = ctx.schemas().deposit_schema(&published.schema)?;
        next.metadata = published.metadata;
        next.control = published.control;
        next.control.status = DepositStatus::Draft;
        if let Some(pid) = next.control.pid.as_mut() {
            pid.revision_id = record.revision_id;
        }

        let retired = Transaction::run(ctx, action, |tx| {
            let retired = next.reseed_working_bucket(tx, snapshot, &keys)?;
            next.write(tx)?;
            Ok(retired)
        })?;
        *self = next;
        if let Some(bucket) = retired {
            self.remove_retired_bucket(ctx, bucket);
        }
        ctx.notify_committed(self);
        tracing::info!(
            deposit_id = %self.id(),
            revision_id = self.revision_id,
            record_revision = record.revision_id,
            action,
            "deposit reloaded from published record"
        );
        Ok(())
    }
}

fn metadata_object(fields: Value) -> Result<Map<String, Value>, DepositError> {
    let Value::Object(mut map) = fields else {
        return Err(DepositError::InvalidDocument(
            "metadata must be a JSON object".to_string(),
        ));
    };
    map.retain(|key, _| !is_control_key(key));
    Ok(map)
}

fn requested_owners(control: Option<&Value>) -> Result<BTreeSet<PrincipalId>, DepositError> {
    let Some(owners) = control.and_then(|c| c.get("owners")) else {
        return Ok(BTreeSet::new());
    };
    let Value::Array(owners) = owners else {
        return Err(DepositError::InvalidDocument(
            "_deposit.owners must be an array".to_string(),
        ));
    };
    owners
        .iter()
        .map(|owner| match owner {
            Value::String(s) => PrincipalId::new(s.as_str()),
            other => Err(DepositError::InvalidDocument(format!(
                "owner must be a string, got {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> DepositContext {
        DepositContext::default()
    }

    #[test]
    fn create_assigns_default_schema_and_registers_pid() {
        let ctx = ctx();
        let deposit = Deposit::create(&ctx, json!({"title": "t"}), None, None).unwrap();
        assert_eq!(deposit.status(), DepositStatus::Draft);
        assert_eq!(deposit.revision_id(), 0);
        assert_eq!(
            deposit.schema(),
            "http://localhost/schemas/deposits/deposit-v1.0.0.json"
        );
        let pid = ctx.pids().get("depid", &deposit.id().to_string()).unwrap();
        assert!(pid.is_registered());
        assert!(deposit.bucket().is_some());
        assert!(deposit.published_pid().is_none());
    }

    #[test]
    fn create_rejects_unknown_schema_and_non_objects() {
        let ctx = ctx();
        let err = Deposit::create(
            &ctx,
            json!({"$schema": "http://localhost/schemas/deposits/nope.json"}),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DepositError::SchemaNotFound(_)));
        assert!(matches!(
            Deposit::create(&ctx, json!("text"), None, None),
            Err(DepositError::InvalidDocument(_))
        ));
    }

    #[test]
    fn create_with_explicit_id_and_owners() {
        let ctx = ctx();
        let id = DepositId::new();
        let alice = PrincipalId::new("alice").unwrap();
        let deposit = Deposit::create(
            &ctx,
            json!({"_deposit": {"owners": ["bob"]}, "title": "t"}),
            Some(id),
            Some(&alice),
        )
        .unwrap();
        assert_eq!(deposit.id(), id);
        assert!(deposit.is_owned_by(&alice));
        assert!(deposit.is_owned_by(&PrincipalId::new("bob").unwrap()));
        assert!(Deposit::create(&ctx, json!({}), Some(id), None).is_err());
    }

    #[test]
    fn get_and_resolve_round_trip() {
        let ctx = ctx();
        let deposit = Deposit::create(&ctx, json!({"title": "t"}), None, None).unwrap();
        let loaded = Deposit::get(&ctx, deposit.id()).unwrap();
        assert_eq!(loaded, deposit);
        let resolved = Deposit::resolve(&ctx, &deposit.id().to_string()).unwrap();
        assert_eq!(resolved.id(), deposit.id());
        assert!(matches!(
            Deposit::get(&ctx, DepositId::new()),
            Err(DepositError::NotFound(_))
        ));
    }

    #[test]
    fn control_keys_cannot_be_set() {
        let ctx = ctx();
        let mut deposit = Deposit::create(&ctx, json!({}), None, None).unwrap();
        assert!(matches!(
            deposit.set("_deposit", json!({})),
            Err(DepositError::InvalidDocument(_))
        ));
        deposit
            .update(json!({"_files": [1], "title": "x"}))
            .unwrap();
        assert!(deposit.field("_files").is_none());
        assert_eq!(deposit.field("title"), Some(&json!("x")));
    }

    #[test]
    fn published_deposit_refuses_metadata_writes() {
        let ctx = ctx();
        let mut deposit = Deposit::create(&ctx, json!({"title": "t"}), None, None).unwrap();
        deposit.publish(&ctx).unwrap();
        assert!(matches!(
            deposit.set("title", json!("u")),
            Err(DepositError::InvalidAction { action: "update", .. })
        ));
        assert!(deposit.metadata_mut().is_err());
        assert!(deposit.clear().is_err());
        assert!(deposit.replace_metadata(json!({})).is_err());
        assert_eq!(deposit.field("title"), Some(&json!("t")));
    }

    #[test]
    fn edit_refuses_externally_modified_record() {
        let ctx = ctx();
        let mut deposit = Deposit::create(&ctx, json!({"title": "t"}), None, None).unwrap();
        deposit.publish(&ctx).unwrap();
        let (_, record) = deposit.fetch_published(&ctx).unwrap();
        let mut tampered = record.json.clone();
        tampered["_deposit"]["owners"] = json!(["mallory"]);
        ctx.records()
            .commit(record.id, tampered, record.revision_id)
            .unwrap();

        let before = deposit.revision_id();
        assert!(matches!(
            deposit.edit(&ctx),
            Err(DepositError::StaleRevision(_))
        ));
        assert_eq!(deposit.revision_id(), before);
        assert_eq!(deposit.status(), DepositStatus::Published);
    }

    #[test]
    fn republish_refuses_moved_record() {
        let ctx = ctx();
        let mut deposit = Deposit::create(&ctx, json!({"title": "t"}), None, None).unwrap();
        deposit.publish(&ctx).unwrap();
        deposit.edit(&ctx).unwrap();
        let (_, record) = deposit.fetch_published(&ctx).unwrap();
        ctx.records()
            .commit(record.id, record.json.clone(), record.revision_id)
            .unwrap();

        assert!(matches!(
            deposit.publish(&ctx),
            Err(DepositError::StaleRevision(_))
        ));
        assert_eq!(deposit.status(), DepositStatus::Draft);
        let stored = Deposit::get(&ctx, deposit.id()).unwrap();
        assert_eq!(stored.revision_id(), deposit.revision_id());
    }

    #[test]
    fn edit_requires_registered_record_pid() {
        let ctx = ctx();
        let mut deposit = Deposit::create(&ctx, json!({}), None, None).unwrap();
        deposit.publish(&ctx).unwrap();
        let pid = deposit.published_pid().unwrap().clone();
        ctx.pids().delete(&pid.pid_type, &pid.value).unwrap();
        assert!(matches!(
            deposit.edit(&ctx),
            Err(DepositError::InvalidAction { action: "edit", .. })
        ));
    }

    #[test]
    fn record_carries_record_schema() {
        let ctx = ctx();
        let mut deposit = Deposit::create(&ctx, json!({"title": "t"}), None, None).unwrap();
        deposit.publish(&ctx).unwrap();
        let (pid, record) = deposit.fetch_published(&ctx).unwrap();
        assert_eq!(pid.pid_type, "recid");
        assert_eq!(
            record.json["$schema"],
            "http://localhost/schemas/deposit-v1.0.0.json"
        );
        assert_eq!(record.json["title"], "t");
        assert_eq!(record.json["_deposit"]["status"], "published");
    }
}
