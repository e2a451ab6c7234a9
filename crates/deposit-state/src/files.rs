//! # File Ordering
//!
//! A deposit keeps an ordered list of [`FileRef`]s pointing into its working
//! bucket. Keys are unique and the order is significant: it is what a
//! published record lists. File bytes live in the bucket store only.
//!
//! Every successful mutation commits the deposit. Mutations are refused
//! while the deposit is published. Publishing locks the working bucket;
//! `edit` and `discard` move the draft to a fresh unlocked bucket seeded
//! from the record's snapshot, so published snapshots never change.

use serde::{Deserialize, Serialize};

use deposit_core::{BucketId, Checksum, DepositError, FileId, ObjectVersionId, StoreError};
use deposit_store::{BucketOptions, ObjectVersion};

use crate::context::DepositContext;
use crate::deposit::Deposit;
use crate::status::DepositStatus;
use crate::transaction::{Compensation, Transaction};

/// Pointer from a file key to an object version in the working bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub key: String,
    pub version_id: ObjectVersionId,
    pub file_id: FileId,
}

impl FileRef {
    fn from_version(version: &ObjectVersion) -> Result<Self, DepositError> {
        let file = version
            .file
            .as_ref()
            .ok_or_else(|| DepositError::KeyNotFound(version.key.clone()))?;
        Ok(Self {
            key: version.key.clone(),
            version_id: version.version_id,
            file_id: file.id,
        })
    }
}

/// One element of a serialized file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub key: String,
    pub checksum: Checksum,
    pub size: u64,
    pub bucket: BucketId,
    pub version_id: ObjectVersionId,
    pub file_id: FileId,
}

impl FileEntry {
    /// Listing entry for a live object version.
    pub fn from_version(version: &ObjectVersion) -> Result<Self, DepositError> {
        let file = version
            .file
            .as_ref()
            .ok_or_else(|| DepositError::KeyNotFound(version.key.clone()))?;
        Ok(Self {
            key: version.key.clone(),
            checksum: file.checksum.clone(),
            size: file.size,
            bucket: version.bucket_id,
            version_id: version.version_id,
            file_id: file.id,
        })
    }
}

/// Ordered, key-unique list of [`FileRef`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileOrder(Vec<FileRef>);

impl FileOrder {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRef> {
        self.0.iter()
    }

    /// Keys in order.
    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&FileRef> {
        self.0.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|f| f.key == key)
    }

    /// Replace the entry with the same key in place, or append.
    fn upsert(&mut self, file: FileRef) {
        match self.position(&file.key) {
            Some(index) => self.0[index] = file,
            None => self.0.push(file),
        }
    }

    fn remove(&mut self, key: &str) -> Option<FileRef> {
        self.position(key).map(|index| self.0.remove(index))
    }

    fn replace(&mut self, old_key: &str, file: FileRef) -> Result<(), DepositError> {
        let index = self
            .position(old_key)
            .ok_or_else(|| DepositError::KeyNotFound(old_key.to_string()))?;
        self.0[index] = file;
        Ok(())
    }

    /// Reorder by `ids`, each naming an entry by key or by version id.
    ///
    /// `ids` must name every entry exactly once. Anything else fails with
    /// [`DepositError::InvalidOrder`] and leaves the order untouched.
    pub fn reorder<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<(), DepositError> {
        if ids.len() != self.0.len() {
            return Err(DepositError::InvalidOrder(format!(
                "expected {} ids, got {}",
                self.0.len(),
                ids.len()
            )));
        }
        let mut taken = vec![false; self.0.len()];
        let mut order = Vec::with_capacity(self.0.len());
        for id in ids {
            let id = id.as_ref();
            let index = self
                .0
                .iter()
                .position(|f| f.key == id || f.version_id.to_string() == id)
                .ok_or_else(|| DepositError::InvalidOrder(format!("unknown file id {id}")))?;
            if std::mem::replace(&mut taken[index], true) {
                return Err(DepositError::InvalidOrder(format!("duplicate file id {id}")));
            }
            order.push(self.0[index].clone());
        }
        self.0 = order;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FileOrder {
    type Item = &'a FileRef;
    type IntoIter = std::slice::Iter<'a, FileRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn missing_key(err: StoreError, key: &str) -> DepositError {
    match err {
        StoreError::NotFound { .. } => DepositError::KeyNotFound(key.to_string()),
        other => other.into(),
    }
}

impl Deposit {
    /// The file ref for `key`.
    pub fn file(&self, key: &str) -> Result<&FileRef, DepositError> {
        self.files
            .get(key)
            .ok_or_else(|| DepositError::KeyNotFound(key.to_string()))
    }

    /// Bytes of the file under `key`.
    pub fn open_file(&self, ctx: &DepositContext, key: &str) -> Result<Vec<u8>, DepositError> {
        let file = self.file(key)?;
        ctx.files()
            .read(file.file_id)
            .map_err(|e| missing_key(e, key))
    }

    /// Listing entry for one file in the working bucket.
    pub fn describe_file(&self, ctx: &DepositContext, key: &str) -> Result<FileEntry, DepositError> {
        let file = self.file(key)?;
        let version = ctx
            .files()
            .get(self.working_bucket()?, key, Some(file.version_id))
            .map_err(|e| missing_key(e, key))?;
        FileEntry::from_version(&version)
    }

    /// The file listing in deposit order. With `bucket` set, every key is
    /// looked up by its head version in that bucket instead, which is how a
    /// record lists its snapshot.
    pub fn serialize_files(
        &self,
        ctx: &DepositContext,
        bucket: Option<BucketId>,
    ) -> Result<Vec<FileEntry>, DepositError> {
        let working = self.working_bucket()?;
        self.files
            .iter()
            .map(|file| {
                let version = match bucket {
                    Some(bucket) => ctx.files().get(bucket, &file.key, None),
                    None => ctx.files().get(working, &file.key, Some(file.version_id)),
                }
                .map_err(|e| missing_key(e, &file.key))?;
                FileEntry::from_version(&version)
            })
            .collect()
    }

    /// Store `data` under `key`. A new key is appended; an existing key
    /// gets a new version and keeps its position.
    pub fn assign_file(
        &mut self,
        ctx: &DepositContext,
        key: &str,
        data: &[u8],
    ) -> Result<FileRef, DepositError> {
        self.require_status(DepositStatus::Draft, "assign")?;
        if key.is_empty() {
            return Err(DepositError::InvalidDocument("file key is empty".to_string()));
        }
        let bucket = self.working_bucket()?;
        let previous = self.files.get(key).map(|f| f.file_id);

        let mut next = self.clone();
        let file = Transaction::run(ctx, "assign", |tx| {
            let version = ctx.files().put(bucket, key, data)?;
            tx.journal(Compensation::RestoreObject {
                bucket,
                key: key.to_string(),
                previous,
            });
            let file = FileRef::from_version(&version)?;
            next.files.upsert(file.clone());
            next.write(tx)?;
            Ok(file)
        })?;
        self.finish_file_op(ctx, next, "assign", key);
        Ok(file)
    }

    /// Delete the head version of `key` and drop its ref.
    pub fn remove_file(&mut self, ctx: &DepositContext, key: &str) -> Result<FileRef, DepositError> {
        self.require_status(DepositStatus::Draft, "remove")?;
        let file = self.file(key)?.clone();
        let bucket = self.working_bucket()?;

        let mut next = self.clone();
        Transaction::run(ctx, "remove", |tx| {
            if ctx.files().delete(bucket, key)?.is_some() {
                tx.journal(Compensation::RestoreObject {
                    bucket,
                    key: key.to_string(),
                    previous: Some(file.file_id),
                });
            }
            next.files.remove(key);
            next.write(tx)
        })?;
        self.finish_file_op(ctx, next, "remove", key);
        Ok(file)
    }

    /// Move `old` to `new` without copying content. The file keeps its
    /// position and gets a new version id.
    pub fn rename_file(
        &mut self,
        ctx: &DepositContext,
        old: &str,
        new: &str,
    ) -> Result<FileRef, DepositError> {
        self.require_status(DepositStatus::Draft, "rename")?;
        let file = self.file(old)?.clone();
        if self.files.contains(new) {
            return Err(DepositError::AlreadyExists(new.to_string()));
        }
        if new.is_empty() {
            return Err(DepositError::InvalidDocument("file key is empty".to_string()));
        }
        let bucket = self.working_bucket()?;

        let mut next = self.clone();
        let renamed = Transaction::run(ctx, "rename", |tx| {
            let version = ctx.files().link(bucket, new, file.file_id)?;
            tx.journal(Compensation::RestoreObject {
                bucket,
                key: new.to_string(),
                previous: None,
            });
            ctx.files().delete(bucket, old)?;
            tx.journal(Compensation::RestoreObject {
                bucket,
                key: old.to_string(),
                previous: Some(file.file_id),
            });
            let renamed = FileRef::from_version(&version)?;
            next.files.replace(old, renamed.clone())?;
            next.write(tx)?;
            Ok(renamed)
        })?;
        self.finish_file_op(ctx, next, "rename", new);
        Ok(renamed)
    }

    /// Reorder files by key or version id. See [`FileOrder::reorder`].
    pub fn reorder_files<S: AsRef<str>>(
        &mut self,
        ctx: &DepositContext,
        ids: &[S],
    ) -> Result<(), DepositError> {
        self.require_status(DepositStatus::Draft, "reorder")?;
        let mut next = self.clone();
        next.files.reorder(ids)?;
        Transaction::run(ctx, "reorder", |tx| next.write(tx))?;
        self.finish_file_op(ctx, next, "reorder", "*");
        Ok(())
    }

    /// Move the draft to a new unlocked working bucket holding the heads of
    /// `snapshot` (an empty one for `None`), with refs rebuilt in `keys`
    /// order. Returns the bucket the draft used before.
    pub(crate) fn reseed_working_bucket(
        &mut self,
        tx: &mut Transaction<'_>,
        snapshot: Option<BucketId>,
        keys: &[&str],
    ) -> Result<Option<BucketId>, DepositError> {
        let ctx = tx.context();
        let bucket = match snapshot {
            Some(source) => ctx.files().snapshot(source, false)?,
            None => ctx.files().create_bucket(BucketOptions {
                storage_class: ctx.config().default_storage_class.clone(),
            })?,
        };
        tx.journal(Compensation::RemoveBucket(bucket.id));
        let refs = keys
            .iter()
            .map(|key| {
                let version = ctx
                    .files()
                    .get(bucket.id, key, None)
                    .map_err(|e| missing_key(e, key))?;
                FileRef::from_version(&version)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.files = FileOrder(refs);
        Ok(self.bucket.replace(bucket.id))
    }

    fn finish_file_op(&mut self, ctx: &DepositContext, next: Deposit, action: &str, key: &str) {
        *self = next;
        ctx.notify_committed(self);
        tracing::debug!(
            deposit_id = %self.id(),
            revision_id = self.revision_id,
            action,
            key,
            "file operation committed"
        );
    }
}
