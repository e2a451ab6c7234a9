//! # File Buckets
//!
//! A bucket is a versioned container of objects. Writing a key never
//! overwrites: it appends a new [`ObjectVersion`] and moves the head. File
//! content is stored once per upload and identified by [`FileId`]; object
//! versions link file content, so snapshots and renames are zero-copy.
//!
//! ## Locking
//!
//! A locked bucket refuses every write with [`StoreError::BucketLocked`].
//! Snapshots are taken from the current heads of a bucket and are created
//! locked when requested.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use deposit_core::{sha256_checksum, BucketId, Checksum, FileId, ObjectVersionId, StoreError};

use crate::memory::Store;

/// Options for creating a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketOptions {
    /// Storage class tag recorded on the bucket.
    pub storage_class: String,
}

impl Default for BucketOptions {
    fn default() -> Self {
        Self {
            storage_class: "S".to_string(),
        }
    }
}

/// Bucket metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket identifier.
    pub id: BucketId,
    /// Storage class tag.
    pub storage_class: String,
    /// Whether writes are refused.
    pub locked: bool,
    /// Source bucket when this bucket is a snapshot.
    pub snapshot_of: Option<BucketId>,
    /// When the bucket was created.
    pub created_at: DateTime<Utc>,
}

/// Stored file content descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInstance {
    /// Content identity.
    pub id: FileId,
    /// SHA-256 checksum of the content.
    pub checksum: Checksum,
    /// Size in bytes.
    pub size: u64,
}

/// One version of one key in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectVersion {
    /// Bucket holding the version.
    pub bucket_id: BucketId,
    /// Object key.
    pub key: String,
    /// Version identifier.
    pub version_id: ObjectVersionId,
    /// Linked content; `None` for a delete marker.
    pub file: Option<FileInstance>,
    /// Whether this is the current version of the key.
    pub is_head: bool,
    /// When the version was written.
    pub created_at: DateTime<Utc>,
}

impl ObjectVersion {
    /// Whether this version is a delete marker.
    pub fn is_delete_marker(&self) -> bool {
        self.file.is_none()
    }
}

/// Binary object storage with versioning and snapshots.
pub trait FileStore: Send + Sync {
    /// Create an empty, unlocked bucket.
    fn create_bucket(&self, options: BucketOptions) -> Result<Bucket, StoreError>;

    /// Fetch bucket metadata.
    fn bucket(&self, bucket: BucketId) -> Result<Bucket, StoreError>;

    /// Store `data` as a new version of `key`.
    fn put(&self, bucket: BucketId, key: &str, data: &[u8]) -> Result<ObjectVersion, StoreError>;

    /// Create a new version of `key` linking existing content without copying.
    fn link(&self, bucket: BucketId, key: &str, file: FileId) -> Result<ObjectVersion, StoreError>;

    /// Fetch the head of `key`, or a specific version of it.
    fn get(
        &self,
        bucket: BucketId,
        key: &str,
        version: Option<ObjectVersionId>,
    ) -> Result<ObjectVersion, StoreError>;

    /// Delete `key` by writing a delete marker. Returns the version that was
    /// the head, or `None` if the key had no live version.
    fn delete(&self, bucket: BucketId, key: &str) -> Result<Option<ObjectVersion>, StoreError>;

    /// Live head versions, sorted by key.
    fn list(&self, bucket: BucketId) -> Result<Vec<ObjectVersion>, StoreError>;

    /// Refuse further writes to `bucket`.
    fn lock(&self, bucket: BucketId) -> Result<Bucket, StoreError>;

    /// Lift a lock. Used to undo a lock inside a failed transaction.
    fn unlock(&self, bucket: BucketId) -> Result<Bucket, StoreError>;

    /// Copy the live heads of `bucket` into a new bucket, linking the same
    /// content. The new bucket is locked when `lock` is set.
    fn snapshot(&self, bucket: BucketId, lock: bool) -> Result<Bucket, StoreError>;

    /// Read file content.
    fn read(&self, file: FileId) -> Result<Vec<u8>, StoreError>;

    /// Drop a bucket and its versions. Content stays readable.
    fn remove_bucket(&self, bucket: BucketId) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct BucketState {
    bucket: Bucket,
    versions: Vec<ObjectVersion>,
}

impl BucketState {
    fn head(&self, key: &str) -> Option<&ObjectVersion> {
        self.versions.iter().find(|v| v.is_head && v.key == key)
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if self.bucket.locked {
            return Err(StoreError::BucketLocked(self.bucket.id));
        }
        Ok(())
    }

    fn push_head(&mut self, key: &str, file: Option<FileInstance>) -> ObjectVersion {
        for v in self.versions.iter_mut().filter(|v| v.key == key) {
            v.is_head = false;
        }
        let version = ObjectVersion {
            bucket_id: self.bucket.id,
            key: key.to_string(),
            version_id: ObjectVersionId::new(),
            file,
            is_head: true,
            created_at: Utc::now(),
        };
        self.versions.push(version.clone());
        version
    }
}

#[derive(Debug, Clone)]
struct Blob {
    instance: FileInstance,
    data: Arc<Vec<u8>>,
}

/// In-memory [`FileStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileStore {
    buckets: Store<BucketId, BucketState>,
    blobs: Store<FileId, Blob>,
}

impl InMemoryFileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buckets, snapshots included.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn missing_bucket(bucket: BucketId) -> StoreError {
        StoreError::not_found("bucket", bucket)
    }

    fn instance(&self, file: FileId) -> Result<FileInstance, StoreError> {
        self.blobs
            .read(&file, |blob| blob.instance.clone())
            .ok_or_else(|| StoreError::not_found("file", file))
    }

    fn write_head(
        &self,
        bucket: BucketId,
        key: &str,
        file: FileInstance,
    ) -> Result<ObjectVersion, StoreError> {
        self.buckets
            .try_update(&bucket, |state| {
                state.ensure_writable()?;
                Ok(state.push_head(key, Some(file)))
            })
            .ok_or_else(|| Self::missing_bucket(bucket))?
    }

    fn set_locked(&self, bucket: BucketId, locked: bool) -> Result<Bucket, StoreError> {
        self.buckets
            .try_update(&bucket, |state| {
                state.bucket.locked = locked;
                Ok(state.bucket.clone())
            })
            .ok_or_else(|| Self::missing_bucket(bucket))?
    }
}

impl FileStore for InMemoryFileStore {
    fn create_bucket(&self, options: BucketOptions) -> Result<Bucket, StoreError> {
        let bucket = Bucket {
            id: BucketId::new(),
            storage_class: options.storage_class,
            locked: false,
            snapshot_of: None,
            created_at: Utc::now(),
        };
        self.buckets.insert(
            bucket.id,
            BucketState {
                bucket: bucket.clone(),
                versions: Vec::new(),
            },
        );
        Ok(bucket)
    }

    fn bucket(&self, bucket: BucketId) -> Result<Bucket, StoreError> {
        self.buckets
            .read(&bucket, |state| state.bucket.clone())
            .ok_or_else(|| Self::missing_bucket(bucket))
    }

    fn put(&self, bucket: BucketId, key: &str, data: &[u8]) -> Result<ObjectVersion, StoreError> {
        // Refuse before storing content so a locked bucket leaves no orphan blob.
        let writable = self
            .buckets
            .read(&bucket, |state| state.ensure_writable())
            .ok_or_else(|| Self::missing_bucket(bucket))?;
        writable?;

        let instance = FileInstance {
            id: FileId::new(),
            checksum: sha256_checksum(data),
            size: data.len() as u64,
        };
        self.blobs.insert(
            instance.id,
            Blob {
                instance: instance.clone(),
                data: Arc::new(data.to_vec()),
            },
        );
        self.write_head(bucket, key, instance)
    }

    fn link(&self, bucket: BucketId, key: &str, file: FileId) -> Result<ObjectVersion, StoreError> {
        let instance = self.instance(file)?;
        self.write_head(bucket, key, instance)
    }

    fn get(
        &self,
        bucket: BucketId,
        key: &str,
        version: Option<ObjectVersionId>,
    ) -> Result<ObjectVersion, StoreError> {
        let found = self
            .buckets
            .read(&bucket, |state| match version {
                Some(version_id) => state
                    .versions
                    .iter()
                    .find(|v| v.key == key && v.version_id == version_id)
                    .cloned(),
                None => state.head(key).cloned(),
            })
            .ok_or_else(|| Self::missing_bucket(bucket))?;
        match found {
            Some(v) if !v.is_delete_marker() => Ok(v),
            _ => Err(StoreError::not_found("object", format!("{bucket}/{key}"))),
        }
    }

    fn delete(&self, bucket: BucketId, key: &str) -> Result<Option<ObjectVersion>, StoreError> {
        self.buckets
            .try_update(&bucket, |state| {
                state.ensure_writable()?;
                let previous = match state.head(key) {
                    Some(v) if !v.is_delete_marker() => v.clone(),
                    _ => return Ok(None),
                };
                state.push_head(key, None);
                Ok(Some(previous))
            })
            .ok_or_else(|| Self::missing_bucket(bucket))?
    }

    fn list(&self, bucket: BucketId) -> Result<Vec<ObjectVersion>, StoreError> {
        let mut heads = self
            .buckets
            .read(&bucket, |state| {
                state
                    .versions
                    .iter()
                    .filter(|v| v.is_head && !v.is_delete_marker())
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .ok_or_else(|| Self::missing_bucket(bucket))?;
        heads.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(heads)
    }

    fn lock(&self, bucket: BucketId) -> Result<Bucket, StoreError> {
        self.set_locked(bucket, true)
    }

    fn unlock(&self, bucket: BucketId) -> Result<Bucket, StoreError> {
        self.set_locked(bucket, false)
    }

    fn snapshot(&self, bucket: BucketId, lock: bool) -> Result<Bucket, StoreError> {
        let source = self
            .buckets
            .get(&bucket)
            .ok_or_else(|| Self::missing_bucket(bucket))?;
        let snapshot = Bucket {
            id: BucketId::new(),
            storage_class: source.bucket.storage_class.clone(),
            locked: lock,
            snapshot_of: Some(bucket),
            created_at: Utc::now(),
        };
        let mut state = BucketState {
            bucket: snapshot.clone(),
            versions: Vec::new(),
        };
        for head in source
            .versions
            .iter()
            .filter(|v| v.is_head && !v.is_delete_marker())
        {
            state.push_head(&head.key, head.file.clone());
        }
        self.buckets.insert(snapshot.id, state);
        tracing::debug!(source = %bucket, snapshot = %snapshot.id, locked = lock, "bucket snapshot");
        Ok(snapshot)
    }

    fn read(&self, file: FileId) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .read(&file, |blob| blob.data.as_ref().clone())
            .ok_or_else(|| StoreError::not_found("file", file))
    }

    fn remove_bucket(&self, bucket: BucketId) -> Result<(), StoreError> {
        self.buckets
            .remove(&bucket)
            .map(|_| ())
            .ok_or_else(|| Self::missing_bucket(bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_bucket() -> (InMemoryFileStore, BucketId) {
        let store = InMemoryFileStore::new();
        let bucket = store.create_bucket(BucketOptions::default()).unwrap();
        (store, bucket.id)
    }

    #[test]
    fn put_same_key_creates_new_version() {
        let (store, bucket) = store_with_bucket();
        let v0 = store.put(bucket, "hello.txt", b"Hello world!").unwrap();
        let v1 = store.put(bucket, "hello.txt", b"Hola mundo!").unwrap();
        assert_ne!(v0.version_id, v1.version_id);
        assert_eq!(store.list(bucket).unwrap().len(), 1);
        let head = store.get(bucket, "hello.txt", None).unwrap();
        assert_eq!(head.version_id, v1.version_id);
        let old = store.get(bucket, "hello.txt", Some(v0.version_id)).unwrap();
        assert!(!old.is_head);
    }

    #[test]
    fn delete_writes_marker_and_reports_previous_head() {
        let (store, bucket) = store_with_bucket();
        let v0 = store.put(bucket, "a", b"1").unwrap();
        let removed = store.delete(bucket, "a").unwrap().unwrap();
        assert_eq!(removed.version_id, v0.version_id);
        assert!(store.get(bucket, "a", None).is_err());
        assert!(store.delete(bucket, "a").unwrap().is_none());
        assert!(store.list(bucket).unwrap().is_empty());
    }

    #[test]
    fn link_shares_content_without_copy() {
        let (store, bucket) = store_with_bucket();
        let v0 = store.put(bucket, "a", b"payload").unwrap();
        let file = v0.file.clone().unwrap();
        let v1 = store.link(bucket, "b", file.id).unwrap();
        assert_ne!(v0.version_id, v1.version_id);
        assert_eq!(v1.file.unwrap().id, file.id);
        assert_eq!(store.read(file.id).unwrap(), b"payload");
    }

    #[test]
    fn locked_bucket_refuses_writes() {
        let (store, bucket) = store_with_bucket();
        let v0 = store.put(bucket, "a", b"1").unwrap();
        store.lock(bucket).unwrap();
        assert_eq!(
            store.put(bucket, "b", b"2").unwrap_err(),
            StoreError::BucketLocked(bucket)
        );
        assert!(store.delete(bucket, "a").is_err());
        assert!(store.link(bucket, "c", v0.file.unwrap().id).is_err());
        store.unlock(bucket).unwrap();
        assert!(store.put(bucket, "b", b"2").is_ok());
    }

    #[test]
    fn snapshot_copies_heads_and_locks_itself() {
        let (store, bucket) = store_with_bucket();
        store.put(bucket, "a", b"1").unwrap();
        store.put(bucket, "b", b"2").unwrap();
        store.delete(bucket, "b").unwrap();
        let snap = store.snapshot(bucket, true).unwrap();
        assert!(snap.locked);
        assert_eq!(snap.snapshot_of, Some(bucket));
        let listed = store.list(snap.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "a");
        let original = store.get(bucket, "a", None).unwrap();
        assert_eq!(listed[0].file, original.file);
        assert_ne!(listed[0].version_id, original.version_id);
        assert!(store.put(snap.id, "c", b"3").is_err());
    }
}
