//! # deposit-store — Storage Adapters
//!
//! The deposit lifecycle is written against four collaborator contracts.
//! Each is a trait at the seam plus a thread-safe in-memory implementation:
//!
//! | Trait            | In-memory impl          | Concern                                   |
//! |------------------|-------------------------|-------------------------------------------|
//! | [`RecordStore`]  | [`InMemoryRecordStore`] | immutable, monotonically versioned JSON   |
//! | [`PidRegistry`]  | [`InMemoryPidRegistry`] | PID minting, resolution, status           |
//! | [`FileStore`]    | [`InMemoryFileStore`]   | versioned objects, locks, snapshots       |
//! | [`SearchIndex`]  | [`InMemoryIndex`]       | best-effort search notifications          |
//!
//! All adapters are synchronous. Locks are `parking_lot` and are never held
//! across `.await` points by callers.

pub mod bucket;
pub mod index;
pub mod memory;
pub mod pid;
pub mod record;

pub use bucket::{Bucket, BucketOptions, FileInstance, FileStore, InMemoryFileStore, ObjectVersion};
pub use index::{InMemoryIndex, IndexError, SearchIndex};
pub use memory::Store;
pub use pid::{InMemoryPidRegistry, PidRegistry};
pub use record::{InMemoryRecordStore, Record, RecordStore};
