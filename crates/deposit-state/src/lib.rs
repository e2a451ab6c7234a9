//! # deposit-state — Deposit Lifecycle State Machine
//!
//! Implements the draft/published protocol of deposits on top of the
//! storage adapters in `deposit-store`.
//!
//! ## Modules
//!
//! - **Deposit** (`deposit.rs`): create, publish, edit, discard, delete and
//!   commit, guarded metadata accessors, loading by id or PID.
//!
//! - **Files** (`files.rs`): ordered file refs with assign, remove, rename
//!   and reorder, plus listing serialization against a snapshot bucket.
//!
//! - **Actions** (`actions.rs`): name → operation dispatch by PID value.
//!
//! - **Transaction** (`transaction.rs`): compensation journal replayed in
//!   reverse when an operation fails half way.
//!
//! - **Hooks** (`hooks.rs`): observers around persistence, including the
//!   search indexer.
//!
//! ## Design
//!
//! Status is a runtime enum rather than a typestate: a deposit is loaded
//! from storage without knowing its status, and every operation checks its
//! guard before writing anything. Operations work on a copy of the deposit
//! and only replace `self` once every write succeeded, so a failed call
//! leaves the in-memory value and the stores as they were.

pub mod actions;
pub mod context;
pub mod deposit;
pub mod document;
pub mod files;
pub mod hooks;
pub mod status;
pub mod transaction;

pub use actions::{dispatch, execute, ActionOutcome, DepositAction};
pub use context::DepositContext;
pub use deposit::Deposit;
pub use document::{is_control_key, Envelope, CONTROL_KEYS};
pub use files::{FileEntry, FileOrder, FileRef};
pub use hooks::{DepositObserver, IndexingObserver, ObserverError};
pub use status::{DepositControl, DepositStatus};
pub use transaction::{Compensation, Transaction};
