//! Collaborators and configuration passed explicitly to every lifecycle
//! operation.

use std::sync::Arc;

use deposit_core::{DepositConfig, DepositId, SchemaResolver};
use deposit_store::{
    FileStore, InMemoryFileStore, InMemoryIndex, InMemoryPidRegistry, InMemoryRecordStore,
    PidRegistry, Record, RecordStore, SearchIndex,
};

use crate::deposit::Deposit;
use crate::hooks::{DepositObserver, IndexingObserver};

/// Everything a deposit operation needs besides the deposit itself.
///
/// Cheap to clone: adapters and observers are shared behind `Arc`.
#[derive(Clone)]
pub struct DepositContext {
    records: Arc<dyn RecordStore>,
    pids: Arc<dyn PidRegistry>,
    files: Arc<dyn FileStore>,
    config: DepositConfig,
    schemas: SchemaResolver,
    observers: Vec<Arc<dyn DepositObserver>>,
}

impl DepositContext {
    /// Wire the adapters together. An [`IndexingObserver`] for `index` is
    /// installed first.
    pub fn new(
        records: Arc<dyn RecordStore>,
        pids: Arc<dyn PidRegistry>,
        files: Arc<dyn FileStore>,
        index: Arc<dyn SearchIndex>,
        config: DepositConfig,
    ) -> Self {
        let schemas = SchemaResolver::from_config(&config);
        Self {
            records,
            pids,
            files,
            config,
            schemas,
            observers: vec![Arc::new(IndexingObserver::new(index))],
        }
    }

    /// In-memory adapters with the given configuration.
    pub fn in_memory(config: DepositConfig) -> Self {
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryPidRegistry::new()),
            Arc::new(InMemoryFileStore::new()),
            Arc::new(InMemoryIndex::new()),
            config,
        )
    }

    /// In-memory adapters, default configuration, caller-held index.
    pub fn in_memory_with_index(index: Arc<InMemoryIndex>) -> Self {
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryPidRegistry::new()),
            Arc::new(InMemoryFileStore::new()),
            index,
            DepositConfig::default(),
        )
    }

    /// Append an observer.
    pub fn with_observer(mut self, observer: Arc<dyn DepositObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    pub fn pids(&self) -> &dyn PidRegistry {
        self.pids.as_ref()
    }

    pub fn files(&self) -> &dyn FileStore {
        self.files.as_ref()
    }

    pub fn config(&self) -> &DepositConfig {
        &self.config
    }

    pub fn schemas(&self) -> &SchemaResolver {
        &self.schemas
    }

    pub fn observers(&self) -> &[Arc<dyn DepositObserver>] {
        &self.observers
    }

    pub(crate) fn notify_committed(&self, deposit: &Deposit) {
        for observer in &self.observers {
            if let Err(e) = observer.after_commit(deposit) {
                tracing::warn!(deposit_id = %deposit.id(), error = %e, "after_commit observer failed");
            }
        }
    }

    pub(crate) fn notify_published(&self, deposit: &Deposit, record: &Record) {
        for observer in &self.observers {
            if let Err(e) = observer.after_publish(deposit, record) {
                tracing::warn!(
                    deposit_id = %deposit.id(),
                    record_id = %record.id,
                    error = %e,
                    "after_publish observer failed"
                );
            }
        }
    }

    pub(crate) fn notify_deleted(&self, id: DepositId) {
        for observer in &self.observers {
            if let Err(e) = observer.after_delete(id) {
                tracing::warn!(deposit_id = %id, error = %e, "after_delete observer failed");
            }
        }
    }
}

impl Default for DepositContext {
    fn default() -> Self {
        Self::in_memory(DepositConfig::default())
    }
}

impl std::fmt::Debug for DepositContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositContext")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
