//! Search index notifications.
//!
//! Indexing is best-effort: callers log failures and carry on.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::memory::Store;

/// Failure reported by a search index backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The backend could not be reached.
    #[error("search index unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the document.
    #[error("document {id} rejected: {reason}")]
    Rejected { id: Uuid, reason: String },
}

/// Receives document changes for search.
pub trait SearchIndex: Send + Sync {
    /// Index or re-index a document.
    fn upsert(&self, id: Uuid, document: &Value) -> Result<(), IndexError>;

    /// Drop a document from the index. Missing documents are not an error.
    fn delete(&self, id: Uuid) -> Result<(), IndexError>;
}

/// In-memory [`SearchIndex`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    documents: Store<Uuid, Value>,
}

impl InMemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The indexed copy of a document.
    pub fn get(&self, id: Uuid) -> Option<Value> {
        self.documents.get(&id)
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl SearchIndex for InMemoryIndex {
    fn upsert(&self, id: Uuid, document: &Value) -> Result<(), IndexError> {
        self.documents.insert(id, document.clone());
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<(), IndexError> {
        self.documents.remove(&id);
        Ok(())
    }
}
