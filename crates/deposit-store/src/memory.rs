//! # Generic In-Memory Store
//!
//! Thread-safe, cloneable key-value map shared by the in-memory adapters.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because callers never hold the lock across `.await`
/// points. `parking_lot::RwLock` is non-poisonable.
#[derive(Debug)]
pub struct Store<K, V> {
    data: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Store<K, V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a value, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.data.write().insert(key, value)
    }

    /// Insert only if the key is vacant. Returns `false` when occupied.
    pub fn insert_new(&self, key: K, value: V) -> bool {
        let mut guard = self.data.write();
        if guard.contains_key(&key) {
            return false;
        }
        guard.insert(key, value);
        true
    }

    /// Retrieve a value by key.
    pub fn get(&self, key: &K) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    /// Read a value through a closure without cloning it.
    pub fn read<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.data.read().get(key).map(f)
    }

    /// List all values.
    pub fn list(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a value.
    ///
    /// The closure runs under a single write lock, so inspection and
    /// mutation cannot interleave with another writer. Returns `None` if
    /// the key does not exist.
    pub fn try_update<R, E>(
        &self,
        key: &K,
        f: impl FnOnce(&mut V) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(key).map(f)
    }

    /// Remove a value by key.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.data.write().remove(key)
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    /// Return the number of entries.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for Store<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_new_refuses_occupied_keys() {
        let store: Store<u32, &str> = Store::new();
        assert!(store.insert_new(1, "a"));
        assert!(!store.insert_new(1, "b"));
        assert_eq!(store.get(&1), Some("a"));
    }

    #[test]
    fn clones_share_data() {
        let store: Store<u32, u32> = Store::new();
        let other = store.clone();
        other.insert(7, 49);
        assert_eq!(store.get(&7), Some(49));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn try_update_reports_missing_and_closure_errors() {
        let store: Store<u32, u32> = Store::new();
        assert!(store.try_update(&1, |_| Ok::<_, ()>(())).is_none());
        store.insert(1, 10);
        let res = store.try_update(&1, |v| if *v > 5 { Err("too big") } else { Ok(()) });
        assert_eq!(res, Some(Err("too big")));
        let res = store.try_update(&1, |v| {
            *v += 1;
            Ok::<_, ()>(*v)
        });
        assert_eq!(res, Some(Ok(11)));
    }
}
