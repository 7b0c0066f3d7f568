//! In-memory storage for tests and embedding.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Storage, StorageEntry};

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Store was switched to unavailable.
    #[error("in-memory storage unavailable")]
    Unavailable,
}

/// In-memory key-value store.
///
/// Uses a BTreeMap so listing is ordered by key.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    unavailable: AtomicBool,
}

impl InMemoryStorage {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `InMemoryError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Raw value for a key, bypassing the async interface.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().get(key).cloned()
    }

    fn check(&self) -> Result<(), InMemoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(InMemoryError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    type Error = InMemoryError;

    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, Self::Error> {
        self.check()?;
        Ok(self
            .entries
            .read()
            .get(key)
            .map(|value| StorageEntry::new(key, value.clone())))
    }

    async fn put(&self, entry: StorageEntry) -> Result<(), Self::Error> {
        self.check()?;
        self.entries.write().insert(entry.key, entry.value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.check()?;
        self.entries.write().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, Self::Error> {
        self.check()?;
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryStorage::new();
        store
            .put(StorageEntry::new("user/alice", b"{}".to_vec()))
            .await
            .unwrap();

        let entry = store.get("user/alice").await.unwrap().unwrap();
        assert_eq!(entry.key, "user/alice");
        assert_eq!(entry.value, b"{}");
        assert!(store.get("user/bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = InMemoryStorage::new();
        store.put(StorageEntry::new("k", b"one".to_vec())).await.unwrap();
        store.put(StorageEntry::new("k", b"two".to_vec())).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.raw("k"), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = InMemoryStorage::new();
        store.delete("user/ghost").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let store = InMemoryStorage::new();
        for key in ["user/bob", "user/alice", "userx", "group/ops", "user/team/carol"] {
            store.put(StorageEntry::new(key, Vec::new())).await.unwrap();
        }

        let keys = store.list("user/").await.unwrap();
        assert_eq!(keys, vec!["user/alice", "user/bob", "user/team/carol"]);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = InMemoryStorage::new();
        store.set_unavailable(true);
        assert!(matches!(store.get("k").await, Err(InMemoryError::Unavailable)));
        assert!(store.list("").await.is_err());

        store.set_unavailable(false);
        assert!(store.get("k").await.unwrap().is_none());
    }
}
