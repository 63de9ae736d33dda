//! In-memory store for testing.
//!
//! Clones share state, so a test can keep a handle while the engine owns
//! another, inspect what was written and inject failures.

use super::{LocalStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory key-value store with failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    values: HashMap<String, String>,
    writes: usize,
    fail_writes: bool,
    fail_next_read: Option<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write.
    pub fn insert(&self, key: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.values.insert(key.to_string(), value.to_string());
    }

    /// Current value of a key.
    pub fn value(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.values.get(key).cloned()
    }

    /// Number of successful `set`/`remove` calls.
    pub fn write_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.writes
    }

    /// Make every write fail until turned off again.
    pub fn set_fail_writes(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_writes = fail;
    }

    /// Cause the next read to fail with the given reason.
    pub fn fail_next_read(&self, reason: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_read = Some(reason.to_string());
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = inner.fail_next_read.take() {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                reason,
            });
        }
        Ok(inner.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "injected failure".into(),
            });
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "injected failure".into(),
            });
        }
        inner.values.remove(key);
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
        store.remove("nope").await.unwrap();
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.set("k", "v").await.unwrap();
        assert_eq!(handle.value("k"), Some("v".to_string()));
    }

    #[tokio::test]
    async fn injected_write_failure() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.set("k", "v").await,
            Err(StorageError::WriteFailed { .. })
        ));
        store.set_fail_writes(false);
        store.set("k", "v").await.unwrap();
    }

    #[tokio::test]
    async fn injected_read_failure_is_one_shot() {
        let store = MemoryStore::new();
        store.insert("k", "v");
        store.fail_next_read("disk on fire");
        assert!(store.get("k").await.is_err());
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }
}
