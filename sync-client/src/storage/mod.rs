//! Local persistence for the engine.
//!
//! A small async key-value interface. Values are JSON strings written under
//! the fixed keys below. Two backends are provided: [`MemoryStore`] for tests
//! and [`SqliteStore`] for durable on-device storage.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

/// Key of the local snapshot of todo items.
pub const KEY_LOCAL_TODOS: &str = "todo_sync:local_todos";

/// Key of the pending operation queue.
pub const KEY_PENDING_OPS: &str = "todo_sync:pending_ops";

/// Key of the replay journal.
pub const KEY_REPLAY_JOURNAL: &str = "todo_sync:replay_journal";

/// Key of the auto-sync preference (`"true"` / `"false"`).
pub const KEY_AUTO_SYNC: &str = "todo_sync:auto_sync";

/// Storage layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Write rejected by the backend.
    #[error("write failed for {key}: {reason}")]
    WriteFailed {
        /// Key being written.
        key: String,
        /// Backend message.
        reason: String,
    },

    /// Read rejected by the backend.
    #[error("read failed for {key}: {reason}")]
    ReadFailed {
        /// Key being read.
        key: String,
        /// Backend message.
        reason: String,
    },
}

/// Async key-value store.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
