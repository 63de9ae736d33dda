//! Remote store abstraction.
//!
//! The remote store is the authoritative backend holding todo records. The
//! engine only needs five calls from it:
//! - `add()` creates a record and returns its server id
//! - `update()` overwrites text, category and priority
//! - `toggle()` flips completion
//! - `delete()` removes a record
//! - `list()` returns the current records, or `None` while still loading
//!
//! # Example
//!
//! ```ignore
//! let remote = MockRemote::new();
//! let id = remote.add(&draft).await?;
//! remote.toggle(&id).await?;
//! ```

mod http;
mod mock;

pub use http::{HttpRemote, HttpRemoteConfig};
pub use mock::{MockCall, MockRemote};

use async_trait::async_trait;
use sync_types::{TodoDraft, TodoEdit, TodoId, TodoItem};
use thiserror::Error;

/// Remote store errors.
///
/// The engine treats every variant the same way; they exist for logs and
/// for the command-line front end.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Credentials missing or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The target record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote refused the request (validation, conflict).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The remote could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Unexpected response.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Client for the authoritative todo store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create a record and return the id the remote assigned.
    async fn add(&self, draft: &TodoDraft) -> Result<TodoId, RemoteError>;

    /// Overwrite text, category and priority of `edit.id`.
    async fn update(&self, edit: &TodoEdit) -> Result<(), RemoteError>;

    /// Flip completion of a record.
    async fn toggle(&self, id: &TodoId) -> Result<(), RemoteError>;

    /// Delete a record.
    async fn delete(&self, id: &TodoId) -> Result<(), RemoteError>;

    /// Current records, or `None` if the remote has not loaded yet.
    async fn list(&self) -> Result<Option<Vec<TodoItem>>, RemoteError>;
}
