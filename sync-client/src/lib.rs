//! # sync-client
//!
//! Offline-first reconciliation engine for todo-sync.
//!
//! This is the library applications use to keep a todo list usable while
//! disconnected and to bring the remote store up to date afterwards.
//!
//! ## Features
//!
//! - **Optimistic updates**: every action shows up in the list immediately
//! - **Compacted queue**: offline edits collapse before they are replayed
//! - **Journaled replay**: an interrupted sync never re-creates an item
//! - **Pluggable collaborators**: remote store, local store and status reporter are traits
//! - **Pure core**: uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sync_client::{ConnectivitySignal, EngineConfig, HttpRemote, HttpRemoteConfig, SqliteStore, StatusTracker, TodoEngine};
//!
//! let remote = HttpRemote::new(HttpRemoteConfig::new("https://todos.example.com"))?;
//! let store = SqliteStore::new(&path).await?;
//! let engine = Arc::new(TodoEngine::new(remote, store, StatusTracker::new(), EngineConfig::default()));
//! engine.hydrate().await;
//!
//! let signal = ConnectivitySignal::default();
//! engine.spawn_auto_sync(signal.clone());
//!
//! engine.add(draft).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connectivity;
pub mod engine;
pub mod error;
pub mod remote;
pub mod reporter;
pub mod storage;

pub use connectivity::ConnectivitySignal;
pub use engine::{EngineConfig, SkipReason, SyncOutcome, TodoEngine};
pub use error::EngineError;
pub use remote::{HttpRemote, HttpRemoteConfig, MockCall, MockRemote, RemoteError, RemoteStore};
pub use reporter::{
    RecordingReporter, ReportedEvent, StatusTracker, SyncReporter, SyncStatusView,
};
pub use storage::{LocalStore, MemoryStore, SqliteStore, StorageError};
