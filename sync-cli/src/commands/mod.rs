//! CLI command implementations.

pub mod auto_sync;
pub mod edit;
pub mod list;
pub mod status;
pub mod sync;
pub mod todo;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use sync_client::{
    EngineConfig, HttpRemote, RemoteError, RemoteStore, SqliteStore, StatusTracker, SyncOutcome,
    TodoEngine,
};
use sync_types::{TodoDraft, TodoEdit, TodoId, TodoItem};

use crate::config::CliConfig;

/// Database file inside the data directory.
pub const DB_FILE: &str = "todos.db";

/// Remote used by the CLI: HTTP when configured, nothing otherwise.
pub enum CliRemote {
    /// A configured HTTP backend.
    Http(HttpRemote),
    /// No `[remote]` section in the config.
    Unconfigured,
}

impl CliRemote {
    fn unconfigured() -> RemoteError {
        RemoteError::Unavailable("no remote configured".to_string())
    }

    /// Human-readable description for `status`.
    pub fn describe(&self) -> String {
        match self {
            CliRemote::Http(remote) => remote.base_url().to_string(),
            CliRemote::Unconfigured => "not configured".to_string(),
        }
    }
}

#[async_trait]
impl RemoteStore for CliRemote {
    async fn add(&self, draft: &TodoDraft) -> Result<TodoId, RemoteError> {
        match self {
            CliRemote::Http(remote) => remote.add(draft).await,
            CliRemote::Unconfigured => Err(Self::unconfigured()),
        }
    }

    async fn update(&self, edit: &TodoEdit) -> Result<(), RemoteError> {
        match self {
            CliRemote::Http(remote) => remote.update(edit).await,
            CliRemote::Unconfigured => Err(Self::unconfigured()),
        }
    }

    async fn toggle(&self, id: &TodoId) -> Result<(), RemoteError> {
        match self {
            CliRemote::Http(remote) => remote.toggle(id).await,
            CliRemote::Unconfigured => Err(Self::unconfigured()),
        }
    }

    async fn delete(&self, id: &TodoId) -> Result<(), RemoteError> {
        match self {
            CliRemote::Http(remote) => remote.delete(id).await,
            CliRemote::Unconfigured => Err(Self::unconfigured()),
        }
    }

    async fn list(&self) -> Result<Option<Vec<TodoItem>>, RemoteError> {
        match self {
            CliRemote::Http(remote) => remote.list().await,
            CliRemote::Unconfigured => Err(Self::unconfigured()),
        }
    }
}

/// Engine type used by every command.
pub type CliEngine = TodoEngine<CliRemote, SqliteStore, StatusTracker>;

/// One CLI invocation: a hydrated engine over the data directory.
pub struct Session {
    /// The engine.
    pub engine: CliEngine,
    /// Remote description for `status`.
    pub remote_label: String,
}

impl Session {
    /// Open the store, hydrate, and fetch the remote list when online.
    ///
    /// Without a configured remote the session is always offline.
    pub async fn open(data_dir: &Path, offline: bool) -> Result<Self> {
        let config = CliConfig::load(data_dir).await?;

        let remote = match &config.remote {
            Some(remote) => CliRemote::Http(
                HttpRemote::new(remote.http_config()).context("Failed to build HTTP client")?,
            ),
            None => CliRemote::Unconfigured,
        };
        let online = !offline && matches!(remote, CliRemote::Http(_));
        let remote_label = remote.describe();

        let store = SqliteStore::new(&data_dir.join(DB_FILE))
            .await
            .context("Failed to open local database")?;

        let engine = TodoEngine::new(
            remote,
            store,
            StatusTracker::new(),
            EngineConfig {
                auto_sync: config.sync.auto_sync,
            },
        );
        engine.set_online(online).await;
        engine.hydrate().await;
        if online {
            engine.refresh_remote().await;
        }

        tracing::debug!(
            "Session opened ({}, remote: {})",
            if online { "online" } else { "offline" },
            remote_label
        );

        Ok(Self {
            engine,
            remote_label,
        })
    }

    /// Replay queued changes if auto-sync is due, then close the store.
    pub async fn finish(self) {
        if self.engine.auto_sync_due().await {
            match self.engine.sync_pending_changes().await {
                SyncOutcome::Failed { error } => {
                    tracing::warn!("Automatic sync failed: {}", error);
                }
                outcome => tracing::debug!("Automatic sync: {:?}", outcome),
            }
        }
        self.engine.store().close().await;
    }
}

/// Find a visible todo by id.
pub async fn find_todo(engine: &CliEngine, id: &TodoId) -> Option<TodoItem> {
    engine.todos().await.into_iter().find(|item| item.id == *id)
}
