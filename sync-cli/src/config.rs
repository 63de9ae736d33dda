//! Configuration loading for todo-sync.
//!
//! Configuration is read from `config.toml` in the data directory. The file
//! is optional; without a `[remote]` section the CLI works offline.
//!
//! ```toml
//! [remote]
//! url = "https://todos.example.com/api"
//! token = "secret"
//! timeout_secs = 10
//!
//! [sync]
//! auto_sync = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sync_client::HttpRemoteConfig;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Remote store; absent means offline-only.
    pub remote: Option<RemoteConfig>,
    /// Sync behaviour.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Remote store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the todo API.
    pub url: String,
    /// Bearer token.
    pub token: Option<String>,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Sync configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Replay queued changes automatically (default: true). A preference
    /// saved with `todo-sync auto-sync` takes precedence.
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_auto_sync() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: default_auto_sync(),
        }
    }
}

impl RemoteConfig {
    /// Settings for the HTTP client.
    pub fn http_config(&self) -> HttpRemoteConfig {
        let config = HttpRemoteConfig::new(&self.url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }
}

impl CliConfig {
    /// Load `config.toml` from `data_dir`, or defaults if it does not exist.
    pub async fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::ReadError { path, source: e }),
        };
        toml::from_str(&content).map_err(|e| ConfigError::ParseError { path, source: e })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
