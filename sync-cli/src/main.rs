//! # todo-sync
//!
//! Offline-first todo list on the command line.
//!
//! Every change lands in a local SQLite database first. When a remote is
//! configured in `config.toml` and reachable, changes go straight to it;
//! otherwise they are queued and replayed by `todo-sync sync` or by the
//! automatic sync that runs at the end of each command.
//!
//! ## Example
//!
//! ```bash
//! todo-sync add "Buy milk" --category Errands --priority High
//! todo-sync list
//! todo-sync toggle <id>
//! todo-sync --offline delete <id>
//! todo-sync sync
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use sync_types::Priority;

mod commands;
mod config;
mod logging;

use commands::{auto_sync, edit, list, status, sync, todo, Session};

/// Category used when none is given.
pub const DEFAULT_CATEGORY: &str = "General";

/// Offline-first todo list.
#[derive(Parser, Debug)]
#[command(name = "todo-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the local database and config.toml
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat the remote as unreachable; every change is queued
    #[arg(long, global = true)]
    offline: bool,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a todo
    Add {
        /// Todo text
        text: String,

        /// Category label
        #[arg(long, short, default_value = DEFAULT_CATEGORY)]
        category: String,

        /// Priority: High, Medium or Low
        #[arg(long, short, default_value = "Medium")]
        priority: Priority,
    },

    /// List todos, newest first
    List,

    /// Change a todo's text (and optionally category and priority)
    Edit {
        /// Todo id
        id: String,

        /// New text
        text: String,

        /// New category (keeps the current one if omitted)
        #[arg(long, short)]
        category: Option<String>,

        /// New priority (keeps the current one if omitted)
        #[arg(long, short)]
        priority: Option<Priority>,
    },

    /// Mark a todo done or not done
    Toggle {
        /// Todo id
        id: String,
    },

    /// Delete a todo
    Delete {
        /// Todo id
        id: String,
    },

    /// Replay queued changes against the remote now
    Sync,

    /// Show connectivity and queue state
    Status,

    /// Turn automatic sync on or off
    AutoSync {
        /// New setting
        state: Toggle,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(if cli.verbose { "debug" } else { "warn" });

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let session = Session::open(&data_dir, cli.offline).await?;

    let result = match cli.command {
        Commands::Add {
            text,
            category,
            priority,
        } => todo::add(&session, &text, &category, priority).await,
        Commands::List => list::run(&session).await,
        Commands::Edit {
            id,
            text,
            category,
            priority,
        } => edit::run(&session, &id, &text, category, priority).await,
        Commands::Toggle { id } => todo::toggle(&session, &id).await,
        Commands::Delete { id } => todo::delete(&session, &id).await,
        Commands::Sync => sync::run(&session).await,
        Commands::Status => status::run(&session).await,
        Commands::AutoSync { state } => {
            auto_sync::run(&session, matches!(state, Toggle::On)).await
        }
    };

    session.finish().await;
    result
}

/// Get the default data directory for todo-sync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "ydun", "todo-sync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
