//! # sync-core
//!
//! Pure reconciliation logic for todo-sync (no I/O, instant tests).
//!
//! This crate implements the queue compaction rules, the local snapshot,
//! replay bookkeeping and the sync status machine without any network or
//! disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (remote calls, persistence, timers) is performed by
//! `sync-client`, which interprets what these modules compute.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod queue;
pub mod replay;
pub mod snapshot;
pub mod status;

pub use queue::{enqueue_add, enqueue_delete, enqueue_toggle, enqueue_update, OperationQueue};
pub use replay::{
    CallResult, RemoteCall, ReplayError, ReplayJournal, ReplayOutcome, ReplaySession, ReplayStep,
};
pub use snapshot::{select_view, TodoList};
pub use status::{
    StatusAction, StatusEvent, SyncPhase, SyncStatus, ERROR_REVERT_DELAY, SYNCED_REVERT_DELAY,
};
