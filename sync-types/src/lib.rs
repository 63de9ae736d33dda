//! # sync-types
//!
//! Shared data types for the todo-sync offline-first engine.
//!
//! This crate provides the foundational types used across all todo-sync crates:
//! - [`TodoId`] - Server or device-local identifier for a todo
//! - [`TodoItem`], [`TodoDraft`], [`TodoEdit`], [`Priority`] - The todo record and its inputs
//! - [`PendingOperation`] - A queued mutation awaiting replay
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod operation;
mod todo;

pub use error::TypesError;
pub use ids::{now_millis, TodoId, LOCAL_ID_PREFIX};
pub use operation::PendingOperation;
pub use todo::{Priority, TodoDraft, TodoEdit, TodoItem};
