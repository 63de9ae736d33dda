//! Engine errors.

use sync_types::TodoId;
use thiserror::Error;

/// Errors returned by engine actions.
///
/// Remote and persistence failures never surface here: the engine absorbs
/// them by queueing and logging.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Local state has not been loaded yet.
    #[error("engine not hydrated")]
    NotHydrated,

    /// The target item is not in the visible list.
    #[error("unknown todo: {0}")]
    UnknownTodo(TodoId),
}
