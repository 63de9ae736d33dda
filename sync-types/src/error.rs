//! Error types for todo-sync data types.

use thiserror::Error;

/// Errors that can occur when building or decoding todo-sync types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Priority string is not one of High, Medium, Low
    #[error("invalid priority: {0} (expected High, Medium or Low)")]
    InvalidPriority(String),

    /// Todo text is empty after trimming
    #[error("todo text must not be empty")]
    EmptyText,

    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TypesError::InvalidPriority("Urgent".into());
        assert_eq!(
            err.to_string(),
            "invalid priority: Urgent (expected High, Medium or Low)"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypesError>();
    }
}
