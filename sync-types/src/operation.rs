//! Queued mutations awaiting replay against the remote store.

use serde::{Deserialize, Serialize};

use crate::{Priority, TodoDraft, TodoEdit, TodoId, TypesError};

/// A mutation recorded while the remote store could not be used directly.
///
/// Serialized as JSON tagged by `"type"`, e.g.
/// `{"type":"toggle","id":"server-1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingOperation {
    /// Create a todo that so far only exists locally.
    Add {
        /// Local id the item is shown under until the remote assigns one.
        local_id: TodoId,
        /// Todo text.
        text: String,
        /// Category label.
        category: String,
        /// Priority.
        priority: Priority,
        /// Completion state to apply right after creation.
        is_completed: bool,
    },
    /// Overwrite text, category and priority of an item.
    Update {
        /// Target item.
        id: TodoId,
        /// New text.
        text: String,
        /// New category.
        category: String,
        /// New priority.
        priority: Priority,
    },
    /// Flip the completion state of an item.
    Toggle {
        /// Target item.
        id: TodoId,
    },
    /// Remove an item.
    Delete {
        /// Target item.
        id: TodoId,
    },
}

impl PendingOperation {
    /// Build an `Add` for a freshly created local item.
    pub fn add(local_id: TodoId, draft: &TodoDraft) -> Self {
        PendingOperation::Add {
            local_id,
            text: draft.text.clone(),
            category: draft.category.clone(),
            priority: draft.priority,
            is_completed: false,
        }
    }

    /// Build an `Update` from an edit.
    pub fn update(edit: &TodoEdit) -> Self {
        PendingOperation::Update {
            id: edit.id.clone(),
            text: edit.text.clone(),
            category: edit.category.clone(),
            priority: edit.priority,
        }
    }

    /// The item this operation applies to.
    pub fn target_id(&self) -> &TodoId {
        match self {
            PendingOperation::Add { local_id, .. } => local_id,
            PendingOperation::Update { id, .. }
            | PendingOperation::Toggle { id }
            | PendingOperation::Delete { id } => id,
        }
    }

    /// True if this is the `Add` that created `id`.
    pub fn is_add_for(&self, id: &TodoId) -> bool {
        matches!(self, PendingOperation::Add { local_id, .. } if local_id == id)
    }

    /// Short name of the operation kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PendingOperation::Add { .. } => "add",
            PendingOperation::Update { .. } => "update",
            PendingOperation::Toggle { .. } => "toggle",
            PendingOperation::Delete { .. } => "delete",
        }
    }

    /// Point the operation at a different item id.
    pub fn retarget(&mut self, new_id: TodoId) {
        match self {
            PendingOperation::Add { local_id, .. } => *local_id = new_id,
            PendingOperation::Update { id, .. }
            | PendingOperation::Toggle { id }
            | PendingOperation::Delete { id } => *id = new_id,
        }
    }

    /// Encode a whole queue as JSON.
    pub fn encode_all(ops: &[PendingOperation]) -> Result<String, TypesError> {
        serde_json::to_string(ops).map_err(TypesError::Serialization)
    }

    /// Decode a queue previously written by [`PendingOperation::encode_all`].
    pub fn decode_all(json: &str) -> Result<Vec<PendingOperation>, TypesError> {
        serde_json::from_str(json).map_err(TypesError::Deserialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TodoDraft {
        TodoDraft::new("Buy milk", "Shopping", Priority::Medium).unwrap()
    }

    #[test]
    fn add_from_draft_starts_incomplete() {
        let op = PendingOperation::add(TodoId::from("local:1:abcdef"), &draft());
        match op {
            PendingOperation::Add {
                ref text,
                is_completed,
                ..
            } => {
                assert_eq!(text, "Buy milk");
                assert!(!is_completed);
            }
            _ => panic!("expected Add"),
        }
    }

    #[test]
    fn serializes_tagged_by_type() {
        let op = PendingOperation::Toggle {
            id: TodoId::from("server-1"),
        };
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"type":"toggle","id":"server-1"}"#);
    }

    #[test]
    fn decodes_add_with_priority_name() {
        let json = r#"[{"type":"add","local_id":"local:1:abcdef","text":"t","category":"c","priority":"High","is_completed":true}]"#;
        let ops = PendingOperation::decode_all(json).unwrap();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_add_for(&TodoId::from("local:1:abcdef")));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            PendingOperation::decode_all("not json"),
            Err(TypesError::Deserialization(_))
        ));
    }

    #[test]
    fn target_and_retarget() {
        let mut op = PendingOperation::Delete {
            id: TodoId::from("local:1:abcdef"),
        };
        assert_eq!(op.target_id().as_str(), "local:1:abcdef");
        op.retarget(TodoId::server("server-9"));
        assert_eq!(op.target_id().as_str(), "server-9");
        assert_eq!(op.kind(), "delete");
    }

    #[test]
    fn is_add_for_ignores_other_kinds() {
        let id = TodoId::from("local:1:abcdef");
        let op = PendingOperation::Toggle { id: id.clone() };
        assert!(!op.is_add_for(&id));
    }
}
