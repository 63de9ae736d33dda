//! The todo record and the inputs that create or edit it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{TodoId, TypesError};

/// Priority of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Needs attention first
    High,
    /// Default priority
    Medium,
    /// Can wait
    Low,
}

impl Priority {
    /// The canonical string form (`High`, `Medium`, `Low`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Priority::High),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            other => Err(TypesError::InvalidPriority(other.to_string())),
        }
    }
}

/// A todo item as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Server id, or a local id while the item is unsynced.
    pub id: TodoId,
    /// Creation time in unix milliseconds.
    pub created_at: u64,
    /// The todo text.
    pub text: String,
    /// Whether the item is done.
    pub is_completed: bool,
    /// Optional free-form category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TodoItem {
    /// Build a new, not yet completed item from a draft.
    pub fn from_draft(id: TodoId, created_at: u64, draft: &TodoDraft) -> Self {
        Self {
            id,
            created_at,
            text: draft.text.clone(),
            is_completed: false,
            category: Some(draft.category.clone()),
            priority: Some(draft.priority),
        }
    }

    /// Overwrite text, category and priority.
    pub fn apply_edit(&mut self, text: &str, category: &str, priority: Priority) {
        self.text = text.to_string();
        self.category = Some(category.to_string());
        self.priority = Some(priority);
    }
}

/// Input for creating a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDraft {
    /// The todo text.
    pub text: String,
    /// Category label.
    pub category: String,
    /// Priority.
    pub priority: Priority,
}

impl TodoDraft {
    /// Create a draft, rejecting blank text.
    pub fn new(
        text: impl Into<String>,
        category: impl Into<String>,
        priority: Priority,
    ) -> Result<Self, TypesError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TypesError::EmptyText);
        }
        Ok(Self {
            text,
            category: category.into(),
            priority,
        })
    }
}

/// Input for editing an existing todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoEdit {
    /// Item being edited.
    pub id: TodoId,
    /// New text.
    pub text: String,
    /// New category.
    pub category: String,
    /// New priority.
    pub priority: Priority,
}

impl TodoEdit {
    /// Create an edit, rejecting blank text.
    pub fn new(
        id: TodoId,
        text: impl Into<String>,
        category: impl Into<String>,
        priority: Priority,
    ) -> Result<Self, TypesError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TypesError::EmptyText);
        }
        Ok(Self {
            id,
            text,
            category: category.into(),
            priority,
        })
    }
}
