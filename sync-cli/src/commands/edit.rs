//! Edit a todo's text, category or priority.

use anyhow::Result;
use sync_client::EngineError;
use sync_types::{Priority, TodoEdit, TodoId};

use super::{find_todo, Session};

/// Overwrite text. Category and priority keep their current values unless given.
pub async fn run(
    session: &Session,
    id: &str,
    text: &str,
    category: Option<String>,
    priority: Option<Priority>,
) -> Result<()> {
    let id = TodoId::from(id);
    let current = find_todo(&session.engine, &id)
        .await
        .ok_or_else(|| EngineError::UnknownTodo(id.clone()))?;

    let category = category
        .or(current.category)
        .unwrap_or_else(|| crate::DEFAULT_CATEGORY.to_string());
    let priority = priority.or(current.priority).unwrap_or_default();

    let edit = TodoEdit::new(id.clone(), text, category, priority)?;
    session.engine.update(edit).await?;
    println!("Updated {}", id);
    Ok(())
}
