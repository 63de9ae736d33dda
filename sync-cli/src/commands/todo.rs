//! Add, toggle and delete.

use anyhow::Result;
use sync_types::{Priority, TodoDraft, TodoId};

use super::Session;

/// Create a todo and print its id.
pub async fn add(session: &Session, text: &str, category: &str, priority: Priority) -> Result<()> {
    let draft = TodoDraft::new(text, category, priority)?;
    let id = session.engine.add(draft).await?;
    println!("Added {}", id);
    if id.is_local() {
        println!("Queued for sync (offline or remote unavailable)");
    }
    Ok(())
}

/// Flip completion of a todo.
pub async fn toggle(session: &Session, id: &str) -> Result<()> {
    let id = TodoId::from(id);
    session.engine.toggle(&id).await?;
    println!("Toggled {}", id);
    Ok(())
}

/// Delete a todo.
pub async fn delete(session: &Session, id: &str) -> Result<()> {
    let id = TodoId::from(id);
    session.engine.delete(&id).await?;
    println!("Deleted {}", id);
    Ok(())
}
