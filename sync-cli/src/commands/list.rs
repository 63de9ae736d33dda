//! Print the visible list.

use anyhow::Result;

use super::Session;

/// Print one line per todo, newest first.
pub async fn run(session: &Session) -> Result<()> {
    let todos = session.engine.todos().await;
    if todos.is_empty() {
        println!("No todos.");
        return Ok(());
    }

    for item in &todos {
        let mark = if item.is_completed { "x" } else { " " };
        let priority = item.priority.unwrap_or_default();
        match &item.category {
            Some(category) => println!(
                "[{}] {}  {}  ({}, {})",
                mark, item.id, item.text, category, priority
            ),
            None => println!("[{}] {}  {}  ({})", mark, item.id, item.text, priority),
        }
    }

    let pending = session.engine.pending_operations().await.len();
    if pending > 0 {
        println!();
        println!("{} change(s) waiting to sync", pending);
    }
    Ok(())
}
