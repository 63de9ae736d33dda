//! Show connectivity, remote and queue state.

use anyhow::Result;
use sync_types::PendingOperation;

use super::Session;

/// Print a status summary.
pub async fn run(session: &Session) -> Result<()> {
    let engine = &session.engine;
    let pending = engine.pending_operations().await;

    println!("=== todo-sync status ===");
    println!();
    println!(
        "Connection: {}",
        if engine.is_online().await {
            "online"
        } else {
            "offline"
        }
    );
    println!("Remote:     {}", session.remote_label);
    println!(
        "Auto-sync:  {}",
        if engine.auto_sync_enabled().await {
            "on"
        } else {
            "off"
        }
    );
    println!("Items:      {}", engine.todos().await.len());
    println!("Pending:    {}", pending.len());

    if !pending.is_empty() {
        println!();
        println!("Queued changes:");
        for op in &pending {
            println!("  {}", describe(op));
        }
    }
    Ok(())
}

fn describe(op: &PendingOperation) -> String {
    match op {
        PendingOperation::Add { local_id, text, .. } => format!("add {} {:?}", local_id, text),
        PendingOperation::Update { id, text, .. } => format!("update {} {:?}", id, text),
        other => format!("{} {}", other.kind(), other.target_id()),
    }
}
