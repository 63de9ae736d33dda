//! Replay queued changes now.

use anyhow::{bail, Result};
use sync_client::{SkipReason, SyncOutcome};

use super::Session;

/// Run one replay pass and report what happened.
pub async fn run(session: &Session) -> Result<()> {
    match session.engine.sync_pending_changes().await {
        SyncOutcome::Synced { replayed } => {
            println!("Synced: {} change(s) sent", replayed);
        }
        SyncOutcome::Skipped(SkipReason::Offline) => {
            let pending = session.engine.pending_operations().await.len();
            println!("Offline: {} change(s) kept for later", pending);
        }
        SyncOutcome::Skipped(SkipReason::NothingPending) => {
            println!("Nothing to sync");
        }
        SyncOutcome::Skipped(reason) => {
            println!("Sync skipped: {:?}", reason);
        }
        SyncOutcome::Failed { error } => {
            bail!("sync failed: {} (changes kept for retry)", error);
        }
    }

    let status = session.engine.reporter().current();
    tracing::debug!("Sync status: {}", status.phase.as_str());
    Ok(())
}
