//! Turn automatic replay on or off.

use anyhow::Result;

use super::Session;

/// Persist the auto-sync preference.
pub async fn run(session: &Session, enabled: bool) -> Result<()> {
    session.engine.set_auto_sync(enabled).await;
    println!("Auto-sync: {}", if enabled { "on" } else { "off" });
    Ok(())
}
