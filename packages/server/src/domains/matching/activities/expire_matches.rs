//! Expire pending matches whose response window has closed.

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::kernel::ServerDeps;

/// Expire every overdue pending match. Accepted and rejected matches are left
/// alone, and a second run with nothing newly overdue changes nothing.
/// Called on the expiration schedule.
pub async fn expire_old_matches(deps: &ServerDeps) -> Result<u64> {
    let expired_count = deps.store.expire_pending_matches(Utc::now()).await?;
    info!(expired_count, "Sweep: expired pending matches");
    Ok(expired_count)
}
