//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Two independent triggers:
//! - the matching run (daily by default)
//! - the expiration sweep (hourly by default)
//!
//! ```text
//! Scheduler (MATCHING_CRON)
//!     └─► run_matching_algorithm()
//!             └─► eligibility → allocation → create_match per group
//!
//! Scheduler (EXPIRATION_CRON)
//!     └─► expire_old_matches()
//! ```
//!
//! Each trigger is single-flight: a tick that fires while the previous run of
//! the same trigger is still going is skipped, not queued.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domains::matching::activities::{expire_old_matches, run_matching_algorithm};
use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps, config: &Config) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Matching run
    let matching_deps = deps.clone();
    let matching_guard = Arc::new(Mutex::new(()));
    let matching_job = Job::new_async(config.matching_cron.as_str(), move |_uuid, _lock| {
        let deps = matching_deps.clone();
        let guard = matching_guard.clone();
        Box::pin(async move {
            let Ok(_running) = guard.try_lock() else {
                warn!("Previous matching run still in progress, skipping tick");
                return;
            };
            match run_matching_algorithm(&deps).await {
                Ok(summary) => info!(
                    matches_created = summary.matches_created,
                    requests_processed = summary.requests_processed,
                    "Scheduled matching run complete"
                ),
                Err(e) => error!("Scheduled matching run failed: {:#}", e),
            }
        })
    })?;

    scheduler.add(matching_job).await?;

    // Expiration sweep
    let expiration_deps = deps;
    let expiration_guard = Arc::new(Mutex::new(()));
    let expiration_job = Job::new_async(config.expiration_cron.as_str(), move |_uuid, _lock| {
        let deps = expiration_deps.clone();
        let guard = expiration_guard.clone();
        Box::pin(async move {
            let Ok(_running) = guard.try_lock() else {
                warn!("Previous expiration sweep still in progress, skipping tick");
                return;
            };
            if let Err(e) = expire_old_matches(&deps).await {
                error!("Scheduled expiration sweep failed: {:#}", e);
            }
        })
    })?;

    scheduler.add(expiration_job).await?;
    scheduler.start().await?;

    info!(
        matching_cron = %config.matching_cron,
        expiration_cron = %config.expiration_cron,
        "Scheduled tasks started"
    );
    Ok(scheduler)
}
