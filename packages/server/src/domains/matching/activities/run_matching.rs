//! One allocation run over the eligible pool.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use super::create_match::{create_match, MatchCreation};
use crate::domains::matching::utils::{allocate, filter_eligible};
use crate::domains::transfers::TransferRequest;
use crate::kernel::ServerDeps;

/// Counts of what the run actually committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchingRunSummary {
    pub matches_created: usize,
    /// Size of the eligible pool the allocator ran over.
    pub requests_processed: usize,
    /// Groups that were allocated but could not be persisted.
    pub groups_dropped: usize,
}

/// Load the eligible pool: submitted, unexpired, not in an active match.
///
/// Any persistence failure here aborts the run; no partial pool is matched.
pub async fn load_eligible_pool(deps: &ServerDeps, now: DateTime<Utc>) -> Result<Vec<TransferRequest>> {
    let requests = deps
        .store
        .fetch_submitted_requests(now)
        .await
        .context("Failed to load candidate requests")?;
    let active = deps
        .store
        .fetch_active_request_ids()
        .await
        .context("Failed to load active match participants")?;

    Ok(filter_eligible(
        requests,
        now,
        &active,
        deps.matching.max_pool_size,
    ))
}

/// Run the matching engine once.
///
/// Matches committed before a failure stay committed; the summary only counts
/// what was persisted.
#[instrument(skip(deps))]
pub async fn run_matching_algorithm(deps: &ServerDeps) -> Result<MatchingRunSummary> {
    let pool = load_eligible_pool(deps, Utc::now()).await?;
    let allocation = allocate(&pool);

    info!(
        pool = pool.len(),
        groups = allocation.groups.len(),
        allocated = allocation.allocated.len(),
        "Allocation complete"
    );

    let mut summary = MatchingRunSummary {
        requests_processed: pool.len(),
        ..Default::default()
    };

    for group in &allocation.groups {
        match create_match(group, deps).await? {
            MatchCreation::Created { .. } => summary.matches_created += 1,
            MatchCreation::NotCreated { .. } | MatchCreation::RolledBack { .. } => {
                summary.groups_dropped += 1
            }
        }
    }

    info!(
        matches_created = summary.matches_created,
        requests_processed = summary.requests_processed,
        groups_dropped = summary.groups_dropped,
        "Matching run finished"
    );

    Ok(summary)
}
