use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::common::RequestId;
use crate::domains::transfers::{TransferRequest, TransferStatus};

/// A request is matchable when it is submitted, not expired, and not already
/// held by a pending or accepted match.
pub fn is_eligible(
    request: &TransferRequest,
    now: DateTime<Utc>,
    active_request_ids: &HashSet<RequestId>,
) -> bool {
    request.status == TransferStatus::Submitted
        && !request.is_expired_at(now)
        && !active_request_ids.contains(&request.id)
}

/// Build the candidate pool, keeping the input order. `limit` caps the pool
/// after filtering.
///
/// Requests without a location chain stay in the pool; they simply score zero
/// on geography.
pub fn filter_eligible(
    requests: Vec<TransferRequest>,
    now: DateTime<Utc>,
    active_request_ids: &HashSet<RequestId>,
    limit: Option<usize>,
) -> Vec<TransferRequest> {
    let eligible = requests
        .into_iter()
        .filter(|request| is_eligible(request, now, active_request_ids))
        .inspect(|request| {
            if request.location.is_none() {
                debug!(request_id = %request.id, "Request has no location chain, geography will score 0");
            }
        });

    match limit {
        Some(limit) => eligible.take(limit).collect(),
        None => eligible.collect(),
    }
}
