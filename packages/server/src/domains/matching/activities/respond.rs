//! Participant responses to a pending match.
//!
//! Accepting records the response and, once every participant has accepted,
//! confirms the match and marks its requests matched. A single rejection voids
//! the whole match and returns every request to the pool.

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::common::{MatchId, UserId};
use crate::domains::matching::error::MatchingError;
use crate::domains::matching::models::{MatchStatus, Participant, ResponseStatus, SwapMatch};
use crate::domains::transfers::TransferStatus;
use crate::kernel::ServerDeps;

/// A pending match plus the requester's seat in it.
struct OpenMatch {
    swap_match: SwapMatch,
    participants: Vec<Participant>,
    seat: Participant,
}

/// Check that `requester` may answer `match_id` right now. Mutates nothing.
async fn open_match_for(
    match_id: MatchId,
    requester: UserId,
    deps: &ServerDeps,
) -> Result<OpenMatch, MatchingError> {
    let swap_match = deps
        .store
        .find_match(match_id)
        .await?
        .ok_or(MatchingError::MatchNotFound(match_id))?;

    if swap_match.status != MatchStatus::Pending {
        return Err(MatchingError::StateConflict {
            match_id,
            status: swap_match.status,
        });
    }

    // Overdue but not yet swept counts as expired.
    if swap_match.expires_at < Utc::now() {
        return Err(MatchingError::StateConflict {
            match_id,
            status: MatchStatus::Expired,
        });
    }

    let participants = deps.store.find_participants(match_id).await?;
    let seat = participants
        .iter()
        .find(|p| p.user_id == requester)
        .cloned()
        .ok_or(MatchingError::NotParticipant {
            match_id,
            user_id: requester,
        })?;

    if seat.response_status != ResponseStatus::Pending {
        return Err(MatchingError::AlreadyResponded {
            match_id,
            user_id: requester,
        });
    }

    Ok(OpenMatch {
        swap_match,
        participants,
        seat,
    })
}

async fn record(
    open: &OpenMatch,
    response: ResponseStatus,
    requester: UserId,
    deps: &ServerDeps,
) -> Result<Participant, MatchingError> {
    deps.store
        .record_response(open.seat.id, response, Utc::now())
        .await?
        .ok_or(MatchingError::AlreadyResponded {
            match_id: open.swap_match.id,
            user_id: requester,
        })
}

/// Accept a match on behalf of `requester`.
#[instrument(skip(deps), fields(match_id = %match_id, user_id = %requester))]
pub async fn accept_match(
    match_id: MatchId,
    requester: UserId,
    deps: &ServerDeps,
) -> Result<Participant, MatchingError> {
    let open = open_match_for(match_id, requester, deps).await?;
    let updated = record(&open, ResponseStatus::Accepted, requester, deps).await?;

    // Re-read: a concurrent acceptance may have landed since the seat check.
    let participants = deps.store.find_participants(match_id).await?;
    let all_accepted = participants
        .iter()
        .all(|p| p.response_status == ResponseStatus::Accepted);

    if !all_accepted {
        info!("Acceptance recorded, waiting on other participants");
        return Ok(updated);
    }

    // Conditional on pending, so only one concurrent confirmer gets a row back.
    let Some(accepted) = deps
        .store
        .transition_match(match_id, MatchStatus::Pending, MatchStatus::Accepted)
        .await?
    else {
        info!("Match no longer pending when confirming");
        return Ok(updated);
    };

    let request_ids: Vec<_> = participants.iter().map(|p| p.request_id).collect();
    let changed = match deps
        .store
        .set_request_status(&request_ids, TransferStatus::Matched)
        .await
    {
        Ok(changed) => changed,
        Err(e) => {
            // The match stays accepted; an operator re-applies the request status.
            error!(match_id = %match_id, error = %e, "Failed to mark requests matched for accepted match");
            0
        }
    };

    info!(requests_matched = changed, "Match accepted by every participant");

    if let Err(e) = deps
        .notifier
        .notify_match_accepted(&accepted, &participants)
        .await
    {
        warn!(error = %e, "Match accepted notification failed");
    }

    Ok(updated)
}

/// Reject a match on behalf of `requester`. Voids the match for everyone.
#[instrument(skip(deps), fields(match_id = %match_id, user_id = %requester))]
pub async fn reject_match(
    match_id: MatchId,
    requester: UserId,
    deps: &ServerDeps,
) -> Result<Participant, MatchingError> {
    let open = open_match_for(match_id, requester, deps).await?;
    let updated = record(&open, ResponseStatus::Rejected, requester, deps).await?;

    let Some(rejected) = deps
        .store
        .transition_match(match_id, MatchStatus::Pending, MatchStatus::Rejected)
        .await?
    else {
        warn!("Match left pending before the rejection applied");
        return Ok(updated);
    };

    let request_ids: Vec<_> = open.participants.iter().map(|p| p.request_id).collect();
    let reopened = match deps
        .store
        .set_request_status(&request_ids, TransferStatus::Submitted)
        .await
    {
        Ok(reopened) => reopened,
        Err(e) => {
            // The match stays rejected; an operator re-applies the request status.
            error!(match_id = %match_id, error = %e, "Failed to reopen requests of rejected match");
            0
        }
    };

    info!(requests_reopened = reopened, "Match rejected");

    if let Err(e) = deps
        .notifier
        .notify_match_rejected(&rejected, &open.participants, requester)
        .await
    {
        warn!(error = %e, "Match rejected notification failed");
    }

    Ok(updated)
}
