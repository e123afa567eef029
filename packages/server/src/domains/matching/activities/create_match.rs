//! Match creation as a two-step saga.
//!
//! ```text
//! step 1: insert match row        (compensation: none needed)
//! step 2: insert participant rows (compensation: delete the match row)
//! ```
//!
//! A failure in either step drops the group. A failure of the compensation
//! itself would leave an orphaned match, so that one is returned as an error
//! and aborts the run.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::common::MatchId;
use crate::domains::matching::models::{NewParticipant, NewSwapMatch, Participant, SwapMatch};
use crate::domains::matching::utils::{AllocatedGroup, ALGORITHM_VERSION};
use crate::kernel::ServerDeps;

/// How creating one allocated group ended.
#[derive(Debug, Clone)]
pub enum MatchCreation {
    Created {
        swap_match: SwapMatch,
        participants: Vec<Participant>,
    },
    /// The match row never landed; nothing to undo.
    NotCreated { reason: String },
    /// The match row landed, participants did not, and the row was deleted again.
    RolledBack { match_id: MatchId, reason: String },
}

fn new_match(group: &AllocatedGroup, deps: &ServerDeps) -> Result<NewSwapMatch> {
    Ok(NewSwapMatch {
        match_type: group.match_type,
        compatibility_score: group.score,
        score_breakdown: serde_json::to_value(group.breakdown)
            .context("Failed to serialize score breakdown")?,
        algorithm_version: ALGORITHM_VERSION.to_string(),
        expires_at: Utc::now() + deps.matching.match_expiry,
    })
}

fn new_participants(group: &AllocatedGroup) -> Vec<NewParticipant> {
    group
        .members
        .iter()
        .zip(1..)
        .map(|(member, swap_position)| NewParticipant {
            request_id: member.request_id,
            user_id: member.user_id,
            swap_position,
        })
        .collect()
}

/// Compensating action for step 1.
async fn compensate_insert_match(match_id: MatchId, deps: &ServerDeps) -> Result<()> {
    deps.store
        .delete_match(match_id)
        .await
        .with_context(|| format!("Compensating rollback failed, match {} is orphaned", match_id))
}

/// Persist one allocated group as a pending match, then notify its participants.
#[instrument(skip(group, deps), fields(match_type = ?group.match_type, score = group.score))]
pub async fn create_match(group: &AllocatedGroup, deps: &ServerDeps) -> Result<MatchCreation> {
    let new = new_match(group, deps)?;

    // Step 1
    let swap_match = match deps.store.insert_match(&new).await {
        Ok(swap_match) => swap_match,
        Err(e) => {
            warn!(error = %e, "Match insert failed, dropping group");
            return Ok(MatchCreation::NotCreated {
                reason: e.to_string(),
            });
        }
    };

    // Step 2
    let participants = match deps
        .store
        .insert_participants(swap_match.id, &new_participants(group))
        .await
    {
        Ok(participants) => participants,
        Err(e) => {
            warn!(match_id = %swap_match.id, error = %e, "Participant insert failed, rolling back match");
            compensate_insert_match(swap_match.id, deps)
                .await
                .inspect_err(|rollback| error!(match_id = %swap_match.id, error = %rollback, "Rollback failed"))?;
            return Ok(MatchCreation::RolledBack {
                match_id: swap_match.id,
                reason: e.to_string(),
            });
        }
    };

    info!(match_id = %swap_match.id, participants = participants.len(), "Match created");

    if let Err(e) = deps
        .notifier
        .notify_match_created(&swap_match, &participants)
        .await
    {
        warn!(match_id = %swap_match.id, error = %e, "Match created notification failed");
    }

    Ok(MatchCreation::Created {
        swap_match,
        participants,
    })
}
