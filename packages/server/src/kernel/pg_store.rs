//! Postgres implementation of `BaseMatchStore`.
//!
//! Thin adapter: the SQL lives on the models, this only forwards.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashSet;

use crate::common::{MatchId, ParticipantId, RequestId, UserId};
use crate::domains::matching::models::{
    MatchStatus, NewParticipant, NewSwapMatch, Participant, ResponseStatus, SwapMatch, UserSummary,
};
use crate::domains::transfers::{TransferRequest, TransferStatus};
use crate::kernel::BaseMatchStore;

#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseMatchStore for PgMatchStore {
    async fn fetch_submitted_requests(&self, now: DateTime<Utc>) -> Result<Vec<TransferRequest>> {
        TransferRequest::find_submitted_enriched(now, &self.pool)
            .await
            .context("Failed to load submitted transfer requests")
    }

    async fn fetch_active_request_ids(&self) -> Result<HashSet<RequestId>> {
        let ids = SwapMatch::active_request_ids(&self.pool)
            .await
            .context("Failed to load requests held by active matches")?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_match(&self, new: &NewSwapMatch) -> Result<SwapMatch> {
        SwapMatch::create(new, &self.pool).await
    }

    async fn insert_participants(
        &self,
        match_id: MatchId,
        participants: &[NewParticipant],
    ) -> Result<Vec<Participant>> {
        Participant::create_many(match_id, participants, &self.pool).await
    }

    async fn delete_match(&self, match_id: MatchId) -> Result<()> {
        let deleted = SwapMatch::delete(match_id, &self.pool).await?;
        if !deleted {
            anyhow::bail!("Match {} was already gone", match_id);
        }
        Ok(())
    }

    async fn find_match(&self, match_id: MatchId) -> Result<Option<SwapMatch>> {
        SwapMatch::find_by_id(match_id, &self.pool).await
    }

    async fn find_participants(&self, match_id: MatchId) -> Result<Vec<Participant>> {
        Participant::find_by_match(match_id, &self.pool).await
    }

    async fn record_response(
        &self,
        participant_id: ParticipantId,
        response: ResponseStatus,
        responded_at: DateTime<Utc>,
    ) -> Result<Option<Participant>> {
        Participant::record_response(participant_id, response, responded_at, &self.pool).await
    }

    async fn transition_match(
        &self,
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<Option<SwapMatch>> {
        SwapMatch::transition(match_id, from, to, &self.pool).await
    }

    async fn set_request_status(&self, ids: &[RequestId], next: TransferStatus) -> Result<u64> {
        TransferRequest::update_status_many(ids, next, &self.pool).await
    }

    async fn expire_pending_matches(&self, now: DateTime<Utc>) -> Result<u64> {
        SwapMatch::expire_overdue(now, &self.pool).await
    }

    async fn find_user_summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>> {
        UserSummary::find_by_ids(ids, &self.pool).await
    }
}
