// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Scoring, allocation and state transitions live in domains/matching and only
// reach storage and delivery through these seams.
//
// Naming convention: Base* for trait names (e.g., BaseMatchStore, BaseMatchNotifier)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::common::{MatchId, ParticipantId, RequestId, UserId};
use crate::domains::matching::models::{
    MatchStatus, NewParticipant, NewSwapMatch, Participant, ResponseStatus, SwapMatch, UserSummary,
};
use crate::domains::transfers::{TransferRequest, TransferStatus};

// =============================================================================
// Match Store Trait (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseMatchStore: Send + Sync {
    /// Submitted, unexpired requests, enriched and in a stable order.
    async fn fetch_submitted_requests(&self, now: DateTime<Utc>) -> Result<Vec<TransferRequest>>;

    /// Requests attached to a pending or accepted match.
    async fn fetch_active_request_ids(&self) -> Result<HashSet<RequestId>>;

    async fn insert_match(&self, new: &NewSwapMatch) -> Result<SwapMatch>;

    /// Insert every participant of a match or none of them.
    async fn insert_participants(
        &self,
        match_id: MatchId,
        participants: &[NewParticipant],
    ) -> Result<Vec<Participant>>;

    async fn delete_match(&self, match_id: MatchId) -> Result<()>;

    async fn find_match(&self, match_id: MatchId) -> Result<Option<SwapMatch>>;

    /// Participants ordered by swap position.
    async fn find_participants(&self, match_id: MatchId) -> Result<Vec<Participant>>;

    /// Record a response on a still-pending participant. `None` if it was not pending.
    async fn record_response(
        &self,
        participant_id: ParticipantId,
        response: ResponseStatus,
        responded_at: DateTime<Utc>,
    ) -> Result<Option<Participant>>;

    /// Move a match from `from` to `to`. `None` if it was no longer in `from`.
    async fn transition_match(
        &self,
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<Option<SwapMatch>>;

    /// Move requests to `next` where their current status allows it.
    async fn set_request_status(&self, ids: &[RequestId], next: TransferStatus) -> Result<u64>;

    /// Expire pending matches whose horizon is before `now`.
    async fn expire_pending_matches(&self, now: DateTime<Utc>) -> Result<u64>;

    async fn find_user_summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>>;
}

// =============================================================================
// Match Notifier Trait (Infrastructure - best effort delivery)
// =============================================================================

/// Callers log failures and move on; no notification outcome changes match state.
#[async_trait]
pub trait BaseMatchNotifier: Send + Sync {
    async fn notify_match_created(&self, swap_match: &SwapMatch, participants: &[Participant]) -> Result<()>;

    async fn notify_match_accepted(&self, swap_match: &SwapMatch, participants: &[Participant]) -> Result<()>;

    async fn notify_match_rejected(
        &self,
        swap_match: &SwapMatch,
        participants: &[Participant],
        rejected_by: UserId,
    ) -> Result<()>;
}

// =============================================================================
// Push Notification Trait (Infrastructure)
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub push_token: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait BasePushNotificationService: Send + Sync {
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<()>;
}
