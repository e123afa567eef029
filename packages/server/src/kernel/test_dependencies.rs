// TestDependencies - mock implementations for testing
//
// Provides an in-memory store, a spy notifier and a mock push service that can
// be injected into ServerDeps for tests. The store mirrors the conditional
// updates of the Postgres queries so activity tests exercise the same rules.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::{
    BaseMatchNotifier, BaseMatchStore, BasePushNotificationService, PushMatchNotifier,
    PushMessage, ServerDeps,
};
use crate::common::{MatchId, ParticipantId, RequestId, UserId};
use crate::config::MatchingConfig;
use crate::domains::matching::models::{
    MatchStatus, MatchType, NewParticipant, NewSwapMatch, Participant, ResponseStatus, SwapMatch,
    UserSummary,
};
use crate::domains::transfers::{TransferRequest, TransferStatus};

// =============================================================================
// In-memory Match Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    requests: Vec<TransferRequest>,
    users: Vec<UserSummary>,
    matches: Vec<SwapMatch>,
    participants: Vec<Participant>,
    fail_request_load: bool,
    fail_delete: bool,
    fail_request_status: bool,
    yield_each_call: bool,
    match_insert_failures: usize,
    participant_insert_failures: usize,
}

#[derive(Default)]
pub struct InMemoryMatchStore {
    state: Mutex<StoreState>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(self, request: TransferRequest) -> Self {
        self.add_request(request);
        self
    }

    pub fn with_user(self, user: UserSummary) -> Self {
        self.add_user(user);
        self
    }

    pub fn add_request(&self, request: TransferRequest) {
        self.state.lock().unwrap().requests.push(request);
    }

    pub fn add_user(&self, user: UserSummary) {
        self.state.lock().unwrap().users.push(user);
    }

    /// Loading candidate requests fails.
    pub fn fail_request_load(self) -> Self {
        self.state.lock().unwrap().fail_request_load = true;
        self
    }

    /// The next `n` match inserts fail before anything is written.
    pub fn fail_match_inserts(self, n: usize) -> Self {
        self.state.lock().unwrap().match_insert_failures = n;
        self
    }

    /// The next `n` participant inserts fail after the match row landed.
    pub fn fail_participant_inserts(self, n: usize) -> Self {
        self.state.lock().unwrap().participant_insert_failures = n;
        self
    }

    /// Deleting a match (the compensating rollback) fails.
    pub fn fail_delete(self) -> Self {
        self.state.lock().unwrap().fail_delete = true;
        self
    }

    /// Bulk request status updates fail.
    pub fn fail_request_status_updates(self) -> Self {
        self.state.lock().unwrap().fail_request_status = true;
        self
    }

    /// Every trait call yields to the runtime first, so joined activities interleave.
    pub fn yielding(self) -> Self {
        self.state.lock().unwrap().yield_each_call = true;
        self
    }

    async fn pause(&self) {
        let yielding = self.state.lock().unwrap().yield_each_call;
        if yielding {
            tokio::task::yield_now().await;
        }
    }

    /// Insert a match with its participants directly, bypassing the factory.
    pub fn seed_match(
        &self,
        match_type: MatchType,
        status: MatchStatus,
        expires_at: DateTime<Utc>,
        members: &[(RequestId, UserId)],
    ) -> SwapMatch {
        let now = Utc::now();
        let swap_match = SwapMatch {
            id: MatchId::new(),
            match_type,
            compatibility_score: 80,
            score_breakdown: serde_json::json!({}),
            algorithm_version: "seeded".to_string(),
            status,
            expires_at,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock().unwrap();
        state.matches.push(swap_match.clone());
        for (position, (request_id, user_id)) in (1..).zip(members) {
            state.participants.push(Participant {
                id: ParticipantId::new(),
                match_id: swap_match.id,
                request_id: *request_id,
                user_id: *user_id,
                swap_position: position,
                response_status: ResponseStatus::Pending,
                responded_at: None,
                created_at: now,
            });
        }
        swap_match
    }

    pub fn matches(&self) -> Vec<SwapMatch> {
        self.state.lock().unwrap().matches.clone()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.state.lock().unwrap().participants.clone()
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<SwapMatch> {
        self.state
            .lock()
            .unwrap()
            .matches
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub fn participants_of(&self, match_id: MatchId) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self
            .state
            .lock()
            .unwrap()
            .participants
            .iter()
            .filter(|p| p.match_id == match_id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.swap_position);
        participants
    }

    pub fn request_status(&self, id: RequestId) -> Option<TransferStatus> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.status)
    }
}

#[async_trait]
impl BaseMatchStore for InMemoryMatchStore {
    async fn fetch_submitted_requests(&self, now: DateTime<Utc>) -> Result<Vec<TransferRequest>> {
        self.pause().await;
        let state = self.state.lock().unwrap();
        if state.fail_request_load {
            bail!("simulated request load failure");
        }

        let mut requests: Vec<TransferRequest> = state
            .requests
            .iter()
            .filter(|r| r.status == TransferStatus::Submitted && !r.is_expired_at(now))
            .cloned()
            .collect();
        requests.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(requests)
    }

    async fn fetch_active_request_ids(&self) -> Result<HashSet<RequestId>> {
        self.pause().await;
        let state = self.state.lock().unwrap();
        let active: HashSet<MatchId> = state
            .matches
            .iter()
            .filter(|m| m.status.is_active())
            .map(|m| m.id)
            .collect();

        Ok(state
            .participants
            .iter()
            .filter(|p| active.contains(&p.match_id))
            .map(|p| p.request_id)
            .collect())
    }

    async fn insert_match(&self, new: &NewSwapMatch) -> Result<SwapMatch> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        if state.match_insert_failures > 0 {
            state.match_insert_failures -= 1;
            bail!("simulated match insert failure");
        }

        let now = Utc::now();
        let swap_match = SwapMatch {
            id: MatchId::new(),
            match_type: new.match_type,
            compatibility_score: new.compatibility_score,
            score_breakdown: new.score_breakdown.clone(),
            algorithm_version: new.algorithm_version.clone(),
            status: MatchStatus::Pending,
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
        };
        state.matches.push(swap_match.clone());
        Ok(swap_match)
    }

    async fn insert_participants(
        &self,
        match_id: MatchId,
        participants: &[NewParticipant],
    ) -> Result<Vec<Participant>> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        if state.participant_insert_failures > 0 {
            state.participant_insert_failures -= 1;
            bail!("simulated participant insert failure");
        }
        if !state.matches.iter().any(|m| m.id == match_id) {
            bail!("match {} does not exist", match_id);
        }

        let mut users = HashSet::new();
        if !participants.iter().all(|p| users.insert(p.user_id)) {
            bail!("duplicate user in match {}", match_id);
        }

        let now = Utc::now();
        let created: Vec<Participant> = participants
            .iter()
            .map(|p| Participant {
                id: ParticipantId::new(),
                match_id,
                request_id: p.request_id,
                user_id: p.user_id,
                swap_position: p.swap_position,
                response_status: ResponseStatus::Pending,
                responded_at: None,
                created_at: now,
            })
            .collect();
        state.participants.extend(created.iter().cloned());
        Ok(created)
    }

    async fn delete_match(&self, match_id: MatchId) -> Result<()> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        if state.fail_delete {
            bail!("simulated delete failure");
        }

        let before = state.matches.len();
        state.matches.retain(|m| m.id != match_id);
        if state.matches.len() == before {
            bail!("Match {} was already gone", match_id);
        }
        state.participants.retain(|p| p.match_id != match_id);
        Ok(())
    }

    async fn find_match(&self, match_id: MatchId) -> Result<Option<SwapMatch>> {
        self.pause().await;
        Ok(self.match_by_id(match_id))
    }

    async fn find_participants(&self, match_id: MatchId) -> Result<Vec<Participant>> {
        self.pause().await;
        Ok(self.participants_of(match_id))
    }

    async fn record_response(
        &self,
        participant_id: ParticipantId,
        response: ResponseStatus,
        responded_at: DateTime<Utc>,
    ) -> Result<Option<Participant>> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        let Some(participant) = state
            .participants
            .iter_mut()
            .find(|p| p.id == participant_id)
        else {
            return Ok(None);
        };

        if !participant.response_status.can_transition_to(response) {
            return Ok(None);
        }
        participant.response_status = response;
        participant.responded_at = Some(responded_at);
        Ok(Some(participant.clone()))
    }

    async fn transition_match(
        &self,
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<Option<SwapMatch>> {
        self.pause().await;
        if !from.can_transition_to(to) {
            return Ok(None);
        }

        let mut state = self.state.lock().unwrap();
        let Some(swap_match) = state
            .matches
            .iter_mut()
            .find(|m| m.id == match_id && m.status == from)
        else {
            return Ok(None);
        };

        swap_match.status = to;
        swap_match.updated_at = Utc::now();
        Ok(Some(swap_match.clone()))
    }

    async fn set_request_status(&self, ids: &[RequestId], next: TransferStatus) -> Result<u64> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        if state.fail_request_status {
            bail!("simulated request status failure");
        }
        let mut changed = 0;
        for request in state.requests.iter_mut() {
            if ids.contains(&request.id) && request.status.can_transition_to(next) {
                request.status = next;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn expire_pending_matches(&self, now: DateTime<Utc>) -> Result<u64> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        let mut expired = 0;
        for swap_match in state.matches.iter_mut() {
            if swap_match.status == MatchStatus::Pending && swap_match.expires_at < now {
                swap_match.status = MatchStatus::Expired;
                swap_match.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn find_user_summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>> {
        self.pause().await;
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Spy Match Notifier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Created(MatchId),
    Accepted(MatchId),
    Rejected { match_id: MatchId, rejected_by: UserId },
}

#[derive(Default)]
pub struct SpyMatchNotifier {
    calls: Mutex<Vec<NotifierCall>>,
    fail: bool,
}

impl SpyMatchNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every call, then returns an error.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: NotifierCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            bail!("simulated notification failure");
        }
        Ok(())
    }
}

#[async_trait]
impl BaseMatchNotifier for SpyMatchNotifier {
    async fn notify_match_created(&self, swap_match: &SwapMatch, _participants: &[Participant]) -> Result<()> {
        self.record(NotifierCall::Created(swap_match.id))
    }

    async fn notify_match_accepted(&self, swap_match: &SwapMatch, _participants: &[Participant]) -> Result<()> {
        self.record(NotifierCall::Accepted(swap_match.id))
    }

    async fn notify_match_rejected(
        &self,
        swap_match: &SwapMatch,
        _participants: &[Participant],
        rejected_by: UserId,
    ) -> Result<()> {
        self.record(NotifierCall::Rejected {
            match_id: swap_match.id,
            rejected_by,
        })
    }
}

// =============================================================================
// Mock Push Notification Service
// =============================================================================

#[derive(Default)]
pub struct MockPushNotificationService {
    sent: Mutex<Vec<PushMessage>>,
}

impl MockPushNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all messages that were sent
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl BasePushNotificationService for MockPushNotificationService {
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<()> {
        self.sent.lock().unwrap().extend(messages.iter().cloned());
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<InMemoryMatchStore>,
    pub notifier: Arc<SpyMatchNotifier>,
    pub push_service: Arc<MockPushNotificationService>,
    pub matching: MatchingConfig,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryMatchStore::new()),
            notifier: Arc::new(SpyMatchNotifier::new()),
            push_service: Arc::new(MockPushNotificationService::new()),
            matching: MatchingConfig::default(),
        }
    }

    /// Set the in-memory store
    pub fn mock_store(mut self, store: InMemoryMatchStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Set the spy notifier
    pub fn mock_notifier(mut self, notifier: SpyMatchNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Set matching knobs
    pub fn matching(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// ServerDeps over the in-memory store and the spy notifier.
    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(self.store.clone(), self.notifier.clone(), self.matching.clone())
    }

    /// ServerDeps with the real push notifier delivering into the mock push service.
    pub fn push_deps(&self) -> ServerDeps {
        let notifier = Arc::new(PushMatchNotifier::new(
            self.store.clone(),
            self.push_service.clone(),
        ));
        ServerDeps::new(self.store.clone(), notifier, self.matching.clone())
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
