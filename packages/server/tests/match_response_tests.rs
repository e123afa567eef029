//! Integration tests for accepting and rejecting a pending match.

mod common;

use chrono::{Duration, Utc};
use swap_core::common::{MatchId, UserId};
use swap_core::domains::matching::models::{MatchStatus, MatchType, ResponseStatus, SwapMatch};
use swap_core::domains::matching::{accept_match, reject_match, MatchingError};
use swap_core::domains::transfers::{TransferRequest, TransferStatus};
use swap_core::kernel::test_dependencies::{InMemoryMatchStore, NotifierCall};
use test_context::test_context;

use crate::common::MatchingHarness;

/// Store the requests and seed a pending match over them, in order.
fn seed_pending(ctx: &MatchingHarness, requests: &[TransferRequest]) -> SwapMatch {
    for request in requests {
        ctx.test_deps.store.add_request(request.clone());
    }
    let members: Vec<_> = requests.iter().map(|r| (r.id, r.user_id)).collect();
    let match_type = if requests.len() == 3 {
        MatchType::CircularThree
    } else {
        MatchType::TwoWay
    };
    ctx.test_deps
        .store
        .seed_match(match_type, MatchStatus::Pending, Utc::now() + Duration::days(7), &members)
}

// =============================================================================
// Accept
// =============================================================================

#[test_context(MatchingHarness)]
#[tokio::test]
async fn first_acceptance_keeps_match_pending(ctx: &mut MatchingHarness) {
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1.clone(), r2.clone()]);

    let participant = accept_match(swap_match.id, r1.user_id, &ctx.deps()).await.unwrap();

    assert_eq!(participant.user_id, r1.user_id);
    assert_eq!(participant.response_status, ResponseStatus::Accepted);
    assert!(participant.responded_at.is_some());

    let stored = ctx.test_deps.store.match_by_id(swap_match.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Pending);
    assert_eq!(ctx.test_deps.store.request_status(r1.id), Some(TransferStatus::Submitted));
    assert!(ctx.test_deps.notifier.calls().is_empty());
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn acceptance_by_everyone_confirms_match_and_marks_requests_matched(ctx: &mut MatchingHarness) {
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1.clone(), r2.clone()]);
    let deps = ctx.deps();

    accept_match(swap_match.id, r1.user_id, &deps).await.unwrap();
    let last = accept_match(swap_match.id, r2.user_id, &deps).await.unwrap();

    assert_eq!(last.response_status, ResponseStatus::Accepted);
    let stored = ctx.test_deps.store.match_by_id(swap_match.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Accepted);
    assert_eq!(ctx.test_deps.store.request_status(r1.id), Some(TransferStatus::Matched));
    assert_eq!(ctx.test_deps.store.request_status(r2.id), Some(TransferStatus::Matched));
    assert_eq!(
        ctx.test_deps.notifier.calls(),
        vec![NotifierCall::Accepted(swap_match.id)]
    );
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn simultaneous_last_acceptances_still_confirm_match(ctx: &mut MatchingHarness) {
    ctx.test_deps = ctx
        .test_deps
        .clone()
        .mock_store(InMemoryMatchStore::new().yielding());
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1.clone(), r2.clone()]);
    let deps = ctx.deps();

    let (first, second) = tokio::join!(
        accept_match(swap_match.id, r1.user_id, &deps),
        accept_match(swap_match.id, r2.user_id, &deps),
    );
    first.unwrap();
    second.unwrap();

    assert!(ctx
        .test_deps
        .store
        .participants_of(swap_match.id)
        .iter()
        .all(|p| p.response_status == ResponseStatus::Accepted));
    let stored = ctx.test_deps.store.match_by_id(swap_match.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Accepted);
    assert_eq!(ctx.test_deps.store.request_status(r1.id), Some(TransferStatus::Matched));
    assert_eq!(ctx.test_deps.store.request_status(r2.id), Some(TransferStatus::Matched));
    assert_eq!(
        ctx.test_deps.notifier.calls(),
        vec![NotifierCall::Accepted(swap_match.id)]
    );
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn request_status_failure_does_not_undo_confirmation(ctx: &mut MatchingHarness) {
    ctx.test_deps = ctx
        .test_deps
        .clone()
        .mock_store(InMemoryMatchStore::new().fail_request_status_updates());
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1.clone(), r2.clone()]);
    let deps = ctx.deps();

    accept_match(swap_match.id, r1.user_id, &deps).await.unwrap();
    let last = accept_match(swap_match.id, r2.user_id, &deps).await.unwrap();

    assert_eq!(last.response_status, ResponseStatus::Accepted);
    let stored = ctx.test_deps.store.match_by_id(swap_match.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Accepted);
    assert_eq!(ctx.test_deps.store.request_status(r1.id), Some(TransferStatus::Submitted));
    assert_eq!(
        ctx.test_deps.notifier.calls(),
        vec![NotifierCall::Accepted(swap_match.id)]
    );
}

// =============================================================================
// Reject
// =============================================================================

#[test_context(MatchingHarness)]
#[tokio::test]
async fn one_rejection_voids_three_way_match_after_two_acceptances(ctx: &mut MatchingHarness) {
    let (a, b, c) = ctx.scenario.ring();
    let swap_match = seed_pending(ctx, &[a.clone(), b.clone(), c.clone()]);
    let deps = ctx.deps();

    accept_match(swap_match.id, a.user_id, &deps).await.unwrap();
    accept_match(swap_match.id, b.user_id, &deps).await.unwrap();
    let rejecter = reject_match(swap_match.id, c.user_id, &deps).await.unwrap();

    assert_eq!(rejecter.response_status, ResponseStatus::Rejected);
    let stored = ctx.test_deps.store.match_by_id(swap_match.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Rejected);
    for request in [&a, &b, &c] {
        assert_eq!(
            ctx.test_deps.store.request_status(request.id),
            Some(TransferStatus::Submitted)
        );
    }
    assert_eq!(
        ctx.test_deps.notifier.calls(),
        vec![NotifierCall::Rejected {
            match_id: swap_match.id,
            rejected_by: c.user_id,
        }]
    );
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn rejected_match_releases_requests_to_the_next_run(ctx: &mut MatchingHarness) {
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1.clone(), r2.clone()]);
    let deps = ctx.deps();

    reject_match(swap_match.id, r2.user_id, &deps).await.unwrap();
    let summary = swap_core::domains::matching::run_matching_algorithm(&deps)
        .await
        .unwrap();

    assert_eq!(summary.requests_processed, 2);
    assert_eq!(summary.matches_created, 1);
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn request_status_failure_does_not_undo_rejection(ctx: &mut MatchingHarness) {
    ctx.test_deps = ctx
        .test_deps
        .clone()
        .mock_store(InMemoryMatchStore::new().fail_request_status_updates());
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1.clone(), r2]);

    let rejecter = reject_match(swap_match.id, r1.user_id, &ctx.deps()).await.unwrap();

    assert_eq!(rejecter.response_status, ResponseStatus::Rejected);
    let stored = ctx.test_deps.store.match_by_id(swap_match.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Rejected);
    assert_eq!(ctx.test_deps.notifier.calls().len(), 1);
}

// =============================================================================
// Conflicts
// =============================================================================

#[test_context(MatchingHarness)]
#[tokio::test]
async fn unknown_match_is_not_found(ctx: &mut MatchingHarness) {
    let missing = MatchId::new();

    let err = accept_match(missing, UserId::new(), &ctx.deps()).await.unwrap_err();

    assert!(matches!(err, MatchingError::MatchNotFound(id) if id == missing));
    assert!(err.is_client_error());
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn outsider_cannot_respond(ctx: &mut MatchingHarness) {
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1, r2]);
    let outsider = UserId::new();

    let err = reject_match(swap_match.id, outsider, &ctx.deps()).await.unwrap_err();

    assert!(matches!(err, MatchingError::NotParticipant { user_id, .. } if user_id == outsider));
    let stored = ctx.test_deps.store.match_by_id(swap_match.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Pending);
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn second_response_from_the_same_participant_is_refused(ctx: &mut MatchingHarness) {
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1.clone(), r2]);
    let deps = ctx.deps();

    accept_match(swap_match.id, r1.user_id, &deps).await.unwrap();
    let err = reject_match(swap_match.id, r1.user_id, &deps).await.unwrap_err();

    assert!(matches!(err, MatchingError::AlreadyResponded { .. }));
    let stored = ctx.test_deps.store.match_by_id(swap_match.id).unwrap();
    assert_eq!(stored.status, MatchStatus::Pending);
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn finished_match_cannot_be_answered(ctx: &mut MatchingHarness) {
    let (r1, r2) = ctx.scenario.mutual_pair();
    let swap_match = seed_pending(ctx, &[r1.clone(), r2.clone()]);
    let deps = ctx.deps();

    reject_match(swap_match.id, r1.user_id, &deps).await.unwrap();
    let err = accept_match(swap_match.id, r2.user_id, &deps).await.unwrap_err();

    assert!(matches!(
        err,
        MatchingError::StateConflict {
            status: MatchStatus::Rejected,
            ..
        }
    ));
    let seat = ctx
        .test_deps
        .store
        .participants_of(swap_match.id)
        .into_iter()
        .find(|p| p.user_id == r2.user_id)
        .unwrap();
    assert_eq!(seat.response_status, ResponseStatus::Pending);
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn overdue_match_is_treated_as_expired_before_the_sweep(ctx: &mut MatchingHarness) {
    let (r1, r2) = ctx.scenario.mutual_pair();
    ctx.test_deps.store.add_request(r1.clone());
    ctx.test_deps.store.add_request(r2.clone());
    let swap_match = ctx.test_deps.store.seed_match(
        MatchType::TwoWay,
        MatchStatus::Pending,
        Utc::now() - Duration::minutes(5),
        &[(r1.id, r1.user_id), (r2.id, r2.user_id)],
    );

    let err = accept_match(swap_match.id, r1.user_id, &ctx.deps()).await.unwrap_err();

    assert!(matches!(
        err,
        MatchingError::StateConflict {
            status: MatchStatus::Expired,
            ..
        }
    ));
    assert!(ctx
        .test_deps
        .store
        .participants_of(swap_match.id)
        .iter()
        .all(|p| p.response_status == ResponseStatus::Pending));
}
