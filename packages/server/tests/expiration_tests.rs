//! Integration tests for the expiration sweep.

mod common;

use chrono::{Duration, Utc};
use swap_core::common::{RequestId, UserId};
use swap_core::domains::matching::expire_old_matches;
use swap_core::domains::matching::models::{MatchStatus, MatchType};
use test_context::test_context;

use crate::common::MatchingHarness;

fn members() -> Vec<(RequestId, UserId)> {
    vec![(RequestId::new(), UserId::new()), (RequestId::new(), UserId::new())]
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn sweep_expires_only_overdue_pending_matches(ctx: &mut MatchingHarness) {
    let store = &ctx.test_deps.store;
    let past = Utc::now() - Duration::hours(1);
    let future = Utc::now() + Duration::days(3);

    let overdue = store.seed_match(MatchType::TwoWay, MatchStatus::Pending, past, &members());
    let open = store.seed_match(MatchType::TwoWay, MatchStatus::Pending, future, &members());
    let accepted = store.seed_match(MatchType::TwoWay, MatchStatus::Accepted, past, &members());
    let rejected = store.seed_match(MatchType::CircularThree, MatchStatus::Rejected, past, &members());

    let expired = expire_old_matches(&ctx.deps()).await.unwrap();

    assert_eq!(expired, 1);
    assert_eq!(store.match_by_id(overdue.id).unwrap().status, MatchStatus::Expired);
    assert_eq!(store.match_by_id(open.id).unwrap().status, MatchStatus::Pending);
    assert_eq!(store.match_by_id(accepted.id).unwrap().status, MatchStatus::Accepted);
    assert_eq!(store.match_by_id(rejected.id).unwrap().status, MatchStatus::Rejected);
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn second_sweep_finds_nothing_to_do(ctx: &mut MatchingHarness) {
    let past = Utc::now() - Duration::hours(1);
    ctx.test_deps
        .store
        .seed_match(MatchType::TwoWay, MatchStatus::Pending, past, &members());
    ctx.test_deps
        .store
        .seed_match(MatchType::TwoWay, MatchStatus::Pending, past, &members());
    let deps = ctx.deps();

    let first = expire_old_matches(&deps).await.unwrap();
    let second = expire_old_matches(&deps).await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn empty_store_expires_nothing(ctx: &mut MatchingHarness) {
    assert_eq!(expire_old_matches(&ctx.deps()).await.unwrap(), 0);
}
