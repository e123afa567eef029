//! Integration tests for push delivery of match events.

mod common;

use std::time::Duration;

use swap_core::domains::matching::{reject_match, run_matching_algorithm};
use swap_core::kernel::test_dependencies::MockPushNotificationService;
use swap_core::kernel::PushMessage;
use test_context::test_context;

use crate::common::{user, MatchingHarness};

/// Push sends run on a spawned task; give it a moment to land.
async fn wait_for_messages(push: &MockPushNotificationService, count: usize) -> Vec<PushMessage> {
    for _ in 0..50 {
        let sent = push.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    push.sent()
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn created_match_is_pushed_to_participants_with_tokens(ctx: &mut MatchingHarness) {
    let (r1, r2) = ctx.scenario.mutual_pair();
    let store = &ctx.test_deps.store;
    store.add_request(r1.clone());
    store.add_request(r2.clone());
    store.add_user(user(r1.user_id, Some("ExponentPushToken[r1]")));
    // r2's owner never registered a device.
    store.add_user(user(r2.user_id, None));

    let summary = run_matching_algorithm(&ctx.test_deps.push_deps()).await.unwrap();
    assert_eq!(summary.matches_created, 1);

    let sent = wait_for_messages(&ctx.test_deps.push_service, 1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].push_token, "ExponentPushToken[r1]");
    assert_eq!(sent[0].title, "New transfer match");
    assert_eq!(sent[0].data["event"], "match_created");
    assert_eq!(sent[0].data["match_type"], "two_way");
    assert_eq!(sent[0].data["swap_position"], 1);
}

#[test_context(MatchingHarness)]
#[tokio::test]
async fn rejection_is_pushed_to_everyone_but_the_rejecter(ctx: &mut MatchingHarness) {
    let (a, b, c) = ctx.scenario.ring();
    let store = &ctx.test_deps.store;
    for (request, token) in [(&a, "token-a"), (&b, "token-b"), (&c, "token-c")] {
        store.add_request(request.clone());
        store.add_user(user(request.user_id, Some(token)));
    }
    let deps = ctx.test_deps.push_deps();

    run_matching_algorithm(&deps).await.unwrap();
    wait_for_messages(&ctx.test_deps.push_service, 3).await;

    let swap_match = ctx.test_deps.store.matches().remove(0);
    reject_match(swap_match.id, b.user_id, &deps).await.unwrap();

    let sent = wait_for_messages(&ctx.test_deps.push_service, 5).await;
    let rejections: Vec<&PushMessage> = sent
        .iter()
        .filter(|m| m.data["event"] == "match_rejected")
        .collect();
    assert_eq!(rejections.len(), 2);
    assert!(rejections.iter().all(|m| m.push_token != "token-b"));
}
