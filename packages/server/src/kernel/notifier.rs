//! Push-backed match notifications.
//!
//! Looks up each participant's push token and hands the batch to the push
//! service on a spawned task, so the caller only waits for the user lookup.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::UserId;
use crate::domains::matching::models::{MatchType, Participant, SwapMatch};
use crate::kernel::{BaseMatchNotifier, BaseMatchStore, BasePushNotificationService, PushMessage};

pub struct PushMatchNotifier {
    store: Arc<dyn BaseMatchStore>,
    push: Arc<dyn BasePushNotificationService>,
}

impl PushMatchNotifier {
    pub fn new(store: Arc<dyn BaseMatchStore>, push: Arc<dyn BasePushNotificationService>) -> Self {
        Self { store, push }
    }

    /// Build one message per participant that has a push token.
    async fn messages_for(
        &self,
        swap_match: &SwapMatch,
        participants: &[Participant],
        event: &str,
        title: &str,
        body: &str,
    ) -> Result<Vec<PushMessage>> {
        let user_ids: Vec<UserId> = participants.iter().map(|p| p.user_id).collect();
        let tokens: HashMap<UserId, String> = self
            .store
            .find_user_summaries(&user_ids)
            .await?
            .into_iter()
            .filter_map(|user| user.push_token.map(|token| (user.id, token)))
            .collect();

        Ok(participants
            .iter()
            .filter_map(|participant| {
                let Some(token) = tokens.get(&participant.user_id) else {
                    debug!(user_id = %participant.user_id, "No push token, skipping");
                    return None;
                };
                Some(PushMessage {
                    push_token: token.clone(),
                    title: title.to_string(),
                    body: body.to_string(),
                    data: serde_json::json!({
                        "event": event,
                        "match_id": swap_match.id,
                        "match_type": swap_match.match_type,
                        "swap_position": participant.swap_position,
                    }),
                })
            })
            .collect())
    }

    fn dispatch(&self, messages: Vec<PushMessage>) {
        if messages.is_empty() {
            return;
        }

        let push = self.push.clone();
        tokio::spawn(async move {
            if let Err(e) = push.send_batch(&messages).await {
                warn!(error = %e, count = messages.len(), "Push delivery failed");
            }
        });
    }
}

fn describe(match_type: MatchType) -> &'static str {
    match match_type {
        MatchType::TwoWay => "a two-way swap",
        MatchType::CircularThree => "a three-way circular swap",
    }
}

#[async_trait]
impl BaseMatchNotifier for PushMatchNotifier {
    async fn notify_match_created(&self, swap_match: &SwapMatch, participants: &[Participant]) -> Result<()> {
        let body = format!(
            "We found {} for your transfer request. Respond before it expires.",
            describe(swap_match.match_type)
        );
        let messages = self
            .messages_for(swap_match, participants, "match_created", "New transfer match", &body)
            .await?;
        self.dispatch(messages);
        Ok(())
    }

    async fn notify_match_accepted(&self, swap_match: &SwapMatch, participants: &[Participant]) -> Result<()> {
        let messages = self
            .messages_for(
                swap_match,
                participants,
                "match_accepted",
                "Transfer swap confirmed",
                "Everyone accepted the swap.",
            )
            .await?;
        self.dispatch(messages);
        Ok(())
    }

    async fn notify_match_rejected(
        &self,
        swap_match: &SwapMatch,
        participants: &[Participant],
        rejected_by: UserId,
    ) -> Result<()> {
        // The participant who rejected does not need to hear about it.
        let others: Vec<Participant> = participants
            .iter()
            .filter(|p| p.user_id != rejected_by)
            .cloned()
            .collect();
        let messages = self
            .messages_for(
                swap_match,
                &others,
                "match_rejected",
                "Transfer match declined",
                "The proposed swap was declined. Your request is back in the pool.",
            )
            .await?;
        self.dispatch(messages);
        Ok(())
    }
}
