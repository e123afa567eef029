use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::kernel::{BasePushNotificationService, PushMessage};

const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Expo rejects requests with more messages than this.
const EXPO_MAX_BATCH: usize = 100;

/// Expo push client used to tell participants about match proposals and outcomes.
pub struct ExpoClient {
    client: Client,
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExpoMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a serde_json::Value,
    sound: &'static str,
}

impl<'a> From<&'a PushMessage> for ExpoMessage<'a> {
    fn from(message: &'a PushMessage) -> Self {
        Self {
            to: &message.push_token,
            title: &message.title,
            body: &message.body,
            data: &message.data,
            sound: "default",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    data: Vec<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    #[allow(dead_code)]
    message: Option<String>,
}

impl ExpoClient {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            access_token,
        }
    }

    async fn send_chunk(&self, messages: &[PushMessage]) -> Result<()> {
        let payload: Vec<ExpoMessage<'_>> = messages.iter().map(ExpoMessage::from).collect();

        let mut request = self.client.post(EXPO_PUSH_URL).json(&payload);
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            error!(%status, body = %body, "Expo push request failed");
            anyhow::bail!("Expo push API error {}: {}", status, body);
        }

        let expo_response: ExpoResponse = response.json().await?;
        let failed = expo_response
            .data
            .iter()
            .filter(|ticket| ticket.status == "error")
            .inspect(|ticket| error!(?ticket, "Expo ticket error"))
            .count();

        info!(
            sent = expo_response.data.len() - failed,
            failed, "Expo push batch delivered"
        );

        Ok(())
    }
}

#[async_trait]
impl BasePushNotificationService for ExpoClient {
    /// Sends in requests of at most 100 messages. Ticket-level errors are
    /// logged, only transport or HTTP failures are returned.
    async fn send_batch(&self, messages: &[PushMessage]) -> Result<()> {
        for chunk in messages.chunks(EXPO_MAX_BATCH) {
            self.send_chunk(chunk).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expo_message_borrows_push_fields() {
        let message = PushMessage {
            push_token: "ExponentPushToken[abc]".to_string(),
            title: "New swap proposal".to_string(),
            body: "Open the app to respond".to_string(),
            data: serde_json::json!({"match_id": "m"}),
        };

        let json = serde_json::to_value(ExpoMessage::from(&message)).unwrap();
        assert_eq!(json["to"], "ExponentPushToken[abc]");
        assert_eq!(json["sound"], "default");
        assert_eq!(json["data"]["match_id"], "m");
    }

    #[tokio::test]
    #[ignore] // Requires valid Expo push token
    async fn sends_to_real_token() {
        let client = ExpoClient::new(None);
        let token = std::env::var("TEST_EXPO_TOKEN").expect("TEST_EXPO_TOKEN not set");

        let result = client
            .send_batch(&[PushMessage {
                push_token: token,
                title: "Test".to_string(),
                body: "Swap engine test message".to_string(),
                data: serde_json::json!({"test": true}),
            }])
            .await;

        assert!(result.is_ok());
    }
}
