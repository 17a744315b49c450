//! Teams-style chat notifications
//!
//! Posts adaptive cards to an incoming webhook.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use super::ChatSender;

/// Teams Adaptive Card for rich notifications
#[derive(Debug, Clone, Serialize)]
pub struct TeamsAdaptiveCard {
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub body: Vec<TeamsCardElement>,
}

impl Default for TeamsAdaptiveCard {
    fn default() -> Self {
        Self {
            card_type: "AdaptiveCard".to_string(),
            schema: "http://adaptivecards.io/schemas/adaptive-card.json".to_string(),
            version: "1.4".to_string(),
            body: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TeamsCardElement {
    TextBlock {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        weight: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        wrap: Option<bool>,
    },
    FactSet {
        facts: Vec<TeamsFact>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamsFact {
    pub title: String,
    pub value: String,
}

/// Wrapper for Teams webhook payload
#[derive(Debug, Clone, Serialize)]
pub struct TeamsWebhookPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub attachments: Vec<TeamsAttachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamsAttachment {
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub content: TeamsAdaptiveCard,
}

impl TeamsWebhookPayload {
    pub fn from_card(card: TeamsAdaptiveCard) -> Self {
        Self {
            payload_type: "message".to_string(),
            attachments: vec![TeamsAttachment {
                content_type: "application/vnd.microsoft.card.adaptive".to_string(),
                content: card,
            }],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Webhook rejected message: {0}")]
    WebhookFailed(String),
}

/// Chat sender backed by an incoming webhook
pub struct WebhookChatSender {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookChatSender {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.to_string(),
        }
    }

    pub fn build_card(title: &str, message: &str) -> TeamsAdaptiveCard {
        TeamsAdaptiveCard {
            body: vec![
                TeamsCardElement::TextBlock {
                    text: title.to_string(),
                    size: Some("medium".to_string()),
                    weight: Some("bolder".to_string()),
                    wrap: None,
                },
                TeamsCardElement::TextBlock {
                    text: message.to_string(),
                    size: None,
                    weight: None,
                    wrap: Some(true),
                },
                TeamsCardElement::FactSet {
                    facts: vec![
                        TeamsFact {
                            title: "Source".to_string(),
                            value: "Leadflow".to_string(),
                        },
                        TeamsFact {
                            title: "Sent".to_string(),
                            value: Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
                        },
                    ],
                },
            ],
            ..Default::default()
        }
    }

    /// Send a notification to the webhook
    pub async fn send_webhook(&self, payload: &TeamsWebhookPayload) -> Result<(), ChatError> {
        let response = self.client.post(&self.webhook_url).json(payload).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ChatError::WebhookFailed(format!(
                "Status: {}, Body: {}",
                status, body
            )))
        }
    }
}

#[async_trait]
impl ChatSender for WebhookChatSender {
    async fn send(&self, title: &str, message: &str) -> bool {
        let payload = TeamsWebhookPayload::from_card(Self::build_card(title, message));
        match self.send_webhook(&payload).await {
            Ok(()) => {
                info!("Chat notification sent: {}", title);
                true
            }
            Err(e) => {
                error!("Failed to send chat notification: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_card_shape() {
        let payload =
            TeamsWebhookPayload::from_card(WebhookChatSender::build_card("New lead", "Ada"));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "message");
        let card = &json["attachments"][0]["content"];
        assert_eq!(card["type"], "AdaptiveCard");
        assert_eq!(card["body"][0]["type"], "TextBlock");
        assert_eq!(card["body"][0]["text"], "New lead");
        assert_eq!(card["body"][2]["type"], "FactSet");
    }

    #[tokio::test]
    async fn test_send_posts_card_to_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({ "type": "message" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = WebhookChatSender::new(&format!("{}/hook", server.uri()));
        assert!(sender.send("Workflow", "Lead qualified").await);
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad card"))
            .mount(&server)
            .await;

        let sender = WebhookChatSender::new(&server.uri());
        assert!(matches!(
            sender
                .send_webhook(&TeamsWebhookPayload::from_card(TeamsAdaptiveCard::default()))
                .await,
            Err(ChatError::WebhookFailed(_))
        ));
        assert!(!sender.send("Workflow", "Lead qualified").await);
    }
}
