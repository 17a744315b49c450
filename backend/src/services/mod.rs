//! Collaborators the orchestrator drives: notification senders, the content
//! generator and the lead scorer.
//!
//! Each collaborator sits behind a trait so the orchestrator can be built
//! with real transports in `main` and with mocks in tests.

pub mod content;
pub mod email;
pub mod lead_scoring;
pub mod metrics;
pub mod teams;

use async_trait::async_trait;
use leadflow_shared::{ContentRequest, GeneratedContent, Lead, LeadScore, ProposalDraft};
use tracing::warn;

pub use content::HttpContentGenerator;
pub use email::SmtpEmailSender;
pub use lead_scoring::{HeuristicLeadScorer, ScoringError};
pub use metrics::{MetricsRegistry, Timer};
pub use teams::WebhookChatSender;

/// Outbound email. `true` means accepted for delivery, not delivered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> bool;
}

/// Team chat notification. `true` means the channel accepted the message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, title: &str, message: &str) -> bool;
}

/// Content generation never fails; unavailable backends yield a degraded
/// fallback instead.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: ContentRequest) -> GeneratedContent;

    async fn generate_proposal(&self, lead: &Lead) -> ProposalDraft;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadScorer: Send + Sync {
    async fn score(&self, lead: &Lead) -> Result<LeadScore, ScoringError>;
}

/// Stand-in for a channel that has no transport configured
#[derive(Debug, Clone)]
pub struct DisabledSender {
    channel: &'static str,
}

impl DisabledSender {
    pub fn new(channel: &'static str) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl EmailSender for DisabledSender {
    async fn send(&self, recipient: &str, _subject: &str, _body: &str) -> bool {
        warn!("{} sender is not configured; dropping message to {}", self.channel, recipient);
        false
    }
}

#[async_trait]
impl ChatSender for DisabledSender {
    async fn send(&self, title: &str, _message: &str) -> bool {
        warn!("{} sender is not configured; dropping '{}'", self.channel, title);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_sender_rejects() {
        let sender = DisabledSender::new("email");
        assert!(!EmailSender::send(&sender, "ada@example.com", "Hi", "Body").await);
        assert!(!ChatSender::send(&sender, "Title", "Body").await);
    }
}
