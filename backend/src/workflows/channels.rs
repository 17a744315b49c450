// Multi-Channel Coordinator - Staggered, ranked outreach across several channels

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use leadflow_shared::{ClientDescriptors, ContentLength, ContentRequest, Lead, Tone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::services::ContentGenerator;

/// Communication channels a lead can be reached on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Phone,
    #[serde(rename = "linkedin", alias = "professional_network")]
    ProfessionalNetwork,
    #[serde(alias = "slack")]
    Chat,
    Sms,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown channel '{0}'")]
pub struct UnknownChannel(pub String);

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::ProfessionalNetwork => "linkedin",
            Self::Chat => "chat",
            Self::Sms => "sms",
        }
    }

    /// Heuristic baseline before lead-specific boosts
    pub fn baseline_preference(&self) -> f64 {
        match self {
            Self::Email => 0.8,
            Self::Phone => 0.3,
            Self::ProfessionalNetwork => 0.5,
            Self::Chat => 0.2,
            Self::Sms => 0.5,
        }
    }

    fn tone(&self) -> Tone {
        match self {
            Self::ProfessionalNetwork => Tone::Professional,
            _ => Tone::Friendly,
        }
    }

    fn length(&self) -> ContentLength {
        match self {
            Self::Sms => ContentLength::Short,
            _ => ContentLength::Medium,
        }
    }

    fn base_response_rate(&self) -> f64 {
        match self {
            Self::Email => 0.25,
            _ => 0.15,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "linkedin" | "professional_network" => Ok(Self::ProfessionalNetwork),
            "chat" | "slack" => Ok(Self::Chat),
            "sms" => Ok(Self::Sms),
            _ => Err(UnknownChannel(s.to_string())),
        }
    }
}

/// Preference in [0, 1] for reaching this lead on `channel`
pub fn channel_preference(channel: Channel, lead: &Lead) -> f64 {
    let boost = match channel {
        Channel::ProfessionalNetwork if lead.is_enterprise() => 0.2,
        Channel::Chat if lead.is_enterprise() => 0.3,
        _ => 0.0,
    };
    (channel.baseline_preference() + boost).min(1.0)
}

/// One scheduled touchpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStep {
    pub channel: Channel,
    pub timing: DateTime<Utc>,
    pub content: String,
    /// `round(preference * 100)`
    pub priority: u32,
    pub preference: f64,
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPlan {
    /// Highest priority first
    pub execution_plan: Vec<ChannelStep>,
    pub coordination_strategy: String,
    pub expected_outcomes: BTreeMap<Channel, f64>,
}

pub struct MultiChannelCoordinator {
    content: Arc<dyn ContentGenerator>,
    timeout: Duration,
}

impl MultiChannelCoordinator {
    pub fn new(content: Arc<dyn ContentGenerator>, timeout: Duration) -> Self {
        Self { content, timeout }
    }

    pub async fn coordinate(&self, lead: &Lead, channels: &[Channel]) -> ChannelPlan {
        self.coordinate_at(lead, channels, Utc::now()).await
    }

    pub async fn coordinate_at(
        &self,
        lead: &Lead,
        channels: &[Channel],
        now: DateTime<Utc>,
    ) -> ChannelPlan {
        let mut unique: Vec<Channel> = Vec::with_capacity(channels.len());
        for channel in channels {
            if !unique.contains(channel) {
                unique.push(*channel);
            }
        }

        info!(
            "Coordinating {} channels for lead {}",
            unique.len(),
            lead.id
        );

        let contents = join_all(unique.iter().map(|channel| self.channel_content(lead, *channel))).await;

        let mut execution_plan: Vec<ChannelStep> = unique
            .iter()
            .zip(contents)
            .enumerate()
            .map(|(index, (channel, (content, degraded)))| {
                let preference = channel_preference(*channel, lead);
                ChannelStep {
                    channel: *channel,
                    timing: now + ChronoDuration::days(index as i64),
                    content,
                    priority: (preference * 100.0).round() as u32,
                    preference,
                    degraded,
                }
            })
            .collect();

        // stable: equal priorities keep their input order
        execution_plan.sort_by(|a, b| b.priority.cmp(&a.priority));

        ChannelPlan {
            coordination_strategy: coordination_strategy(&execution_plan),
            expected_outcomes: expected_outcomes(&execution_plan),
            execution_plan,
        }
    }

    async fn channel_content(&self, lead: &Lead, channel: Channel) -> (String, bool) {
        let request = ContentRequest {
            content_type: "email_template".to_string(),
            client: ClientDescriptors::from_lead(lead),
            context: format!("Channel-specific content for {}", channel),
            tone: channel.tone(),
            length: channel.length(),
        };

        match tokio::time::timeout(self.timeout, self.content.generate(request)).await {
            Ok(generated) if !generated.content.trim().is_empty() => {
                (generated.content, generated.degraded)
            }
            Ok(_) => (placeholder(lead, channel), true),
            Err(_) => {
                warn!(
                    degraded = true,
                    "Content for {} timed out after {:?}; using placeholder", channel, self.timeout
                );
                (placeholder(lead, channel), true)
            }
        }
    }
}

fn placeholder(lead: &Lead, channel: Channel) -> String {
    format!("Personalized {} message for {}", channel, lead.name)
}

fn coordination_strategy(plan: &[ChannelStep]) -> String {
    if plan.len() <= 1 {
        return "Single channel approach".to_string();
    }

    let sequence: Vec<&str> = plan.iter().map(|step| step.channel.as_str()).collect();
    format!("Multi-channel sequence: {}", sequence.join(" → "))
}

/// Rough response rate per channel
fn expected_outcomes(plan: &[ChannelStep]) -> BTreeMap<Channel, f64> {
    plan.iter()
        .map(|step| {
            let rate = step.channel.base_response_rate() + f64::from(step.priority) / 1000.0;
            (step.channel, rate.min(0.8))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockContentGenerator;
    use leadflow_shared::GeneratedContent;

    fn echo_generator() -> MockContentGenerator {
        let mut content = MockContentGenerator::new();
        content.expect_generate().returning(|request| {
            let mut generated = GeneratedContent::fallback(&request, "Acme Docs Collective");
            generated.content = format!("{} / {:?}", request.context, request.tone);
            generated.degraded = false;
            generated
        });
        content
    }

    fn coordinator(content: MockContentGenerator) -> MultiChannelCoordinator {
        MultiChannelCoordinator::new(Arc::new(content), Duration::from_millis(200))
    }

    fn enterprise_lead() -> Lead {
        let mut lead = Lead::new("Ada Lovelace", "ada@analytical.io");
        lead.company_size = Some("enterprise".to_string());
        lead
    }

    #[test]
    fn test_channel_names_parse_with_aliases() {
        assert_eq!("slack".parse::<Channel>().unwrap(), Channel::Chat);
        assert_eq!("LinkedIn".parse::<Channel>().unwrap(), Channel::ProfessionalNetwork);
        assert_eq!(
            "professional_network".parse::<Channel>().unwrap(),
            Channel::ProfessionalNetwork
        );
        assert!("fax".parse::<Channel>().is_err());

        let parsed: Channel = serde_json::from_value(serde_json::json!("slack")).unwrap();
        assert_eq!(parsed, Channel::Chat);
    }

    #[test]
    fn test_enterprise_boosts_chat_and_network() {
        let small = Lead::new("Bob", "bob@example.com");
        let big = enterprise_lead();

        assert!((channel_preference(Channel::Chat, &small) - 0.2).abs() < 1e-9);
        assert!((channel_preference(Channel::Chat, &big) - 0.5).abs() < 1e-9);
        assert!((channel_preference(Channel::ProfessionalNetwork, &big) - 0.7).abs() < 1e-9);
        assert_eq!(
            channel_preference(Channel::Email, &small),
            channel_preference(Channel::Email, &big)
        );
    }

    #[tokio::test]
    async fn test_plan_is_staggered_and_ranked() {
        let coordinator = coordinator(echo_generator());
        let now = Utc::now();
        let plan = coordinator
            .coordinate_at(
                &enterprise_lead(),
                &[Channel::Chat, Channel::Email, Channel::ProfessionalNetwork],
                now,
            )
            .await;

        let order: Vec<Channel> = plan.execution_plan.iter().map(|s| s.channel).collect();
        assert_eq!(
            order,
            vec![Channel::Email, Channel::ProfessionalNetwork, Channel::Chat]
        );

        let chat = &plan.execution_plan[2];
        assert_eq!(chat.priority, 50);
        assert_eq!(chat.timing, now);
        assert_eq!(plan.execution_plan[0].timing, now + ChronoDuration::days(1));
        assert_eq!(plan.execution_plan[1].timing, now + ChronoDuration::days(2));
        assert!(plan.execution_plan[1].content.contains("Professional"));

        assert_eq!(
            plan.coordination_strategy,
            "Multi-channel sequence: email → linkedin → chat"
        );
        assert!((plan.expected_outcomes[&Channel::Email] - 0.33).abs() < 1e-9);
        assert!((plan.expected_outcomes[&Channel::Chat] - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_duplicate_channels_are_collapsed() {
        let coordinator = coordinator(echo_generator());
        let plan = coordinator
            .coordinate(&Lead::new("Bob", "bob@example.com"), &[Channel::Sms, Channel::Sms])
            .await;

        assert_eq!(plan.execution_plan.len(), 1);
        assert_eq!(plan.coordination_strategy, "Single channel approach");
    }

    #[tokio::test]
    async fn test_empty_content_uses_placeholder() {
        let mut content = MockContentGenerator::new();
        content.expect_generate().returning(|request| {
            let mut generated = GeneratedContent::fallback(&request, "Acme Docs Collective");
            generated.content = String::new();
            generated
        });
        let plan = coordinator(content)
            .coordinate(&Lead::new("Bob", "bob@example.com"), &[Channel::Phone])
            .await;

        let step = &plan.execution_plan[0];
        assert_eq!(step.content, "Personalized phone message for Bob");
        assert!(step.degraded);
    }
}
