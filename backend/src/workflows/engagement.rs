// Engagement Planner - Lead score driven follow-up plans

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, Utc, Weekday};
use leadflow_shared::Lead;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::channels::Channel;
use super::Action;
use crate::services::LeadScorer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

impl EngagementLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            Self::High
        } else if score > 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Content hints handed to downstream generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentStrategy {
    pub primary_message: String,
    pub content_types: Vec<String>,
    pub personalization_level: String,
    pub follow_up_frequency: String,
}

impl ContentStrategy {
    pub fn for_level(level: EngagementLevel) -> Self {
        let high = level == EngagementLevel::High;
        Self {
            primary_message: "Value proposition".to_string(),
            content_types: vec!["email".to_string(), "proposal".to_string()],
            personalization_level: if high { "high" } else { "medium" }.to_string(),
            follow_up_frequency: if high { "daily" } else { "weekly" }.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementPlan {
    pub lead_id: Uuid,
    pub lead_score: Option<u32>,
    pub engagement_level: EngagementLevel,
    pub content_strategy: ContentStrategy,
    pub engagement_plan: Vec<Action>,
    pub estimated_conversion_probability: f64,
    pub next_optimal_contact_time: DateTime<Utc>,
    pub recommended_channels: Vec<Channel>,
    /// The lead could not be scored; the plan is the minimal fallback
    #[serde(default)]
    pub degraded: bool,
}

impl EngagementPlan {
    fn fallback(lead: &Lead, now: DateTime<Utc>) -> Self {
        Self {
            lead_id: lead.id,
            lead_score: None,
            engagement_level: EngagementLevel::Low,
            content_strategy: ContentStrategy::for_level(EngagementLevel::Low),
            engagement_plan: Vec::new(),
            estimated_conversion_probability: 0.0,
            next_optimal_contact_time: now,
            recommended_channels: vec![Channel::Email],
            degraded: true,
        }
    }
}

pub struct EngagementPlanner {
    scorer: Arc<dyn LeadScorer>,
    timeout: Duration,
}

impl EngagementPlanner {
    pub fn new(scorer: Arc<dyn LeadScorer>, timeout: Duration) -> Self {
        Self { scorer, timeout }
    }

    pub async fn plan(&self, lead: &Lead) -> EngagementPlan {
        self.plan_at(lead, Utc::now()).await
    }

    pub async fn plan_at(&self, lead: &Lead, now: DateTime<Utc>) -> EngagementPlan {
        let score = match tokio::time::timeout(self.timeout, self.scorer.score(lead)).await {
            Ok(Ok(score)) => score.total.min(100),
            Ok(Err(e)) => {
                warn!("Engagement planning for lead {} degraded: {}", lead.id, e);
                return EngagementPlan::fallback(lead, now);
            }
            Err(_) => {
                warn!(
                    "Engagement planning for lead {} degraded: scorer timed out after {:?}",
                    lead.id, self.timeout
                );
                return EngagementPlan::fallback(lead, now);
            }
        };

        let level = EngagementLevel::from_score(f64::from(score));
        let actions = engagement_actions(level);
        let probability = conversion_probability(f64::from(score), actions.len());

        info!(
            "Engagement plan for lead {}: score {}, level {:?}, {} actions",
            lead.id,
            score,
            level,
            actions.len()
        );

        EngagementPlan {
            lead_id: lead.id,
            lead_score: Some(score),
            engagement_level: level,
            content_strategy: ContentStrategy::for_level(level),
            engagement_plan: actions,
            estimated_conversion_probability: probability,
            next_optimal_contact_time: next_contact_slot(lead, now),
            recommended_channels: recommended_channels(lead, level),
            degraded: false,
        }
    }
}

/// High engagement gets an immediate personalized follow-up ahead of rescoring
pub fn engagement_actions(level: EngagementLevel) -> Vec<Action> {
    let mut plan = Vec::new();
    if level == EngagementLevel::High {
        plan.push(
            Action::generate_content("immediate_followup", "personalized_followup")
                .with_config("urgency", json!("high")),
        );
    }
    plan.push(Action::score_lead("scoring_update"));
    plan
}

pub fn recommended_channels(lead: &Lead, level: EngagementLevel) -> Vec<Channel> {
    let mut channels = vec![Channel::Email];
    if level == EngagementLevel::High {
        channels.extend([Channel::Phone, Channel::ProfessionalNetwork]);
    }
    if lead.is_enterprise() {
        channels.push(Channel::Chat);
    }
    channels
}

pub fn conversion_probability(lead_score: f64, plan_length: usize) -> f64 {
    let base = lead_score / 100.0;
    let complexity_bonus = (0.05 * plan_length as f64).min(0.2);
    (base + complexity_bonus).min(0.95)
}

/// Next business day at 10:00 for technology leads, 14:00 otherwise (UTC)
pub fn next_contact_slot(lead: &Lead, now: DateTime<Utc>) -> DateTime<Utc> {
    let hour = match lead.industry.as_deref() {
        Some(industry) if industry.eq_ignore_ascii_case("technology") => 10,
        _ => 14,
    };

    let mut day = now.date_naive() + ChronoDuration::days(1);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day += ChronoDuration::days(1);
    }

    match NaiveTime::from_hms_opt(hour, 0, 0) {
        Some(time) => day.and_time(time).and_utc(),
        None => now + ChronoDuration::days(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MockLeadScorer, ScoringError};
    use chrono::{TimeZone, Timelike};
    use leadflow_shared::{LeadGrade, LeadPriority, LeadScore, ScoreBreakdown};

    fn scorer_returning(total: u32) -> MockLeadScorer {
        let mut scorer = MockLeadScorer::new();
        scorer.expect_score().returning(move |lead| {
            Ok(LeadScore {
                lead_id: lead.id,
                total,
                breakdown: ScoreBreakdown::default(),
                grade: LeadGrade::A,
                priority: LeadPriority::High,
                recommendations: Vec::new(),
            })
        });
        scorer
    }

    fn planner(scorer: MockLeadScorer) -> EngagementPlanner {
        EngagementPlanner::new(Arc::new(scorer), Duration::from_millis(200))
    }

    #[test]
    fn test_level_thresholds_are_strict() {
        assert_eq!(EngagementLevel::from_score(81.0), EngagementLevel::High);
        assert_eq!(EngagementLevel::from_score(80.0), EngagementLevel::Medium);
        assert_eq!(EngagementLevel::from_score(51.0), EngagementLevel::Medium);
        assert_eq!(EngagementLevel::from_score(50.0), EngagementLevel::Low);
    }

    #[tokio::test]
    async fn test_high_score_adds_phone_and_network() {
        let lead = Lead::new("Ada Lovelace", "ada@analytical.io");
        let plan = planner(scorer_returning(85)).plan(&lead).await;

        assert_eq!(plan.engagement_level, EngagementLevel::High);
        assert_eq!(
            plan.recommended_channels,
            vec![Channel::Email, Channel::Phone, Channel::ProfessionalNetwork]
        );
        let ids: Vec<&str> = plan.engagement_plan.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["immediate_followup", "scoring_update"]);
        // 0.85 + 2 * 0.05
        assert!((plan.estimated_conversion_probability - 0.95).abs() < 1e-9);
        assert_eq!(plan.content_strategy.follow_up_frequency, "daily");
        assert!(!plan.degraded);
    }

    #[tokio::test]
    async fn test_enterprise_low_lead_gets_chat() {
        let mut lead = Lead::new("Bob", "bob@corp.example");
        lead.company_size = Some("Enterprise".to_string());
        let plan = planner(scorer_returning(30)).plan(&lead).await;

        assert_eq!(plan.engagement_level, EngagementLevel::Low);
        assert_eq!(plan.recommended_channels, vec![Channel::Email, Channel::Chat]);
        assert!((plan.estimated_conversion_probability - 0.35).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_scorer_failure_yields_fallback_plan() {
        let mut scorer = MockLeadScorer::new();
        scorer
            .expect_score()
            .returning(|_| Err(ScoringError::Unavailable("down".to_string())));
        let plan = planner(scorer).plan(&Lead::new("Bob", "bob@example.com")).await;

        assert!(plan.degraded);
        assert!(plan.engagement_plan.is_empty());
        assert_eq!(plan.estimated_conversion_probability, 0.0);
        assert_eq!(plan.recommended_channels, vec![Channel::Email]);
    }

    #[test]
    fn test_contact_slot_skips_weekends() {
        let mut lead = Lead::new("Ada", "ada@analytical.io");
        lead.industry = Some("Technology".to_string());

        // Friday evening
        let friday = Utc.with_ymd_and_hms(2025, 3, 7, 18, 30, 0).unwrap();
        let slot = next_contact_slot(&lead, friday);
        assert_eq!(slot.weekday(), Weekday::Mon);
        assert_eq!(slot.hour(), 10);

        lead.industry = Some("retail".to_string());
        let tuesday = Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).unwrap();
        let slot = next_contact_slot(&lead, tuesday);
        assert_eq!(slot.weekday(), Weekday::Wed);
        assert_eq!(slot.hour(), 14);
        assert_eq!(slot.minute(), 0);
    }

    #[test]
    fn test_probability_is_capped() {
        assert_eq!(conversion_probability(100.0, 10), 0.95);
        assert!((conversion_probability(40.0, 1) - 0.45).abs() < 1e-9);
    }
}
