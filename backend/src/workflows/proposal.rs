// Proposal Planner - Draft, follow-ups, negotiation angles and risk for a lead

use leadflow_shared::{Lead, ProposalDraft};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::actions::presets;
use super::Action;
use crate::config::BrandConfig;
use crate::services::ContentGenerator;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// 0..=100
    pub score: u32,
    pub factors: Vec<String>,
    pub mitigation_strategies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalPlan {
    pub proposal_draft: ProposalDraft,
    pub follow_up_sequence: Vec<Action>,
    pub negotiation_strategy: Vec<String>,
    pub risk_assessment: RiskAssessment,
}

pub struct ProposalPlanner {
    content: Arc<dyn ContentGenerator>,
    timeout: Duration,
    organization: String,
}

impl ProposalPlanner {
    pub fn new(content: Arc<dyn ContentGenerator>, timeout: Duration) -> Self {
        Self {
            content,
            timeout,
            organization: BrandConfig::default().organization,
        }
    }

    /// Name used in the fallback draft
    pub fn with_organization(mut self, organization: &str) -> Self {
        self.organization = organization.to_string();
        self
    }

    pub async fn plan(&self, lead: &Lead) -> ProposalPlan {
        let proposal_draft =
            match tokio::time::timeout(self.timeout, self.content.generate_proposal(lead)).await {
                Ok(draft) => draft,
                Err(_) => {
                    warn!(
                        degraded = true,
                        "Proposal draft for lead {} timed out after {:?}", lead.id, self.timeout
                    );
                    ProposalDraft::fallback(lead, &self.organization)
                }
            };

        let plan = ProposalPlan {
            proposal_draft,
            follow_up_sequence: presets::proposal_follow_ups(),
            negotiation_strategy: negotiation_strategy(lead),
            risk_assessment: assess_risk(lead),
        };

        info!(
            "Proposal plan for lead {}: risk {}, {} negotiation points",
            lead.id,
            plan.risk_assessment.score,
            plan.negotiation_strategy.len()
        );
        plan
    }
}

pub fn negotiation_strategy(lead: &Lead) -> Vec<String> {
    let mut strategies = Vec::new();

    if lead.budget_amount().is_some_and(|amount| amount < 5000.0) {
        strategies.push("Emphasize value and ROI".to_string());
        strategies.push("Offer flexible payment terms".to_string());
    }

    if lead
        .urgency
        .as_deref()
        .is_some_and(|u| u.eq_ignore_ascii_case("high"))
    {
        strategies.push("Highlight quick turnaround capabilities".to_string());
    }

    strategies
}

pub fn assess_risk(lead: &Lead) -> RiskAssessment {
    let mut risk = RiskAssessment::default();

    let budget_unspecified = match lead.budget.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(budget) => budget.eq_ignore_ascii_case("not specified"),
    };
    if budget_unspecified {
        risk.factors.push("Unspecified budget".to_string());
        risk.mitigation_strategies
            .push("Request budget clarification before proceeding".to_string());
        risk.score += 20;
    }

    if lead
        .timeline
        .as_deref()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case("asap"))
    {
        risk.factors.push("Unrealistic timeline expectations".to_string());
        risk.mitigation_strategies
            .push("Set clear timeline expectations early".to_string());
        risk.score += 15;
    }

    risk.score = risk.score.min(100);
    risk
}
