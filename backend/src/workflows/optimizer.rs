// Performance Optimizer - Turns a rule's metrics into tuning suggestions

use leadflow_shared::WorkflowMetrics;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::selector::performance_score;
use super::Action;

const SUCCESS_RATE_FLOOR: f64 = 0.7;
const ENGAGEMENT_FLOOR: f64 = 0.75;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRecommendation {
    pub action: String,
    pub expected_improvement: f64,
    pub effort: Effort,
    /// 1 is most important
    pub priority: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub rule_id: String,
    pub current_performance: WorkflowMetrics,
    pub performance_score: f64,
    pub optimization_recommendations: Vec<OptimizationRecommendation>,
    pub proposed_changes: Vec<Action>,
}

pub fn optimize(rule_id: &str, metrics: WorkflowMetrics, score: f64) -> OptimizationReport {
    let mut candidates: Vec<(&str, f64, Effort)> = Vec::new();
    let personalize = metrics.average_engagement_score < ENGAGEMENT_FLOOR;

    if metrics.success_rate < SUCCESS_RATE_FLOOR {
        candidates.push((
            "Review failing actions and collaborator availability",
            0.20,
            Effort::High,
        ));
    }
    if personalize {
        candidates.push(("Improve email personalization", 0.15, Effort::Medium));
    }
    candidates.push((
        "Optimize timing based on engagement patterns",
        0.08,
        Effort::Low,
    ));

    let optimization_recommendations = candidates
        .into_iter()
        .zip(1..)
        .map(|((action, expected_improvement, effort), priority)| OptimizationRecommendation {
            action: action.to_string(),
            expected_improvement,
            effort,
            priority,
        })
        .collect();

    let mut proposed_changes = Vec::new();
    if personalize {
        proposed_changes.push(
            Action::generate_content("enhanced_personalization", "personalized_followup")
                .with_config("personalizationLevel", json!("high")),
        );
    }

    let score = if score.is_finite() { score } else { performance_score(&metrics) };

    OptimizationReport {
        rule_id: rule_id.to_string(),
        current_performance: metrics,
        performance_score: score,
        optimization_recommendations,
        proposed_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics_suggest_personalization_then_timing() {
        let metrics = WorkflowMetrics::default();
        let report = optimize("lead_qualification", metrics.clone(), 0.759);

        let actions: Vec<(&str, u32)> = report
            .optimization_recommendations
            .iter()
            .map(|r| (r.action.as_str(), r.priority))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("Improve email personalization", 1),
                ("Optimize timing based on engagement patterns", 2)
            ]
        );
        assert_eq!(report.proposed_changes.len(), 1);
        assert_eq!(report.proposed_changes[0].id, "enhanced_personalization");
        assert_eq!(
            report.proposed_changes[0].config["personalizationLevel"],
            json!("high")
        );
        assert_eq!(report.current_performance, metrics);
    }

    #[test]
    fn test_failing_rule_leads_with_review() {
        let metrics = WorkflowMetrics {
            success_rate: 0.4,
            average_engagement_score: 0.9,
            ..WorkflowMetrics::default()
        };
        let report = optimize("r", metrics, 0.5);

        assert_eq!(report.optimization_recommendations.len(), 2);
        assert_eq!(report.optimization_recommendations[0].effort, Effort::High);
        assert_eq!(report.optimization_recommendations[0].priority, 1);
        assert!(report.proposed_changes.is_empty());
    }
}
