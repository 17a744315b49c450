// Unit tests for the orchestration core

use serde_json::json;
use std::sync::Arc;

use crate::services::{MetricsRegistry, MockLeadScorer};
use crate::tests::fixtures::*;
use crate::tests::helpers::*;
use crate::tests::TestContext;
use crate::workflows::rules::{self, Rule};
use crate::workflows::{
    Action, ActionErrorKind, ActionExecutor, Channel, Condition, EngagementLevel,
    RuleSelector, WorkflowContext, WorkflowRunner,
};

fn context_with_score(lead_score: f64) -> WorkflowContext {
    WorkflowContext::new(LeadFixture::default().with_budget("10000").build(), "inquiry")
        .with_custom("leadScore", json!(lead_score))
}

// ============================================
// Rule Scorer Tests
// ============================================

mod scorer_tests {
    use super::*;

    #[test]
    fn test_zero_condition_rule_always_scores_one() {
        let rule = Rule::new("anything", "Anything");
        for context in [json!({}), json!(null), json!({ "leadScore": 3 }), context_with_score(12.0).to_json()] {
            assert_eq!(rules::score(&rule, &context), 1.0);
        }
    }

    #[test]
    fn test_in_range_includes_both_bounds() {
        let rule = Rule::new("band", "Band")
            .with_conditions(vec![Condition::in_range("leadScore", 50.0, 80.0)]);

        for (value, expected) in [(49.9, 0.0), (50.0, 1.0), (65.0, 1.0), (80.0, 1.0), (80.1, 0.0)] {
            let context = context_with_score(value).to_json();
            assert_eq!(rules::score(&rule, &context), expected, "leadScore {}", value);
        }
    }

    #[test]
    fn test_budget_and_score_example() {
        let rule = Rule::new("R1", "Budget and score").with_conditions(vec![
            Condition::greater_than("leadData.budget", 5000.0).with_weight(0.6),
            Condition::greater_than("leadScore", 70.0).with_weight(0.8),
        ]);

        let low = context_with_score(40.0);
        let score = rules::score(&rule, &low.to_json());
        assert!((score - 0.6 / 1.4).abs() < 1e-9);

        let selector = RuleSelector::default();
        assert!(selector.select(&[rule.clone()], &low, |_| 0.759).fallback);

        let high = context_with_score(80.0);
        assert_eq!(rules::score(&rule, &high.to_json()), 1.0);
        let selection = selector.select(&[rule], &high, |_| 0.759);
        assert_eq!(selection.rule.id, "R1");
    }

    #[test]
    fn test_scoring_is_pure() {
        let rule = rules::presets::lead_qualification();
        let context = context_with_score(75.0).to_json();
        let first = rules::score(&rule, &context);
        for _ in 0..5 {
            assert_eq!(rules::score(&rule, &context), first);
        }
    }
}

// ============================================
// Workflow Runner Tests
// ============================================

mod runner_tests {
    use super::*;

    fn runner(chat: crate::services::MockChatSender) -> WorkflowRunner {
        let executor = ActionExecutor::new(
            Arc::new(echo_content()),
            Arc::new(MockLeadScorer::new()),
            Arc::new(accepting_email()),
            Arc::new(chat),
            workflow_config().action_timeout,
            Arc::new(MetricsRegistry::new()),
        );
        WorkflowRunner::new(Arc::new(executor))
    }

    #[tokio::test]
    async fn test_failed_middle_action_does_not_stop_sequence() {
        let rule = Rule::new("three_step", "Three step").with_actions(vec![
            Action::notify_email("welcome", "Welcome", "Thanks for reaching out"),
            Action::notify_chat("alert_team", "New lead"),
            Action::create_task("follow_up", 24.0),
        ]);

        let run = runner(rejecting_chat()).run(&rule, &context_with_score(60.0)).await;

        assert_eq!(run.executed_actions.len(), 3);
        assert!(!run.success);
        assert_eq!(run.actions_failed, 1);

        let outcomes: Vec<bool> = run.executed_actions.iter().map(|a| a.result.success).collect();
        assert_eq!(outcomes, vec![true, false, true]);
        assert_eq!(
            run.executed_actions[1].result.error_kind,
            Some(ActionErrorKind::Rejected)
        );
        assert!((run.success_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_action_type_is_recorded_as_failure() {
        let unknown: Action =
            serde_json::from_value(json!({ "id": "teleport", "type": "teleport_lead" })).unwrap();
        let rule = Rule::new("odd", "Odd").with_actions(vec![
            unknown,
            Action::delay("wait", 2.0),
        ]);

        let run = runner(accepting_chat()).run(&rule, &context_with_score(60.0)).await;

        assert_eq!(run.executed_actions.len(), 2);
        assert_eq!(
            run.executed_actions[0].result.error_kind,
            Some(ActionErrorKind::Unsupported)
        );
        assert!(run.executed_actions[1].result.success);
    }
}

// ============================================
// Orchestrator Tests
// ============================================

mod orchestrator_tests {
    use super::*;
    use crate::services::metrics::metric_names;

    #[tokio::test]
    async fn test_score_85_plans_high_engagement() {
        let ctx = TestContext::new(85);
        let plan = ctx
            .orchestrator()
            .plan_engagement(&LeadFixture::default().build())
            .await
            .unwrap();

        assert_eq!(plan.engagement_level, EngagementLevel::High);
        assert!(plan.recommended_channels.contains(&Channel::Phone));
        assert!(plan.recommended_channels.contains(&Channel::ProfessionalNetwork));
        assert_eq!(plan.recommended_channels[0], Channel::Email);
    }

    #[tokio::test]
    async fn test_enterprise_boosts_chat_preference() {
        let ctx = TestContext::new(60);
        let lead = LeadFixture::default().enterprise().build();

        let plan = ctx
            .orchestrator()
            .coordinate_channels(&lead, &[Channel::Email, Channel::Chat])
            .await
            .unwrap();

        let chat = plan
            .execution_plan
            .iter()
            .find(|step| step.channel == Channel::Chat)
            .unwrap();
        assert!(chat.preference > Channel::Chat.baseline_preference());
        assert_eq!(chat.priority, 50);
        assert_eq!(plan.execution_plan[0].channel, Channel::Email);
    }

    #[tokio::test]
    async fn test_concurrent_workflows_all_recorded() {
        let ctx = TestContext::new(85);
        let state = ctx.state.clone();

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move {
                    state
                        .orchestrator
                        .execute_intelligent_workflow(WorkflowContext::new(qualified_lead(), "inquiry"))
                        .await
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().success);
        }

        let performance = ctx.orchestrator().rule_performance();
        let qualification = performance
            .iter()
            .find(|p| p.rule_id == "lead_qualification")
            .unwrap();
        assert_eq!(qualification.metrics.total_executions, 12);
        assert_eq!(state.metrics.get(metric_names::WORKFLOW_EXECUTIONS_TOTAL), 12);
    }

    #[tokio::test]
    async fn test_failures_lower_performance_score() {
        let ctx = TestContext::with_collaborators(
            echo_content(),
            fixed_scorer(85),
            {
                let mut email = crate::services::MockEmailSender::new();
                email.expect_send().returning(|_, _, _| false);
                email
            },
            accepting_chat(),
        );
        let before = ctx.orchestrator().performance_score("lead_qualification");

        let outcome = ctx
            .orchestrator()
            .execute_intelligent_workflow(WorkflowContext::new(qualified_lead(), "inquiry"))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.adaptations.is_empty());
        assert!(outcome
            .recommendations
            .contains(&"Review workflow configuration for failed actions".to_string()));
        assert!(ctx.orchestrator().performance_score("lead_qualification") < before);
    }
}
