// Unit tests for service layer

use leadflow_shared::Lead;
use std::sync::Arc;

use crate::error::AppError;
use crate::services::{
    metrics::metric_names, ChatSender, DisabledSender, EmailSender, HeuristicLeadScorer,
    LeadScorer, MetricsRegistry, ScoringError, Timer,
};
use crate::tests::fixtures::LeadFixture;
use crate::validation::validate_lead;

// ============================================
// Metrics Tests
// ============================================

mod metrics_tests {
    use super::*;

    #[test]
    fn test_registry_starts_with_every_counter_at_zero() {
        let registry = MetricsRegistry::new();
        let snapshot = registry.snapshot();

        assert_eq!(snapshot.counters.len(), metric_names::ALL.len());
        assert!(snapshot.counters.values().all(|v| *v == 0));
    }

    #[test]
    fn test_increment_accumulates() {
        let registry = MetricsRegistry::new();
        registry.increment(metric_names::ACTIONS_EXECUTED_TOTAL);
        registry.increment_by(metric_names::ACTIONS_EXECUTED_TOTAL, 4);

        assert_eq!(registry.get(metric_names::ACTIONS_EXECUTED_TOTAL), 5);
        assert_eq!(registry.get(metric_names::ACTION_FAILURES_TOTAL), 0);
        assert_eq!(registry.get("no_such_counter"), 0);
        assert_eq!(
            registry.snapshot().counters[metric_names::ACTIONS_EXECUTED_TOTAL],
            5
        );
    }

    #[tokio::test]
    async fn test_counters_are_shared_across_tasks() {
        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        registry.increment(metric_names::WORKFLOW_EXECUTIONS_TOTAL);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.get(metric_names::WORKFLOW_EXECUTIONS_TOTAL), 200);
    }

    #[test]
    fn test_timer_elapsed_is_non_negative() {
        let timer = Timer::start();
        assert!(timer.elapsed_ms() >= 0);
    }
}

// ============================================
// Notification Sender Tests
// ============================================

mod sender_tests {
    use super::*;

    #[test]
    fn test_disabled_sender_never_accepts() {
        let sender = DisabledSender::new("email");

        let email: &dyn EmailSender = &sender;
        let chat: &dyn ChatSender = &sender;

        assert!(!tokio_test::block_on(email.send("ada@example.com", "Hi", "Body")));
        assert!(!tokio_test::block_on(chat.send("New lead", "Ada")));
    }
}

// ============================================
// Lead Scoring Tests
// ============================================

mod scoring_tests {
    use super::*;

    #[test]
    fn test_heuristic_scorer_behind_trait_object() {
        let scorer: Arc<dyn LeadScorer> = Arc::new(HeuristicLeadScorer::new());
        let lead = LeadFixture::default().with_budget("25000").enterprise().build();

        let score = tokio_test::block_on(scorer.score(&lead)).unwrap();

        assert_eq!(score.lead_id, lead.id);
        assert!(score.total <= 100);
        assert_eq!(score.total, score.breakdown.total().min(100));
    }

    #[test]
    fn test_lead_without_contact_channel_is_unscorable() {
        let mut lead = Lead::new("Ada Lovelace", "");
        lead.phone = None;

        let result = HeuristicLeadScorer::new().score_at(&lead, chrono::Utc::now());
        assert!(matches!(result, Err(ScoringError::Unscorable(id, _)) if id == lead.id));
    }
}

// ============================================
// Validation Tests
// ============================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_fixture_leads_are_valid() {
        for _ in 0..10 {
            let lead = LeadFixture::default().with_budget("5000").build();
            assert!(validate_lead(&lead).is_ok(), "{:?}", lead);
        }
    }

    #[test]
    fn test_invalid_fields_are_reported_together() {
        let mut lead = Lead::new("", "not-an-email");
        lead.budget = Some("   ".to_string());

        match validate_lead(&lead) {
            Err(AppError::ValidationError { details }) => {
                assert!(details.contains_key("name"));
                assert!(details.contains_key("email"));
                assert!(details.contains_key("budget"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
