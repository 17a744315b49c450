// Integration tests for the workflow API

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::tests::fixtures::*;
use crate::tests::helpers::*;
use crate::tests::TestContext;

// ============================================
// Health and Metrics
// ============================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_with_in_memory_store() {
        let ctx = TestContext::new(50);
        let response = ctx.app().oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "leadflow-api");
        assert_eq!(body["rule_store"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_metrics_reflect_executions() {
        let ctx = TestContext::new(85);
        let event = lead_event("inquiry_email", &qualified_lead());

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/execute", &event))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = ctx.app().oneshot(get_request("/metrics")).await.unwrap();
        let body = read_json(response).await;
        assert_eq!(body["counters"]["workflow_executions_total"], 1);
        assert_eq!(body["counters"]["workflow_failures_total"], 0);
        assert_eq!(body["counters"]["actions_executed_total"], 4);
    }
}

// ============================================
// Workflow Execution
// ============================================

mod execute_tests {
    use super::*;

    #[tokio::test]
    async fn test_qualified_lead_runs_qualification_rule() {
        let ctx = TestContext::new(85);
        let event = lead_event("inquiry_email", &qualified_lead());

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/execute", &event))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["ruleId"], "lead_qualification");
        assert_eq!(body["fallback"], false);

        let actions = body["actionsExecuted"].as_array().unwrap();
        let ids: Vec<&str> = actions.iter().map(|a| a["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["score_lead", "generate_content", "send_email", "schedule_followup"]);
    }

    #[tokio::test]
    async fn test_low_score_falls_back_to_default_rule() {
        let ctx = TestContext::new(20);
        let event = lead_event("account_created", &LeadFixture::default().build());

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/execute", &event))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["ruleId"], "default");
        assert_eq!(body["fallback"], true);
        assert_eq!(body["actionsExecuted"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_lead_is_rejected_with_details() {
        let ctx = TestContext::new(85);
        let mut lead = LeadFixture::default().to_json();
        lead["email"] = json!("not-an-email");
        lead["name"] = json!("");
        let event = json!({ "eventType": "inquiry_email", "lead": lead });

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/execute", &event))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = read_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["details"]["email"].is_array());
        assert!(body["details"]["name"].is_array());
        assert!(ctx.orchestrator().rule_performance().is_empty());
    }

    #[tokio::test]
    async fn test_rule_performance_after_execution() {
        let ctx = TestContext::new(85);
        let event = lead_event("inquiry_email", &qualified_lead());
        ctx.app()
            .oneshot(json_request("POST", "/api/v1/workflows/execute", &event))
            .await
            .unwrap();

        let response = ctx
            .app()
            .oneshot(get_request("/api/v1/workflows/rules/performance"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let rules = body["rules"].as_array().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0]["ruleId"], "lead_qualification");
        assert_eq!(rules[0]["metrics"]["totalExecutions"], 1);
    }
}

// ============================================
// Planning Endpoints
// ============================================

mod planning_tests {
    use super::*;

    #[tokio::test]
    async fn test_engagement_plan_for_high_score() {
        let ctx = TestContext::new(85);
        let lead = LeadFixture::default().to_json();

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/engagement", &lead))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["engagementLevel"], "high");
        assert_eq!(body["leadScore"], 85);
        assert_eq!(body["degraded"], false);
    }

    #[tokio::test]
    async fn test_proposal_plan_has_two_follow_ups() {
        let ctx = TestContext::new(60);
        let lead = LeadFixture::default().with_budget("50000").to_json();

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/proposal", &lead))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["followUpSequence"].as_array().unwrap().len(), 2);
        assert!(body["proposalDraft"].is_object());
        assert!(body["riskAssessment"]["score"].is_number());
    }
}

// ============================================
// Channel Coordination
// ============================================

mod channel_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_channel_is_bad_request() {
        let ctx = TestContext::new(60);
        let request = json!({
            "lead": LeadFixture::default().to_json(),
            "channels": ["email", "carrier_pigeon"],
        });

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/channels", &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_empty_channel_list_is_bad_request() {
        let ctx = TestContext::new(60);
        let request = json!({ "lead": LeadFixture::default().to_json(), "channels": [] });

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/channels", &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_channels_are_ordered_by_priority() {
        let ctx = TestContext::new(60);
        let request = json!({
            "lead": LeadFixture::default().to_json(),
            "channels": ["phone", "email", "linkedin"],
        });

        let response = ctx
            .app()
            .oneshot(json_request("POST", "/api/v1/workflows/channels", &request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let channels: Vec<&str> = body["executionPlan"]
            .as_array()
            .unwrap()
            .iter()
            .map(|step| step["channel"].as_str().unwrap())
            .collect();
        assert_eq!(channels, vec!["email", "linkedin", "phone"]);
        assert_eq!(
            body["coordinationStrategy"],
            "Multi-channel sequence: email → linkedin → phone"
        );
    }
}

// ============================================
// Optimization
// ============================================

mod optimization_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_rule_is_not_found() {
        let ctx = TestContext::new(60);
        let response = ctx
            .app()
            .oneshot(get_request("/api/v1/workflows/rules/no_such_rule/optimization"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_active_rule_gets_a_report() {
        let ctx = TestContext::new(60);
        let response = ctx
            .app()
            .oneshot(get_request("/api/v1/workflows/rules/lead_qualification/optimization"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["ruleId"], "lead_qualification");
        assert!(body["optimizationRecommendations"].is_array());
    }
}
