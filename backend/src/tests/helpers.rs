use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
};
use leadflow_shared::{GeneratedContent, LeadGrade, LeadPriority, LeadScore, ScoreBreakdown};
use serde_json::Value;
use std::sync::Once;
use std::time::Duration;

use crate::config::WorkflowConfig;
use crate::services::{MockChatSender, MockContentGenerator, MockEmailSender, MockLeadScorer};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("leadflow_backend=debug")
            .try_init()
            .ok();
    });
}

pub fn workflow_config() -> WorkflowConfig {
    WorkflowConfig {
        action_timeout: Duration::from_millis(250),
        ..WorkflowConfig::default()
    }
}

pub fn fixed_scorer(total: u32) -> MockLeadScorer {
    let mut scorer = MockLeadScorer::new();
    scorer.expect_score().returning(move |lead| {
        Ok(LeadScore {
            lead_id: lead.id,
            total,
            breakdown: ScoreBreakdown::default(),
            grade: if total >= 80 { LeadGrade::A } else { LeadGrade::C },
            priority: LeadPriority::Medium,
            recommendations: Vec::new(),
        })
    });
    scorer
}

/// Generated content that names the request context and tone
pub fn echo_content() -> MockContentGenerator {
    let mut content = MockContentGenerator::new();
    content.expect_generate().returning(|request| {
        let mut generated = GeneratedContent::fallback(&request, "Acme Docs Collective");
        generated.content = format!("{} ({:?})", request.context, request.tone);
        generated.degraded = false;
        generated
    });
    content.expect_generate_proposal().returning(|lead| {
        let mut draft = leadflow_shared::ProposalDraft::fallback(lead, "Acme Docs Collective");
        draft.degraded = false;
        draft
    });
    content
}

pub fn accepting_email() -> MockEmailSender {
    let mut email = MockEmailSender::new();
    email.expect_send().returning(|_, _, _| true);
    email
}

pub fn accepting_chat() -> MockChatSender {
    let mut chat = MockChatSender::new();
    chat.expect_send().returning(|_, _| true);
    chat
}

pub fn rejecting_chat() -> MockChatSender {
    let mut chat = MockChatSender::new();
    chat.expect_send().returning(|_, _| false);
    chat
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
