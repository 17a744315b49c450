pub mod helpers;
pub mod integration;
pub mod unit;

// Common test utilities and shared test setup
use axum::Router;
use std::sync::Arc;

use crate::services::{
    MetricsRegistry, MockChatSender, MockContentGenerator, MockEmailSender, MockLeadScorer,
};
use crate::workflows::{Collaborators, InMemoryRuleStore, WorkflowOrchestrator};
use crate::AppState;

/// An in-memory application wired to mock collaborators
pub struct TestContext {
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryRuleStore>,
}

impl TestContext {
    /// Every collaborator accepts; the scorer reports `lead_score`
    pub fn new(lead_score: u32) -> Self {
        Self::with_collaborators(
            helpers::echo_content(),
            helpers::fixed_scorer(lead_score),
            helpers::accepting_email(),
            helpers::accepting_chat(),
        )
    }

    pub fn with_collaborators(
        content: MockContentGenerator,
        scorer: MockLeadScorer,
        email: MockEmailSender,
        chat: MockChatSender,
    ) -> Self {
        helpers::init_test_logging();

        let store = Arc::new(InMemoryRuleStore::with_presets());
        let metrics = Arc::new(MetricsRegistry::new());

        let orchestrator = WorkflowOrchestrator::new(
            Collaborators {
                content: Arc::new(content),
                scorer: Arc::new(scorer),
                email: Arc::new(email),
                chat: Arc::new(chat),
                store: store.clone(),
            },
            &helpers::workflow_config(),
            metrics.clone(),
        );

        let state = Arc::new(AppState {
            orchestrator: Arc::new(orchestrator),
            metrics,
            db_pool: None,
        });

        Self { state, store }
    }

    pub fn app(&self) -> Router {
        crate::handlers::app(self.state.clone())
    }

    pub fn orchestrator(&self) -> &WorkflowOrchestrator {
        &self.state.orchestrator
    }
}
