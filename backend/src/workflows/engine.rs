// Workflow Engine - Composition root that ties selection, execution and adaptation together

use chrono::{DateTime, Utc};
use leadflow_shared::Lead;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use super::adaptation::{AdaptationRecorder, RulePerformance};
use super::channels::{Channel, ChannelPlan, MultiChannelCoordinator};
use super::engagement::{EngagementPlan, EngagementPlanner};
use super::executor::ActionExecutor;
use super::optimizer::{self, OptimizationReport};
use super::proposal::{ProposalPlan, ProposalPlanner};
use super::rules::{self, Rule};
use super::runner::{WorkflowRun, WorkflowRunner};
use super::selector::{RuleSelector, SelectionWeights};
use super::store::{RuleStore, StoreError};
use super::{ExecutedAction, WorkflowContext};
use crate::config::WorkflowConfig;
use crate::error::AppError;
use crate::services::metrics::metric_names;
use crate::services::{ChatSender, ContentGenerator, EmailSender, LeadScorer, MetricsRegistry, Timer};
use crate::validation::validate_lead;

const LOW_SUCCESS_RATE: f64 = 0.7;

/// Everything the orchestrator talks to outside the process
#[derive(Clone)]
pub struct Collaborators {
    pub content: Arc<dyn ContentGenerator>,
    pub scorer: Arc<dyn LeadScorer>,
    pub email: Arc<dyn EmailSender>,
    pub chat: Arc<dyn ChatSender>,
    pub store: Arc<dyn RuleStore>,
}

/// What the caller gets back for one lead event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutcome {
    pub success: bool,
    pub rule_id: Option<String>,
    pub rule_name: Option<String>,
    /// No configured rule qualified and the built-in default ran
    pub fallback: bool,
    pub actions_executed: Vec<ExecutedAction>,
    pub adaptations: Vec<String>,
    pub recommendations: Vec<String>,
    pub performance_score: Option<f64>,
    pub total_duration_ms: i64,
    pub completed_at: DateTime<Utc>,
}

impl WorkflowOutcome {
    fn aborted(duration_ms: i64) -> Self {
        Self {
            success: false,
            rule_id: None,
            rule_name: None,
            fallback: false,
            actions_executed: Vec::new(),
            adaptations: Vec::new(),
            recommendations: vec!["Workflow execution failed - please review error logs".to_string()],
            performance_score: None,
            total_duration_ms: duration_ms,
            completed_at: Utc::now(),
        }
    }
}

pub struct WorkflowOrchestrator {
    scorer: Arc<dyn LeadScorer>,
    store: Arc<dyn RuleStore>,
    selector: RuleSelector,
    runner: WorkflowRunner,
    recorder: AdaptationRecorder,
    engagement: EngagementPlanner,
    channels: MultiChannelCoordinator,
    proposals: ProposalPlanner,
    metrics: Arc<MetricsRegistry>,
    permits: Semaphore,
    action_timeout: Duration,
}

impl WorkflowOrchestrator {
    pub fn new(
        collaborators: Collaborators,
        config: &WorkflowConfig,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let timeout = config.action_timeout;
        let executor = Arc::new(ActionExecutor::new(
            collaborators.content.clone(),
            collaborators.scorer.clone(),
            collaborators.email,
            collaborators.chat,
            timeout,
            metrics.clone(),
        )
        .with_brand(config.brand.clone()));

        Self {
            scorer: collaborators.scorer.clone(),
            store: collaborators.store,
            selector: RuleSelector::new(SelectionWeights::from(config)),
            runner: WorkflowRunner::new(executor),
            recorder: AdaptationRecorder::new(),
            engagement: EngagementPlanner::new(collaborators.scorer, timeout),
            channels: MultiChannelCoordinator::new(collaborators.content.clone(), timeout),
            proposals: ProposalPlanner::new(collaborators.content, timeout)
                .with_organization(&config.brand.organization),
            metrics,
            permits: Semaphore::new(config.max_concurrent_workflows.max(1)),
            action_timeout: timeout,
        }
    }

    /// Seed the recorder from persisted performance; returns how many rules were restored
    pub async fn restore_performance(&self) -> Result<usize, StoreError> {
        let stored = self.store.load_rule_performance().await?;
        let count = stored.len();
        for entry in stored {
            self.recorder
                .restore(&entry.rule_id, entry.metrics, entry.performance_score);
        }
        info!("Restored performance for {} rules", count);
        Ok(count)
    }

    /// Select, run and learn from one rule for this context.
    ///
    /// Only lead validation errors propagate; everything downstream resolves
    /// to an outcome whose entries describe what happened.
    pub async fn execute_intelligent_workflow(
        &self,
        mut context: WorkflowContext,
    ) -> Result<WorkflowOutcome, AppError> {
        validate_lead(&context.lead_data)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AppError::InternalError(format!("workflow permits closed: {}", e)))?;

        let timer = Timer::start();
        self.metrics.increment(metric_names::WORKFLOW_EXECUTIONS_TOTAL);

        let candidates = match self.store.load_active_rules().await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Failed to load workflow rules: {}", e);
                self.metrics.increment(metric_names::WORKFLOW_FAILURES_TOTAL);
                return Ok(WorkflowOutcome::aborted(timer.elapsed_ms()));
            }
        };

        self.enrich_lead_score(&mut context).await;

        let selection = self
            .selector
            .select(&candidates, &context, |id| self.recorder.performance_score(id));
        if selection.fallback {
            self.metrics.increment(metric_names::FALLBACK_RULE_SELECTED_TOTAL);
            info!("No rule qualified for lead {}; using default workflow", context.lead_id);
        } else {
            info!(
                "Selected rule {} for lead {} (applicability {:.2}, combined {:.3})",
                selection.rule.id, context.lead_id, selection.applicability, selection.combined
            );
        }

        let rule = selection.rule;
        let run = self.runner.run(&rule, &context).await;
        if !run.success {
            self.metrics.increment(metric_names::WORKFLOW_FAILURES_TOTAL);
        }

        let update = self.recorder.record(&rule, &run);
        if let Err(e) = self
            .store
            .save_rule_performance(&rule.id, &update.metrics, update.performance_score)
            .await
        {
            warn!("Failed to persist performance for rule {}: {}", rule.id, e);
        }

        let adaptations = adaptation_notes(&rule, &run);
        let recommendations = recommendations(&context, &run);

        Ok(WorkflowOutcome {
            success: run.success,
            rule_id: Some(rule.id),
            rule_name: Some(rule.name),
            fallback: selection.fallback,
            actions_executed: run.executed_actions,
            adaptations,
            recommendations,
            performance_score: Some(update.performance_score),
            total_duration_ms: timer.elapsed_ms(),
            completed_at: Utc::now(),
        })
    }

    pub async fn plan_engagement(&self, lead: &Lead) -> Result<EngagementPlan, AppError> {
        validate_lead(lead)?;
        Ok(self.engagement.plan(lead).await)
    }

    pub async fn coordinate_channels(
        &self,
        lead: &Lead,
        channels: &[Channel],
    ) -> Result<ChannelPlan, AppError> {
        validate_lead(lead)?;
        if channels.is_empty() {
            return Err(AppError::BadRequest("at least one channel is required".to_string()));
        }
        Ok(self.channels.coordinate(lead, channels).await)
    }

    pub async fn orchestrate_proposal(&self, lead: &Lead) -> Result<ProposalPlan, AppError> {
        validate_lead(lead)?;
        Ok(self.proposals.plan(lead).await)
    }

    pub async fn optimize_workflow_performance(
        &self,
        rule_id: &str,
    ) -> Result<OptimizationReport, AppError> {
        let known = rule_id == rules::DEFAULT_RULE_ID
            || self.recorder.metrics(rule_id).is_some()
            || self
                .store
                .load_active_rules()
                .await?
                .iter()
                .any(|rule| rule.id == rule_id);

        if !known {
            return Err(AppError::NotFound(format!("Workflow rule '{}'", rule_id)));
        }

        let metrics = self.recorder.metrics(rule_id).unwrap_or_default();
        Ok(optimizer::optimize(
            rule_id,
            metrics,
            self.recorder.performance_score(rule_id),
        ))
    }

    pub fn rule_performance(&self) -> Vec<RulePerformance> {
        self.recorder.snapshot()
    }

    pub fn performance_score(&self, rule_id: &str) -> f64 {
        self.recorder.performance_score(rule_id)
    }

    /// Score the lead once so score-gated rules can match
    async fn enrich_lead_score(&self, context: &mut WorkflowContext) {
        if context.custom_data.contains_key("leadScore") {
            return;
        }

        match tokio::time::timeout(self.action_timeout, self.scorer.score(&context.lead_data)).await {
            Ok(Ok(score)) => {
                context
                    .custom_data
                    .insert("leadScore".to_string(), json!(score.total));
            }
            Ok(Err(e)) => warn!("Could not score lead {} before selection: {}", context.lead_id, e),
            Err(_) => warn!(
                "Scoring lead {} before selection timed out after {:?}",
                context.lead_id, self.action_timeout
            ),
        }
    }
}

fn adaptation_notes(rule: &Rule, run: &WorkflowRun) -> Vec<String> {
    let mut notes = Vec::new();
    if run.success && rule.adaptation_settings.learning_rate > 0.0 {
        notes.push(format!("Recorded successful execution pattern for {}", rule.name));
    }
    notes
}

fn recommendations(context: &WorkflowContext, run: &WorkflowRun) -> Vec<String> {
    let mut out = Vec::new();
    if !run.success {
        out.push("Review workflow configuration for failed actions".to_string());
    }
    if context.performance_metrics.success_rate < LOW_SUCCESS_RATE {
        out.push("Consider workflow optimization - success rate below threshold".to_string());
    }
    out
}
