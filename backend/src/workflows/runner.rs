// Workflow Runner - Executes a rule's actions in declared order

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::executor::ActionExecutor;
use super::rules::Rule;
use super::{ExecutedAction, WorkflowContext};
use crate::services::Timer;

/// Result of running one rule against one context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub rule_id: String,
    pub rule_name: String,
    /// Every action succeeded
    pub success: bool,
    /// One record per declared action, in order
    pub executed_actions: Vec<ExecutedAction>,
    pub actions_failed: usize,
    pub total_duration_ms: i64,
}

impl WorkflowRun {
    pub fn success_rate(&self) -> f64 {
        if self.executed_actions.is_empty() {
            return 1.0;
        }
        let succeeded = self.executed_actions.len() - self.actions_failed;
        succeeded as f64 / self.executed_actions.len() as f64
    }

    /// Mean engagement over the actions that reported one
    pub fn engagement(&self) -> Option<f64> {
        let rates: Vec<f64> = self
            .executed_actions
            .iter()
            .filter_map(|a| a.result.engagement_rate)
            .collect();

        if rates.is_empty() {
            None
        } else {
            Some(rates.iter().sum::<f64>() / rates.len() as f64)
        }
    }

    pub fn degraded(&self) -> bool {
        self.executed_actions.iter().any(|a| a.result.degraded)
    }
}

pub struct WorkflowRunner {
    executor: Arc<ActionExecutor>,
}

impl WorkflowRunner {
    pub fn new(executor: Arc<ActionExecutor>) -> Self {
        Self { executor }
    }

    /// Best effort: a failed action is recorded and the sequence continues
    pub async fn run(&self, rule: &Rule, context: &WorkflowContext) -> WorkflowRun {
        let timer = Timer::start();
        info!(
            "Running workflow {} ({} actions) for lead {}",
            rule.id,
            rule.actions.len(),
            context.lead_id
        );

        let mut executed_actions = Vec::with_capacity(rule.actions.len());
        let mut actions_failed = 0;

        for action in &rule.actions {
            let executed = self.executor.execute_recorded(action, context).await;
            if !executed.result.success {
                actions_failed += 1;
                warn!(
                    "Workflow {} action {} failed; continuing",
                    rule.id, action.id
                );
            }
            executed_actions.push(executed);
        }

        let run = WorkflowRun {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            success: actions_failed == 0,
            executed_actions,
            actions_failed,
            total_duration_ms: timer.elapsed_ms(),
        };

        info!(
            "Workflow {} finished: success={}, failed={}/{}, {}ms",
            run.rule_id,
            run.success,
            run.actions_failed,
            run.executed_actions.len(),
            run.total_duration_ms
        );

        run
    }
}
