// Adaptation Recorder - Per-rule outcome history and the performance score it drives

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use leadflow_shared::WorkflowMetrics;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use super::rules::{AdaptationSettings, Rule};
use super::runner::WorkflowRun;
use super::selector::performance_score;

/// Hard cap on retained observations per rule, whatever the window
pub const MAX_HISTORY: usize = 1000;

/// What one execution contributed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub success: bool,
    pub engagement: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl Observation {
    pub fn from_run(run: &WorkflowRun, recorded_at: DateTime<Utc>) -> Self {
        Self {
            success: run.success,
            engagement: run.engagement(),
            recorded_at,
        }
    }
}

/// Effect of recording one observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationUpdate {
    pub metrics: WorkflowMetrics,
    pub previous_score: f64,
    pub performance_score: f64,
    /// The score moved on this observation
    pub adapted: bool,
    /// The window's adaptation budget was already spent
    pub throttled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RulePerformance {
    pub rule_id: String,
    pub metrics: WorkflowMetrics,
    pub performance_score: f64,
    pub observations_in_window: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct RuleState {
    metrics: WorkflowMetrics,
    performance_score: f64,
    engagement_samples: i64,
    history: VecDeque<Observation>,
    adaptations: VecDeque<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl RuleState {
    /// Restored averages count as `total_executions` samples
    fn new(metrics: WorkflowMetrics, performance_score: f64) -> Self {
        Self {
            engagement_samples: metrics.total_executions.max(0),
            metrics,
            performance_score,
            history: VecDeque::new(),
            adaptations: VecDeque::new(),
            updated_at: Utc::now(),
        }
    }

    fn prune(&mut self, cutoff: DateTime<Utc>) {
        while self.history.front().is_some_and(|o| o.recorded_at < cutoff) {
            self.history.pop_front();
        }
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
        while self.adaptations.front().is_some_and(|at| *at < cutoff) {
            self.adaptations.pop_front();
        }
    }
}

impl Default for RuleState {
    fn default() -> Self {
        let metrics = WorkflowMetrics::default();
        let score = performance_score(&metrics);
        Self::new(metrics, score)
    }
}

/// Shared across in-flight requests; each rule's state is updated under its
/// own shard lock so readers of other rules are never blocked.
#[derive(Debug, Default)]
pub struct AdaptationRecorder {
    states: DashMap<String, RuleState>,
}

impl AdaptationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, rule: &Rule, run: &WorkflowRun) -> AdaptationUpdate {
        let now = Utc::now();
        self.record_at(
            &rule.id,
            &rule.adaptation_settings,
            Observation::from_run(run, now),
            now,
        )
    }

    pub fn record_at(
        &self,
        rule_id: &str,
        settings: &AdaptationSettings,
        observation: Observation,
        now: DateTime<Utc>,
    ) -> AdaptationUpdate {
        let mut state = self.states.entry(rule_id.to_string()).or_default();

        let cutoff = now - Duration::days(i64::from(settings.performance_window_days));
        state.prune(cutoff);

        // Incremental averages
        let n = state.metrics.total_executions + 1;
        let outcome = if observation.success { 1.0 } else { 0.0 };
        state.metrics.total_executions = n;
        state.metrics.success_rate += (outcome - state.metrics.success_rate) / n as f64;

        if let Some(engagement) = observation.engagement.filter(|e| e.is_finite()) {
            state.engagement_samples += 1;
            let samples = state.engagement_samples as f64;
            state.metrics.average_engagement_score +=
                (engagement.clamp(0.0, 1.0) - state.metrics.average_engagement_score) / samples;
        }

        state.history.push_back(observation);
        state.prune(cutoff);

        // Clamped EWMA step, rationed per window
        let previous_score = state.performance_score;
        let throttled = state.adaptations.len() >= settings.max_adaptations as usize;
        let mut adapted = false;

        if !throttled {
            let target = performance_score(&state.metrics);
            let limit = settings.adaptation_threshold.max(0.0);
            let step = (settings.learning_rate * (target - previous_score)).clamp(-limit, limit);

            if step != 0.0 {
                state.performance_score = (previous_score + step).clamp(0.0, 1.0);
                state.adaptations.push_back(now);
                adapted = true;
            }
        }
        state.updated_at = now;

        debug!(
            "Rule {} performance {:.4} -> {:.4} (throttled={})",
            rule_id, previous_score, state.performance_score, throttled
        );

        AdaptationUpdate {
            metrics: state.metrics.clone(),
            previous_score,
            performance_score: state.performance_score,
            adapted,
            throttled,
        }
    }

    /// Effective score used by the selector; rules never seen score as
    /// their initial metrics do
    pub fn performance_score(&self, rule_id: &str) -> f64 {
        self.states
            .get(rule_id)
            .map(|s| s.performance_score)
            .unwrap_or_else(|| performance_score(&WorkflowMetrics::default()))
    }

    pub fn metrics(&self, rule_id: &str) -> Option<WorkflowMetrics> {
        self.states.get(rule_id).map(|s| s.metrics.clone())
    }

    /// Seed state from persisted performance.
    ///
    /// The per-window adaptation budget is not persisted, so a restart
    /// starts the current window with a fresh budget.
    pub fn restore(&self, rule_id: &str, metrics: WorkflowMetrics, score: f64) {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { performance_score(&metrics) };
        self.states
            .insert(rule_id.to_string(), RuleState::new(metrics, score));
    }

    pub fn snapshot(&self) -> Vec<RulePerformance> {
        let mut out: Vec<RulePerformance> = self
            .states
            .iter()
            .map(|entry| RulePerformance {
                rule_id: entry.key().clone(),
                metrics: entry.metrics.clone(),
                performance_score: entry.performance_score,
                observations_in_window: entry.history.len(),
                updated_at: entry.updated_at,
            })
            .collect();
        out.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));
        out
    }
}
