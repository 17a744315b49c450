// Rule Selector - Picks one rule per request from applicability and past performance

use leadflow_shared::WorkflowMetrics;
use serde::Serialize;
use serde_json::Value;

use super::rules::{self, Rule};
use super::WorkflowContext;
use crate::config::WorkflowConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionWeights {
    /// Rules must score strictly above this to be considered
    pub applicability_threshold: f64,
    pub performance_weight: f64,
    pub context_weight: f64,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            applicability_threshold: 0.5,
            performance_weight: 0.6,
            context_weight: 0.4,
        }
    }
}

impl From<&WorkflowConfig> for SelectionWeights {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            applicability_threshold: config.applicability_threshold,
            performance_weight: config.performance_weight,
            context_weight: config.context_weight,
        }
    }
}

/// Historical quality of a rule in [0, 1]
pub fn performance_score(metrics: &WorkflowMetrics) -> f64 {
    let cost_factor = 1.0 - (metrics.cost_per_conversion / 1000.0).min(1.0);
    let score = 0.4 * metrics.success_rate
        + 0.3 * metrics.average_engagement_score
        + 0.3 * cost_factor;

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// The winning rule and how it scored
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub rule: Rule,
    pub applicability: f64,
    pub performance: f64,
    pub combined: f64,
    /// No rule qualified; the built-in default was used
    pub fallback: bool,
}

pub struct RuleSelector {
    weights: SelectionWeights,
    default_rule: Rule,
}

impl RuleSelector {
    pub fn new(weights: SelectionWeights) -> Self {
        Self {
            weights,
            default_rule: rules::presets::default_rule(),
        }
    }

    pub fn weights(&self) -> SelectionWeights {
        self.weights
    }

    /// Best qualifying rule, or `None` when nothing clears the threshold.
    ///
    /// Ties on the combined score go to higher priority, then to the
    /// lexically smaller id.
    pub fn select_candidate<F>(
        &self,
        candidates: &[Rule],
        context: &Value,
        performance: F,
    ) -> Option<Selection>
    where
        F: Fn(&str) -> f64,
    {
        candidates
            .iter()
            .filter(|rule| rule.is_active)
            .filter_map(|rule| {
                let applicability = rules::score(rule, context);
                if applicability <= self.weights.applicability_threshold {
                    return None;
                }
                Some(self.evaluate(rule, applicability, &performance, false))
            })
            .max_by(|a, b| {
                a.combined
                    .total_cmp(&b.combined)
                    .then_with(|| a.rule.priority.cmp(&b.rule.priority))
                    .then_with(|| b.rule.id.cmp(&a.rule.id))
            })
    }

    /// Always yields exactly one rule; falls back to the built-in default
    pub fn select<F>(&self, candidates: &[Rule], context: &WorkflowContext, performance: F) -> Selection
    where
        F: Fn(&str) -> f64,
    {
        let projection = context.to_json();
        match self.select_candidate(candidates, &projection, &performance) {
            Some(selection) => selection,
            None => {
                let applicability = rules::score(&self.default_rule, &projection);
                self.evaluate(&self.default_rule, applicability, &performance, true)
            }
        }
    }

    fn evaluate<F>(&self, rule: &Rule, applicability: f64, performance: &F, fallback: bool) -> Selection
    where
        F: Fn(&str) -> f64,
    {
        let perf = performance(&rule.id);
        let perf = if perf.is_finite() { perf.clamp(0.0, 1.0) } else { 0.0 };
        let combined =
            self.weights.performance_weight * perf + self.weights.context_weight * applicability;

        Selection {
            rule: rule.clone(),
            applicability,
            performance: perf,
            combined,
            fallback,
        }
    }
}

impl Default for RuleSelector {
    fn default() -> Self {
        Self::new(SelectionWeights::default())
    }
}
