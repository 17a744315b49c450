// Workflow Rules - Condition-gated action templates and their applicability score

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Action, Condition, WorkflowContext};

pub const DEFAULT_RULE_ID: &str = "default";

/// How far and how often a rule's performance score may move
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AdaptationSettings {
    /// EWMA step size
    pub learning_rate: f64,
    /// Largest score move a single execution may cause
    pub adaptation_threshold: f64,
    /// Score updates allowed per performance window
    pub max_adaptations: u32,
    /// Window length in days
    #[serde(alias = "performanceWindow")]
    pub performance_window_days: u32,
}

impl Default for AdaptationSettings {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            adaptation_threshold: 0.05,
            max_adaptations: 5,
            performance_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Tie-break only; higher wins
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub adaptation_settings: AdaptationSettings,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RuleError {
    #[error("rule id must not be empty")]
    EmptyId,
    #[error("condition on '{field}' has non-positive weight {weight}")]
    InvalidWeight { field: String, weight: f64 },
    #[error("invalid adaptation settings: {0}")]
    InvalidSettings(String),
}

impl Rule {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            conditions: Vec::new(),
            actions: Vec::new(),
            priority: 0,
            is_active: true,
            adaptation_settings: AdaptationSettings::default(),
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_settings(mut self, settings: AdaptationSettings) -> Self {
        self.adaptation_settings = settings;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Structural checks applied when rules are loaded
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.id.trim().is_empty() {
            return Err(RuleError::EmptyId);
        }

        for condition in &self.conditions {
            if !(condition.weight.is_finite() && condition.weight > 0.0) {
                return Err(RuleError::InvalidWeight {
                    field: condition.field.clone(),
                    weight: condition.weight,
                });
            }
        }

        let settings = &self.adaptation_settings;
        if !(0.0..=1.0).contains(&settings.learning_rate) {
            return Err(RuleError::InvalidSettings(format!(
                "learning rate {} outside [0, 1]",
                settings.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&settings.adaptation_threshold) {
            return Err(RuleError::InvalidSettings(format!(
                "adaptation threshold {} outside [0, 1]",
                settings.adaptation_threshold
            )));
        }
        if settings.performance_window_days == 0 {
            return Err(RuleError::InvalidSettings(
                "performance window must be at least one day".to_string(),
            ));
        }

        Ok(())
    }

    /// Applicability of this rule to a context, in [0, 1]
    pub fn applicability(&self, context: &WorkflowContext) -> f64 {
        score(self, &context.to_json())
    }
}

/// Weighted fraction of the rule's conditions that hold.
///
/// A rule without conditions applies everywhere and scores 1. Conditions
/// with a non-positive weight contribute nothing.
pub fn score(rule: &Rule, context: &Value) -> f64 {
    if rule.conditions.is_empty() {
        return 1.0;
    }

    let mut matched_weight = 0.0;
    let mut total_weight = 0.0;

    for condition in &rule.conditions {
        if !(condition.weight.is_finite() && condition.weight > 0.0) {
            continue;
        }
        if condition.matches(context) {
            matched_weight += condition.weight;
        }
        total_weight += condition.weight;
    }

    if total_weight > 0.0 {
        (matched_weight / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Built-in rules
pub mod presets {
    use super::*;
    use crate::workflows::actions::presets as actions;
    use crate::workflows::conditions::presets as conditions;

    pub fn lead_qualification() -> Rule {
        Rule::new("lead_qualification", "Intelligent Lead Qualification")
            .with_conditions(conditions::qualified_lead())
            .with_actions(actions::qualification_sequence())
            .with_priority(1)
    }

    /// Fallback used when no active rule is applicable
    pub fn default_rule() -> Rule {
        Rule::new(DEFAULT_RULE_ID, "Default Workflow")
            .with_actions(vec![actions::thank_you_email()])
            .with_settings(AdaptationSettings {
                max_adaptations: 3,
                ..AdaptationSettings::default()
            })
    }

    /// Rules seeded into a fresh store
    pub fn all() -> Vec<Rule> {
        vec![lead_qualification()]
    }
}
