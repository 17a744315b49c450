// Workflow Conditions - Weighted predicates evaluated against a workflow context

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::WorkflowContext;

/// Condition operators
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    /// Inclusive `[min, max]`
    InRange,
    /// Field must be a list holding the comparison value
    HasTag,
}

/// A single weighted condition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    /// Field name to evaluate (supports dot notation for nested fields)
    pub field: String,
    /// Operator for comparison
    pub operator: ConditionOperator,
    /// Value to compare against
    pub value: Value,
    /// Share of the rule's applicability score, in (0, 1]
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Condition {
    pub fn new(field: &str, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value,
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn equals(field: &str, value: Value) -> Self {
        Self::new(field, ConditionOperator::Equals, value)
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self::new(field, ConditionOperator::Contains, Value::String(value.to_string()))
    }

    pub fn greater_than(field: &str, value: f64) -> Self {
        Self::new(field, ConditionOperator::GreaterThan, serde_json::json!(value))
    }

    pub fn less_than(field: &str, value: f64) -> Self {
        Self::new(field, ConditionOperator::LessThan, serde_json::json!(value))
    }

    pub fn in_range(field: &str, min: f64, max: f64) -> Self {
        Self::new(field, ConditionOperator::InRange, serde_json::json!([min, max]))
    }

    pub fn has_tag(field: &str, tag: &str) -> Self {
        Self::new(field, ConditionOperator::HasTag, Value::String(tag.to_string()))
    }

    /// Evaluate against a JSON projection of the context.
    ///
    /// Never fails: missing fields and malformed operands make the
    /// condition false. A missing field only matches `equals null`.
    pub fn matches(&self, context: &Value) -> bool {
        let resolved = resolve_field(context, &self.field);

        match self.operator {
            ConditionOperator::Equals => equals(resolved, &self.value),
            ConditionOperator::Contains => match resolved {
                Some(actual) => stringify(actual)
                    .to_lowercase()
                    .contains(&stringify(&self.value).to_lowercase()),
                None => false,
            },
            ConditionOperator::GreaterThan => {
                match (resolved.and_then(as_number), as_number(&self.value)) {
                    (Some(actual), Some(expected)) => actual > expected,
                    _ => false,
                }
            }
            ConditionOperator::LessThan => {
                match (resolved.and_then(as_number), as_number(&self.value)) {
                    (Some(actual), Some(expected)) => actual < expected,
                    _ => false,
                }
            }
            ConditionOperator::InRange => {
                let bounds = match self.value.as_array() {
                    Some(bounds) if bounds.len() == 2 => bounds,
                    _ => return false,
                };
                match (
                    resolved.and_then(as_number),
                    as_number(&bounds[0]),
                    as_number(&bounds[1]),
                ) {
                    (Some(actual), Some(min), Some(max)) => min <= actual && actual <= max,
                    _ => false,
                }
            }
            ConditionOperator::HasTag => match resolved {
                Some(Value::Array(tags)) => tags.contains(&self.value),
                _ => false,
            },
        }
    }
}

/// Evaluate one condition against a context
pub fn evaluate(condition: &Condition, context: &WorkflowContext) -> bool {
    condition.matches(&context.to_json())
}

/// Resolve a dotted path. Paths whose first segment is unknown at the root
/// are retried under `customData` and then `leadData`, so rules can say
/// `leadScore` or `budget` without spelling out where the value lives.
pub fn resolve_field<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    let head = path.split('.').next().unwrap_or(path);

    let base = if context.get(head).is_some() {
        context
    } else if context.get("customData").and_then(|c| c.get(head)).is_some() {
        &context["customData"]
    } else {
        context.get("leadData")?
    };

    get_nested_value(base, path)
}

fn get_nested_value<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = json;

    for part in path.split('.') {
        current = match current {
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => current.get(part)?,
        };
    }

    // null is treated the same as a missing field
    if current.is_null() { None } else { Some(current) }
}

fn equals(resolved: Option<&Value>, expected: &Value) -> bool {
    let Some(actual) = resolved else {
        return expected.is_null();
    };

    match expected {
        Value::Null => false,
        Value::Number(_) => match (as_number(actual), as_number(expected)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Value::Bool(b) => as_bool(actual) == Some(*b),
        Value::String(s) => stringify(actual) == *s,
        _ => actual == expected,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Preset conditions for common lead rules
pub mod presets {
    use super::*;

    /// Strong inbound lead: high score with a meaningful budget
    pub fn qualified_lead() -> Vec<Condition> {
        vec![
            Condition::greater_than("leadScore", 70.0).with_weight(0.8),
            Condition::greater_than("budget", 5000.0).with_weight(0.6),
        ]
    }

    /// Lead from an enterprise-sized organization
    pub fn enterprise_lead() -> Vec<Condition> {
        vec![Condition::equals("leadData.companySize", serde_json::json!("enterprise"))]
    }

    /// Lead that mentioned urgency in the inquiry
    pub fn urgent_inquiry() -> Vec<Condition> {
        vec![
            Condition::contains("leadData.message", "urgent").with_weight(0.5),
            Condition::equals("leadData.urgency", serde_json::json!("high")).with_weight(0.5),
        ]
    }
}
