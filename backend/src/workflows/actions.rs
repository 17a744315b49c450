// Workflow Actions - Typed steps a rule executes, and their recorded outcomes

use chrono::{DateTime, Utc};
use leadflow_shared::{ContentLength, Tone};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Condition;

/// Types of actions that workflows can execute
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    NotifyEmail,
    NotifyChat,
    GenerateContent,
    ScoreLead,
    UpdateExternalRecord,
    CreateTask,
    Delay,
    Conditional,
    /// Any tag this build does not know; executes as a failed action
    #[serde(other)]
    Unknown,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotifyEmail => "notify_email",
            Self::NotifyChat => "notify_chat",
            Self::GenerateContent => "generate_content",
            Self::ScoreLead => "score_lead",
            Self::UpdateExternalRecord => "update_external_record",
            Self::CreateTask => "create_task",
            Self::Delay => "delay",
            Self::Conditional => "conditional",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action template inside a rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Shape depends on `action_type`; see the `*Config` structs below
    #[serde(default)]
    pub config: Value,
}

/// Why an action failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    Timeout,
    Collaborator,
    Rejected,
    InvalidConfig,
    Unsupported,
}

/// Result of executing an action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub error_kind: Option<ActionErrorKind>,
    pub engagement_rate: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub user_feedback: Option<f64>,
    /// Produced by a collaborator running in fallback mode
    #[serde(default)]
    pub degraded: bool,
    pub duration_ms: i64,
}

impl ActionResult {
    pub fn success(output: Option<Value>) -> Self {
        Self {
            success: true,
            output,
            error: None,
            error_kind: None,
            engagement_rate: None,
            conversion_rate: None,
            user_feedback: None,
            degraded: false,
            duration_ms: 0,
        }
    }

    pub fn failure(kind: ActionErrorKind, error: &str) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.to_string()),
            error_kind: Some(kind),
            engagement_rate: None,
            conversion_rate: None,
            user_feedback: None,
            degraded: false,
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_engagement(mut self, rate: f64) -> Self {
        self.engagement_rate = Some(rate.clamp(0.0, 1.0));
        self
    }

    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }
}

/// Observed performance of one executed action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionPerformance {
    pub execution_time_ms: i64,
    pub success: bool,
    pub engagement_rate: f64,
    pub conversion_rate: f64,
    pub user_feedback: f64,
}

/// Immutable record of one action execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedAction {
    #[serde(flatten)]
    pub action: Action,
    pub executed_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub result: ActionResult,
    pub performance: ActionPerformance,
}

impl ExecutedAction {
    pub fn new(
        action: &Action,
        executed_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        result: ActionResult,
    ) -> Self {
        let performance = ActionPerformance {
            execution_time_ms: result.duration_ms,
            success: result.success,
            engagement_rate: result.engagement_rate.unwrap_or(0.0),
            conversion_rate: result.conversion_rate.unwrap_or(0.0),
            user_feedback: result.user_feedback.unwrap_or(0.0),
        };

        Self {
            action: action.clone(),
            executed_at,
            completed_at,
            result,
            performance,
        }
    }
}

// ===== Per-type configuration =====

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    pub subject: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentConfig {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub workflow_context: Option<String>,
    pub tone: Option<Tone>,
    pub length: Option<ContentLength>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    /// Hours until the task is due
    pub delay: Option<f64>,
    pub description: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayConfig {
    pub hours: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalConfig {
    pub condition: Condition,
    pub if_true: Option<Box<Action>>,
    pub if_false: Option<Box<Action>>,
}

impl Action {
    pub fn new(id: &str, action_type: ActionType, config: Value) -> Self {
        Self {
            id: id.to_string(),
            action_type,
            config,
        }
    }

    // ===== Builders =====

    pub fn notify_email(id: &str, subject: &str, content: &str) -> Self {
        Self::new(
            id,
            ActionType::NotifyEmail,
            serde_json::json!({ "subject": subject, "content": content }),
        )
    }

    pub fn notify_chat(id: &str, message: &str) -> Self {
        Self::new(id, ActionType::NotifyChat, serde_json::json!({ "message": message }))
    }

    pub fn generate_content(id: &str, content_type: &str) -> Self {
        Self::new(id, ActionType::GenerateContent, serde_json::json!({ "type": content_type }))
    }

    pub fn score_lead(id: &str) -> Self {
        Self::new(id, ActionType::ScoreLead, serde_json::json!({}))
    }

    pub fn update_external_record(id: &str, fields: Value) -> Self {
        Self::new(id, ActionType::UpdateExternalRecord, fields)
    }

    pub fn create_task(id: &str, delay_hours: f64) -> Self {
        Self::new(id, ActionType::CreateTask, serde_json::json!({ "delay": delay_hours }))
    }

    pub fn delay(id: &str, hours: f64) -> Self {
        Self::new(id, ActionType::Delay, serde_json::json!({ "hours": hours }))
    }

    pub fn conditional(
        id: &str,
        condition: Condition,
        if_true: Option<Action>,
        if_false: Option<Action>,
    ) -> Self {
        Self::new(
            id,
            ActionType::Conditional,
            serde_json::json!({
                "condition": condition,
                "ifTrue": if_true,
                "ifFalse": if_false,
            }),
        )
    }

    /// Set one key in an object config
    pub fn with_config(mut self, key: &str, value: Value) -> Self {
        if !self.config.is_object() {
            self.config = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = &mut self.config {
            map.insert(key.to_string(), value);
        }
        self
    }
}

/// Common action sequences
pub mod presets {
    use super::*;

    /// Score, draft, send, then schedule a follow-up a day later
    pub fn qualification_sequence() -> Vec<Action> {
        vec![
            Action::score_lead("score_lead"),
            Action::generate_content("generate_content", "qualification_email"),
            Action::new("send_email", ActionType::NotifyEmail, serde_json::json!({})),
            Action::create_task("schedule_followup", 24.0),
        ]
    }

    pub fn thank_you_email() -> Action {
        Action::notify_email(
            "default_action",
            "Thank you for your interest",
            "We will be in touch soon.",
        )
    }

    /// Two spaced-out proposal follow-ups (72h, then 168h)
    pub fn proposal_follow_ups() -> Vec<Action> {
        vec![
            Action::generate_content("proposal_followup_1", "proposal_followup")
                .with_config("delay", serde_json::json!(72)),
            Action::generate_content("proposal_followup_2", "gentle_reminder")
                .with_config("delay", serde_json::json!(168)),
        ]
    }
}
