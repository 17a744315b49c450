// Workflow Executor - Dispatches single actions to their collaborators

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::{BoxFuture, FutureExt};
use leadflow_shared::{ClientDescriptors, ContentRequest, Lead, WorkflowMetrics};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::actions::{
    ChatConfig, ConditionalConfig, ContentConfig, DelayConfig, EmailConfig, TaskConfig,
};
use super::{Action, ActionErrorKind, ActionResult, ActionType, ExecutedAction};
use crate::config::BrandConfig;
use crate::services::metrics::metric_names;
use crate::services::{
    ChatSender, ContentGenerator, EmailSender, LeadScorer, MetricsRegistry, Timer,
};

/// Nested conditionals deeper than this are rejected
pub const MAX_CONDITIONAL_DEPTH: usize = 8;

static TEMPLATE_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").ok());

/// Per-request view of a lead that conditions and actions read from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContext {
    pub lead_id: Uuid,
    pub lead_data: Lead,
    pub current_stage: String,
    #[serde(default)]
    pub previous_actions: Vec<ExecutedAction>,
    #[serde(default)]
    pub performance_metrics: WorkflowMetrics,
    #[serde(default)]
    pub custom_data: Map<String, Value>,
}

impl WorkflowContext {
    pub fn new(lead: Lead, current_stage: &str) -> Self {
        Self {
            lead_id: lead.id,
            lead_data: lead,
            current_stage: current_stage.to_string(),
            previous_actions: Vec::new(),
            performance_metrics: WorkflowMetrics::default(),
            custom_data: Map::new(),
        }
    }

    pub fn with_custom(mut self, key: &str, value: Value) -> Self {
        self.custom_data.insert(key.to_string(), value);
        self
    }

    /// JSON projection that conditions and templates resolve paths against
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Collaborator(String),
    #[error("{0}")]
    Rejected(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("action '{0}' has an unsupported type")]
    Unsupported(String),
}

impl ActionError {
    pub fn kind(&self) -> ActionErrorKind {
        match self {
            Self::Timeout(_) => ActionErrorKind::Timeout,
            Self::Collaborator(_) => ActionErrorKind::Collaborator,
            Self::Rejected(_) => ActionErrorKind::Rejected,
            Self::InvalidConfig(_) => ActionErrorKind::InvalidConfig,
            Self::Unsupported(_) => ActionErrorKind::Unsupported,
        }
    }
}

type ActionOutcome = Result<ActionResult, ActionError>;

pub struct ActionExecutor {
    content: Arc<dyn ContentGenerator>,
    scorer: Arc<dyn LeadScorer>,
    email: Arc<dyn EmailSender>,
    chat: Arc<dyn ChatSender>,
    timeout: Duration,
    metrics: Arc<MetricsRegistry>,
    brand: BrandConfig,
}

impl ActionExecutor {
    pub fn new(
        content: Arc<dyn ContentGenerator>,
        scorer: Arc<dyn LeadScorer>,
        email: Arc<dyn EmailSender>,
        chat: Arc<dyn ChatSender>,
        timeout: Duration,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            content,
            scorer,
            email,
            chat,
            timeout,
            metrics,
            brand: BrandConfig::default(),
        }
    }

    pub fn with_brand(mut self, brand: BrandConfig) -> Self {
        self.brand = brand;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a single action. Never fails: every error becomes a failed
    /// `ActionResult` carrying its kind and the elapsed time.
    pub async fn execute(&self, action: &Action, context: &WorkflowContext) -> ActionResult {
        self.execute_nested(action, context, 0).await
    }

    /// Execute and wrap into an immutable history record
    pub async fn execute_recorded(
        &self,
        action: &Action,
        context: &WorkflowContext,
    ) -> ExecutedAction {
        let executed_at = Utc::now();
        let result = self.execute(action, context).await;
        ExecutedAction::new(action, executed_at, Utc::now(), result)
    }

    fn execute_nested<'a>(
        &'a self,
        action: &'a Action,
        context: &'a WorkflowContext,
        depth: usize,
    ) -> BoxFuture<'a, ActionResult> {
        async move {
            let timer = Timer::start();
            info!("Executing action: {} ({})", action.id, action.action_type);
            self.metrics.increment(metric_names::ACTIONS_EXECUTED_TOTAL);

            // Conditionals keep their embedded condition untouched
            let config = match action.action_type {
                ActionType::Conditional => action.config.clone(),
                _ => process_templates(&action.config, &context.to_json()),
            };

            let outcome = match action.action_type {
                ActionType::NotifyEmail => self.notify_email(&config, context).await,
                ActionType::NotifyChat => self.notify_chat(&config, context).await,
                ActionType::GenerateContent => self.generate_content(&config, context).await,
                ActionType::ScoreLead => self.score_lead(context).await,
                ActionType::UpdateExternalRecord => update_external_record(&config, context),
                ActionType::CreateTask => create_task(&config, context),
                ActionType::Delay => delay(&config),
                ActionType::Conditional => self.conditional(&config, context, depth).await,
                ActionType::Unknown => Err(ActionError::Unsupported(action.id.clone())),
            };

            let duration = timer.elapsed_ms();
            match outcome {
                Ok(result) => result.with_duration(duration),
                Err(e) => {
                    if matches!(e, ActionError::Timeout(_)) {
                        warn!("Action {} timed out after {:?}", action.id, self.timeout);
                        self.metrics.increment(metric_names::ACTION_TIMEOUTS_TOTAL);
                    } else {
                        error!("Action {} failed: {}", action.id, e);
                    }
                    self.metrics.increment(metric_names::ACTION_FAILURES_TOTAL);
                    ActionResult::failure(e.kind(), &e.to_string()).with_duration(duration)
                }
            }
        }
        .boxed()
    }

    /// Bound a collaborator call by the action timeout
    async fn call<T>(&self, fut: impl Future<Output = T>) -> Result<T, ActionError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ActionError::Timeout(self.timeout))
    }

    // ===== Action Implementations =====

    async fn notify_email(&self, config: &Value, context: &WorkflowContext) -> ActionOutcome {
        let cfg: EmailConfig = parse_config(config)?;
        let recipient = context.lead_data.email.as_str();
        let subject = cfg
            .subject
            .unwrap_or_else(|| format!("Update from {}", self.brand.short_name));
        let content = cfg
            .content
            .unwrap_or_else(|| "Thank you for your interest in our services.".to_string());

        if !self.call(self.email.send(recipient, &subject, &content)).await? {
            return Err(ActionError::Rejected(format!(
                "email to {} was not accepted",
                recipient
            )));
        }

        Ok(ActionResult::success(Some(json!({
            "recipient": recipient,
            "subject": subject,
        }))))
    }

    async fn notify_chat(&self, config: &Value, context: &WorkflowContext) -> ActionOutcome {
        let cfg: ChatConfig = parse_config(config)?;
        let message = cfg
            .message
            .unwrap_or_else(|| format!("Workflow action executed for lead {}", context.lead_id));
        let title = format!("Lead workflow: {}", context.lead_data.name);

        if !self.call(self.chat.send(&title, &message)).await? {
            return Err(ActionError::Rejected("chat message was not accepted".to_string()));
        }

        Ok(ActionResult::success(Some(json!({ "message": message }))))
    }

    async fn generate_content(&self, config: &Value, context: &WorkflowContext) -> ActionOutcome {
        let cfg: ContentConfig = parse_config(config)?;
        let request = ContentRequest {
            content_type: cfg
                .content_type
                .unwrap_or_else(|| "email_template".to_string()),
            client: ClientDescriptors::from_lead(&context.lead_data),
            context: format!(
                "Workflow: {}",
                cfg.workflow_context
                    .as_deref()
                    .unwrap_or("Standard engagement")
            ),
            tone: cfg.tone.unwrap_or_default(),
            length: cfg.length.unwrap_or_default(),
        };

        let generated = self.call(self.content.generate(request)).await?;
        if generated.content.trim().is_empty() {
            return Err(ActionError::Collaborator(
                "content generator returned empty content".to_string(),
            ));
        }

        let engagement = generated.estimated_engagement_score / 100.0;
        let degraded = generated.degraded;
        let output = serde_json::to_value(&generated)
            .map_err(|e| ActionError::Collaborator(e.to_string()))?;

        let result = ActionResult::success(Some(output)).with_engagement(engagement);
        if degraded {
            warn!(degraded = true, "Content for lead {} is fallback copy", context.lead_id);
            Ok(result.degraded())
        } else {
            Ok(result)
        }
    }

    async fn score_lead(&self, context: &WorkflowContext) -> ActionOutcome {
        let score = self
            .call(self.scorer.score(&context.lead_data))
            .await?
            .map_err(|e| ActionError::Collaborator(e.to_string()))?;

        let output =
            serde_json::to_value(&score).map_err(|e| ActionError::Collaborator(e.to_string()))?;
        Ok(ActionResult::success(Some(output)))
    }

    async fn conditional(
        &self,
        config: &Value,
        context: &WorkflowContext,
        depth: usize,
    ) -> ActionOutcome {
        if depth >= MAX_CONDITIONAL_DEPTH {
            return Err(ActionError::InvalidConfig(format!(
                "conditional nesting exceeds {} levels",
                MAX_CONDITIONAL_DEPTH
            )));
        }

        let cfg: ConditionalConfig = parse_config(config)?;
        let condition_met = super::conditions::evaluate(&cfg.condition, context);
        let branch = if condition_met { cfg.if_true } else { cfg.if_false };

        match branch {
            Some(nested) => Ok(self.execute_nested(&nested, context, depth + 1).await),
            None => Ok(ActionResult::success(Some(json!({ "conditionMet": condition_met })))),
        }
    }
}

// ===== Local bookkeeping =====

fn update_external_record(config: &Value, context: &WorkflowContext) -> ActionOutcome {
    info!("External record update for lead {}: {}", context.lead_id, config);
    Ok(ActionResult::success(Some(json!({
        "leadId": context.lead_id,
        "fields": config,
    }))))
}

fn create_task(config: &Value, context: &WorkflowContext) -> ActionOutcome {
    let cfg: TaskConfig = parse_config(config)?;
    let hours = positive_or(cfg.delay, 24.0);
    let due_date = hours_from_now(hours)?;
    let task = json!({
        "id": format!("task_{}", Uuid::new_v4()),
        "leadId": context.lead_id,
        "type": cfg.task_type.unwrap_or_else(|| "follow_up".to_string()),
        "dueDate": due_date,
        "description": cfg
            .description
            .unwrap_or_else(|| format!("Follow up with {}", context.lead_data.name)),
        "priority": cfg.priority.unwrap_or_else(|| "medium".to_string()),
    });

    info!("Task created for lead {}", context.lead_id);
    Ok(ActionResult::success(Some(task)))
}

fn delay(config: &Value) -> ActionOutcome {
    let cfg: DelayConfig = parse_config(config)?;
    let hours = positive_or(cfg.hours, 24.0);
    let scheduled_time = hours_from_now(hours)?;

    info!("Action scheduled for: {}", scheduled_time);
    Ok(ActionResult::success(Some(json!({ "scheduledTime": scheduled_time }))))
}

fn parse_config<T: DeserializeOwned>(config: &Value) -> Result<T, ActionError> {
    let config = match config {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(config).map_err(|e| ActionError::InvalidConfig(e.to_string()))
}

fn positive_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(default)
}

/// Offsets that overflow the calendar are a config error, not a panic
fn hours_from_now(hours: f64) -> Result<DateTime<Utc>, ActionError> {
    ChronoDuration::try_seconds((hours * 3600.0).round() as i64)
        .and_then(|offset| Utc::now().checked_add_signed(offset))
        .ok_or_else(|| ActionError::InvalidConfig(format!("{} hours is out of range", hours)))
}

/// Replace `{{path}}` placeholders in string values with context fields
pub fn process_templates(config: &Value, context: &Value) -> Value {
    match config {
        Value::String(s) => Value::String(replace_template_vars(s, context)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), process_templates(v, context)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| process_templates(v, context)).collect()),
        _ => config.clone(),
    }
}

fn replace_template_vars(template: &str, context: &Value) -> String {
    let Some(re) = TEMPLATE_VAR.as_ref() else {
        return template.to_string();
    };

    let mut result = template.to_string();
    for cap in re.captures_iter(template) {
        let var_path = cap[1].trim();
        if let Some(val) = super::conditions::resolve_field(context, var_path) {
            let replacement = match val {
                Value::String(s) => s.clone(),
                Value::Null => continue,
                other => other.to_string(),
            };
            result = result.replace(&cap[0], &replacement);
        }
    }

    result
}
