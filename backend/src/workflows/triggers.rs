// Workflow Triggers - Inbound lead events and their translation into contexts

use chrono::{DateTime, Utc};
use leadflow_shared::{Lead, WorkflowMetrics};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{ExecutedAction, WorkflowContext};

/// Types of lead events that can start a workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadEventType {
    AccountCreated,
    AgreementSigned,
    InquiryEmail,
    LeadUpdated,
}

impl LeadEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountCreated => "account_created",
            Self::AgreementSigned => "agreement_signed",
            Self::InquiryEmail => "inquiry_email",
            Self::LeadUpdated => "lead_updated",
        }
    }

    /// Pipeline stage assumed when the caller does not name one
    pub fn default_stage(&self) -> &'static str {
        match self {
            Self::AccountCreated => "onboarding",
            Self::AgreementSigned => "contracted",
            Self::InquiryEmail => "inquiry",
            Self::LeadUpdated => "nurture",
        }
    }
}

/// An event about a lead, as submitted by the inbound surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadEvent {
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    pub event_type: LeadEventType,
    pub lead: Lead,
    pub current_stage: Option<String>,
    pub custom_data: Option<Map<String, Value>>,
    pub performance_metrics: Option<WorkflowMetrics>,
    #[serde(default)]
    pub previous_actions: Vec<ExecutedAction>,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl LeadEvent {
    pub fn new(event_type: LeadEventType, lead: Lead) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            lead,
            current_stage: None,
            custom_data: None,
            performance_metrics: None,
            previous_actions: Vec::new(),
            received_at: Utc::now(),
        }
    }

    pub fn account_created(lead: Lead) -> Self {
        Self::new(LeadEventType::AccountCreated, lead)
    }

    pub fn agreement_signed(lead: Lead) -> Self {
        Self::new(LeadEventType::AgreementSigned, lead)
    }

    pub fn inquiry_email(lead: Lead) -> Self {
        Self::new(LeadEventType::InquiryEmail, lead)
    }

    pub fn with_custom(mut self, key: &str, value: Value) -> Self {
        self.custom_data
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        self
    }

    pub fn into_context(self) -> WorkflowContext {
        let stage = self
            .current_stage
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.event_type.default_stage().to_string());

        let mut context = WorkflowContext::new(self.lead, &stage);
        context.previous_actions = self.previous_actions;
        if let Some(metrics) = self.performance_metrics {
            context.performance_metrics = metrics;
        }
        if let Some(custom) = self.custom_data {
            context.custom_data = custom;
        }
        context
            .custom_data
            .insert("eventType".to_string(), Value::from(self.event_type.as_str()));
        context
    }
}
