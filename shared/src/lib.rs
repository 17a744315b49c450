use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A prospective client as handed over by the intake surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
    pub project_type: Option<String>,
    pub budget: Option<String>, // free text, e.g. "$5,000 - $10,000" or "10k"
    pub timeline: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub urgency: Option<String>,
    #[serde(default)]
    pub added_to_newsletter: bool,
    #[serde(default)]
    pub allow_follow_up: bool,
    #[serde(default = "default_lead_status")]
    pub status: String,
    #[serde(default = "default_lead_priority")]
    pub priority: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_lead_status() -> String {
    "NEW".to_string()
}

fn default_lead_priority() -> String {
    "MEDIUM".to_string()
}

impl Lead {
    pub fn new(name: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            company: String::new(),
            phone: None,
            message: String::new(),
            project_type: None,
            budget: None,
            timeline: None,
            industry: None,
            company_size: None,
            urgency: None,
            added_to_newsletter: false,
            allow_follow_up: false,
            status: default_lead_status(),
            priority: default_lead_priority(),
            created_at: now,
            updated_at: now,
        }
    }

    /// First amount mentioned in the budget text. Understands thousands
    /// separators, a leading currency sign and a `k` suffix.
    pub fn budget_amount(&self) -> Option<f64> {
        parse_amount(self.budget.as_deref()?)
    }

    pub fn is_enterprise(&self) -> bool {
        self.company_size
            .as_deref()
            .is_some_and(|size| size.eq_ignore_ascii_case("enterprise"))
    }

    pub fn email_domain(&self) -> &str {
        self.email.split('@').nth(1).unwrap_or("")
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(rest.len());
    let amount: f64 = rest[..end].replace(',', "").trim_end_matches('.').parse().ok()?;

    match rest[end..].chars().next() {
        Some('k') | Some('K') => Some(amount * 1000.0),
        _ => Some(amount),
    }
}

/// Aggregate outcome counters for one rule.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetrics {
    pub total_executions: i64,
    pub success_rate: f64,
    pub average_conversion_time: f64, // days
    pub average_engagement_score: f64,
    pub cost_per_conversion: f64,
    pub customer_satisfaction_score: f64,
}

impl Default for WorkflowMetrics {
    fn default() -> Self {
        Self {
            total_executions: 0,
            success_rate: 0.75,
            average_conversion_time: 5.2,
            average_engagement_score: 0.68,
            cost_per_conversion: 150.0,
            customer_satisfaction_score: 8.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Technical,
    Persuasive,
    Consultative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentLength {
    Short,
    #[default]
    Medium,
    Long,
}

/// Lead descriptors forwarded to the content generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDescriptors {
    pub name: String,
    pub company: String,
    pub industry: String,
    pub project_type: String,
    pub budget_range: String,
    pub company_size: String,
    pub urgency: String,
}

impl ClientDescriptors {
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            name: lead.name.clone(),
            company: lead.company.clone(),
            industry: lead.industry.clone().unwrap_or_else(|| "General".to_string()),
            project_type: lead
                .project_type
                .clone()
                .unwrap_or_else(|| "Writing Services".to_string()),
            budget_range: lead.budget.clone().unwrap_or_else(|| "Not specified".to_string()),
            company_size: lead.company_size.clone().unwrap_or_else(|| "Small".to_string()),
            urgency: lead.urgency.clone().unwrap_or_else(|| "Medium".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub content_type: String,
    pub client: ClientDescriptors,
    pub context: String,
    pub tone: Tone,
    pub length: ContentLength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub call_to_action: String,
    pub personalization_elements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_follow_up: Option<String>,
    pub estimated_engagement_score: f64,
    /// Set when the generator could not reach its backend and produced
    /// the canned fallback instead.
    #[serde(default)]
    pub degraded: bool,
}

impl GeneratedContent {
    pub fn fallback(request: &ContentRequest, organization: &str) -> Self {
        let client = &request.client;
        let mut content = format!(
            "Dear {},\n\nThank you for your interest in {}'s services.",
            client.name, organization
        );

        if !client.industry.is_empty() {
            content.push_str(&format!(
                " We understand the unique challenges in the {} industry and specialize in creating documentation that meets your specific needs.",
                client.industry
            ));
        }

        let project = if client.project_type.is_empty() {
            "business"
        } else {
            client.project_type.as_str()
        };
        content.push_str(&format!(
            "\n\nOur team of expert technical writers can help you:\n- Streamline your documentation processes\n- Improve communication efficiency\n- Ensure compliance and quality standards\n\nWe'd love to discuss how we can support your {} goals.",
            project
        ));

        let company = if client.company.is_empty() {
            "Your Business"
        } else {
            client.company.as_str()
        };

        Self {
            content,
            subject: Some(format!("Technical Writing Solutions for {}", company)),
            call_to_action: "Schedule a free consultation to discuss your needs".to_string(),
            personalization_elements: [&client.industry, &client.project_type]
                .into_iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect(),
            recommended_follow_up: Some("Send calendar scheduling link".to_string()),
            estimated_engagement_score: 75.0,
            degraded: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub range: String,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDraft {
    pub executive_summary: String,
    pub scope_of_work: String,
    pub timeline: String,
    pub deliverables: Vec<String>,
    pub investment: Investment,
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub degraded: bool,
}

impl ProposalDraft {
    pub fn fallback(lead: &Lead, organization: &str) -> Self {
        Self {
            executive_summary: format!(
                "{} proposes comprehensive technical writing services for {}. Our team will work closely with you to understand your documentation needs and deliver high-quality, professional content.",
                organization, lead.company
            ),
            scope_of_work: "Complete assessment of current documentation, creation of new materials, and optimization of existing content to meet industry standards and business objectives.".to_string(),
            timeline: "4-8 weeks depending on project scope and complexity".to_string(),
            deliverables: vec![
                "Documentation audit and assessment".to_string(),
                "New technical documentation".to_string(),
                "Style guide and templates".to_string(),
                "Training and support".to_string(),
            ],
            investment: Investment {
                range: "$3,000 - $12,000".to_string(),
                justification: "Investment based on project scope, complexity, and timeline requirements".to_string(),
            },
            next_steps: vec![
                "Schedule discovery call to review requirements".to_string(),
                "Provide detailed project scope and timeline".to_string(),
                "Present final proposal and pricing".to_string(),
                "Execute service agreement and begin work".to_string(),
            ],
            degraded: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadGrade {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadPriority {
    Urgent,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub contact_info: u32,
    pub project_value: u32,
    pub urgency: u32,
    pub engagement: u32,
    pub company_size: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.contact_info + self.project_value + self.urgency + self.engagement + self.company_size
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadScore {
    pub lead_id: Uuid,
    pub total: u32, // 0..=100
    pub breakdown: ScoreBreakdown,
    pub grade: LeadGrade,
    pub priority: LeadPriority,
    pub recommendations: Vec<String>,
}
