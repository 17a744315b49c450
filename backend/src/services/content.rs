//! Content generation against an OpenAI-compatible chat-completions API.
//!
//! When the backend is unconfigured or unreachable the generator answers
//! with deterministic fallback copy marked `degraded`, logs it, and bumps
//! `content_degraded_total`.

use async_trait::async_trait;
use leadflow_shared::{
    ContentLength, ContentRequest, GeneratedContent, Investment, Lead, ProposalDraft, Tone,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::metrics::metric_names;
use super::{ContentGenerator, MetricsRegistry};
use crate::config::{BrandConfig, ContentApiConfig};

fn system_prompt(organization: &str) -> String {
    format!(
        "You are an expert technical writing consultant and marketing specialist for {}. Generate high-quality, personalized content that converts leads into clients.",
        organization
    )
}
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f64 = 0.7;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content API key is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("content API returned status {0}")]
    Status(u16),
    #[error("content API returned no choices")]
    EmptyReply,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Loosely-typed reply; every field may be missing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentReply {
    content: Option<String>,
    message: Option<String>,
    subject: Option<String>,
    call_to_action: Option<String>,
    personalization_elements: Option<Vec<String>>,
    recommended_follow_up: Option<String>,
    estimated_engagement_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProposalReply {
    executive_summary: Option<String>,
    scope_of_work: Option<String>,
    timeline: Option<String>,
    deliverables: Option<Vec<String>>,
    investment: Option<Investment>,
    next_steps: Option<Vec<String>>,
}

pub struct HttpContentGenerator {
    client: reqwest::Client,
    config: ContentApiConfig,
    metrics: Arc<MetricsRegistry>,
    brand: BrandConfig,
}

impl HttpContentGenerator {
    pub fn new(config: ContentApiConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            metrics,
            brand: BrandConfig::default(),
        }
    }

    pub fn with_brand(mut self, brand: BrandConfig) -> Self {
        self.brand = brand;
        self
    }

    async fn complete(&self, prompt: String) -> Result<String, ContentError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ContentError::NotConfigured)?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(&self.brand.organization),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ContentError::Status(response.status().as_u16()));
        }

        let reply: ChatCompletionResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ContentError::EmptyReply)
    }

    fn record_degraded(&self, what: &str, error: &ContentError) {
        warn!(degraded = true, "Falling back to canned {}: {}", what, error);
        self.metrics.increment(metric_names::CONTENT_DEGRADED_TOTAL);
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(&self, request: ContentRequest) -> GeneratedContent {
        match self.complete(content_prompt(&request, &self.brand.organization)).await {
            Ok(reply) => {
                debug!("Generated {} content for {}", request.content_type, request.client.name);
                parse_content_reply(&reply)
            }
            Err(e) => {
                self.record_degraded("content", &e);
                GeneratedContent::fallback(&request, &self.brand.organization)
            }
        }
    }

    async fn generate_proposal(&self, lead: &Lead) -> ProposalDraft {
        match self.complete(proposal_prompt(lead)).await {
            Ok(reply) => match serde_json::from_str::<ProposalReply>(&reply) {
                Ok(parsed) => proposal_from_reply(parsed),
                Err(e) => {
                    warn!(degraded = true, "Unparseable proposal reply: {}", e);
                    self.metrics.increment(metric_names::CONTENT_DEGRADED_TOTAL);
                    ProposalDraft::fallback(lead, &self.brand.organization)
                }
            },
            Err(e) => {
                self.record_degraded("proposal", &e);
                ProposalDraft::fallback(lead, &self.brand.organization)
            }
        }
    }
}

fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => "professional",
        Tone::Friendly => "friendly",
        Tone::Technical => "technical",
        Tone::Persuasive => "persuasive",
        Tone::Consultative => "consultative",
    }
}

fn length_label(length: ContentLength) -> &'static str {
    match length {
        ContentLength::Short => "short",
        ContentLength::Medium => "medium",
        ContentLength::Long => "long",
    }
}

fn content_prompt(request: &ContentRequest, organization: &str) -> String {
    let client = &request.client;
    format!(
        r#"Generate {length} {kind} content with a {tone} tone for:

Client Information:
- Name: {name}
- Company: {company}
- Industry: {industry}
- Project Type: {project}
- Budget Range: {budget}
- Company Size: {size}
- Urgency: {urgency}

Context: {context}

Requirements:
- Personalize based on client's industry and project needs
- Include specific benefits relevant to their business
- Include a clear call-to-action
- Reference {organization}'s expertise in technical writing

Please format the response as JSON with:
{{
  "subject": "Email subject line (if applicable)",
  "content": "Main content body",
  "callToAction": "Specific call-to-action",
  "personalizationElements": ["element1", "element2"],
  "recommendedFollowUp": "Suggested next step",
  "estimatedEngagementScore": 0-100
}}"#,
        length = length_label(request.length),
        kind = request.content_type,
        tone = tone_label(request.tone),
        name = client.name,
        company = client.company,
        industry = client.industry,
        project = client.project_type,
        budget = client.budget_range,
        size = client.company_size,
        urgency = client.urgency,
        context = request.context,
        organization = organization,
    )
}

fn proposal_prompt(lead: &Lead) -> String {
    format!(
        r#"Generate a comprehensive proposal draft for:

Lead Information:
- Name: {}
- Company: {}
- Email: {}
- Phone: {}
- Project Type: {}
- Budget: {}
- Timeline: {}
- Message: {}

Generate a professional proposal including executive summary, scope of work,
timeline and milestones, deliverables, investment (pricing structure) and next steps.

Format as JSON with the keys executiveSummary, scopeOfWork, timeline, deliverables,
investment {{ range, justification }} and nextSteps."#,
        lead.name,
        lead.company,
        lead.email,
        lead.phone.as_deref().unwrap_or("Not provided"),
        lead.project_type.as_deref().unwrap_or("General technical writing"),
        lead.budget.as_deref().unwrap_or("To be discussed"),
        lead.timeline.as_deref().unwrap_or("Flexible"),
        lead.message,
    )
}

fn parse_content_reply(reply: &str) -> GeneratedContent {
    match serde_json::from_str::<ContentReply>(reply) {
        Ok(parsed) => GeneratedContent {
            content: parsed
                .content
                .or(parsed.message)
                .unwrap_or_else(|| reply.to_string()),
            subject: parsed.subject,
            call_to_action: parsed
                .call_to_action
                .unwrap_or_else(|| "Contact us to learn more".to_string()),
            personalization_elements: parsed.personalization_elements.unwrap_or_default(),
            recommended_follow_up: parsed.recommended_follow_up,
            estimated_engagement_score: parsed
                .estimated_engagement_score
                .filter(|score| *score > 0.0)
                .unwrap_or(75.0),
            degraded: false,
        },
        Err(_) => GeneratedContent {
            content: reply.to_string(),
            subject: None,
            call_to_action: "Contact us to learn more".to_string(),
            personalization_elements: vec!["Personalized content".to_string()],
            recommended_follow_up: None,
            estimated_engagement_score: 70.0,
            degraded: false,
        },
    }
}

fn proposal_from_reply(parsed: ProposalReply) -> ProposalDraft {
    ProposalDraft {
        executive_summary: parsed
            .executive_summary
            .unwrap_or_else(|| "Executive summary of proposed services".to_string()),
        scope_of_work: parsed
            .scope_of_work
            .unwrap_or_else(|| "Detailed scope of work".to_string()),
        timeline: parsed
            .timeline
            .unwrap_or_else(|| "Project timeline to be determined".to_string()),
        deliverables: parsed.deliverables.unwrap_or_else(|| {
            vec![
                "Technical documentation".to_string(),
                "Process improvement".to_string(),
            ]
        }),
        investment: parsed.investment.unwrap_or_else(|| Investment {
            range: "$5,000 - $15,000".to_string(),
            justification: "Based on project complexity and scope".to_string(),
        }),
        next_steps: parsed.next_steps.unwrap_or_else(|| {
            vec![
                "Schedule discovery call".to_string(),
                "Review requirements".to_string(),
            ]
        }),
        degraded: false,
    }
}
