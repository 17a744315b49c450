use std::env;
use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    /// When unset, rules and performance history live in process memory only
    pub database_url: Option<String>,
    pub smtp: SmtpConfig,
    pub chat: ChatConfig,
    pub content: ContentApiConfig,
    pub workflow: WorkflowConfig,
}

/// SMTP configuration for sending emails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

/// Organization named in outbound copy and generation prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandConfig {
    pub organization: String,
    /// Used in subjects and as the default sender name
    pub short_name: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            organization: "Prism Writing Cooperative".to_string(),
            short_name: "Prism Writing".to_string(),
        }
    }
}

/// Incoming-webhook target for chat notifications
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    pub webhook_url: Option<String>,
}

/// Chat-completions backend used for content generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// Orchestration tuning
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    pub applicability_threshold: f64,
    pub performance_weight: f64,
    pub context_weight: f64,
    pub max_concurrent_workflows: usize,
    /// Per collaborator call, kept within 10..=30 seconds
    pub action_timeout: Duration,
    pub brand: BrandConfig,
}

pub const MIN_ACTION_TIMEOUT_SECS: u64 = 10;
pub const MAX_ACTION_TIMEOUT_SECS: u64 = 30;

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            applicability_threshold: 0.5,
            performance_weight: 0.6,
            context_weight: 0.4,
            max_concurrent_workflows: 16,
            action_timeout: Duration::from_secs(15),
            brand: BrandConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = WorkflowConfig::default();
        let timeout_secs: u64 = parse_env("WORKFLOW_ACTION_TIMEOUT_SECS", 15);
        let brand = BrandConfig {
            organization: env::var("BRAND_ORGANIZATION").unwrap_or(defaults.brand.organization),
            short_name: env::var("BRAND_SHORT_NAME").unwrap_or(defaults.brand.short_name),
        };

        Ok(Config {
            server_addr: env::var("SERVER_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or_default(),
                port: parse_env("SMTP_PORT", 2525),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_email: env::var("SMTP_FROM_EMAIL")
                    .unwrap_or_else(|_| "hello@prismwriting.com".to_string()),
                from_name: env::var("SMTP_FROM_NAME")
                    .unwrap_or_else(|_| brand.short_name.clone()),
            },
            chat: ChatConfig {
                webhook_url: env::var("CHAT_WEBHOOK_URL").ok().filter(|url| !url.trim().is_empty()),
            },
            content: ContentApiConfig {
                api_key: env::var("CONTENT_API_KEY").ok().filter(|key| !key.trim().is_empty()),
                base_url: env::var("CONTENT_API_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("CONTENT_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            },
            workflow: WorkflowConfig {
                applicability_threshold: parse_env(
                    "WORKFLOW_APPLICABILITY_THRESHOLD",
                    defaults.applicability_threshold,
                ),
                performance_weight: parse_env("WORKFLOW_PERFORMANCE_WEIGHT", defaults.performance_weight),
                context_weight: parse_env("WORKFLOW_CONTEXT_WEIGHT", defaults.context_weight),
                max_concurrent_workflows: parse_env(
                    "WORKFLOW_MAX_CONCURRENT",
                    defaults.max_concurrent_workflows,
                )
                .max(1),
                action_timeout: Duration::from_secs(
                    timeout_secs.clamp(MIN_ACTION_TIMEOUT_SECS, MAX_ACTION_TIMEOUT_SECS),
                ),
                brand,
            },
        })
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl SmtpConfig {
    /// Check if SMTP is properly configured
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

impl ContentApiConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
