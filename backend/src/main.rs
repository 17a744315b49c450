use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod database;
mod error;
mod handlers;
mod services;
mod validation;
mod workflows;

pub use error::{ApiResult, AppError};

use services::{
    ChatSender, DisabledSender, EmailSender, HeuristicLeadScorer, HttpContentGenerator,
    MetricsRegistry, SmtpEmailSender, WebhookChatSender,
};
use workflows::{Collaborators, InMemoryRuleStore, PgRuleStore, RuleStore, WorkflowOrchestrator};

#[cfg(test)]
mod tests;

pub struct AppState {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub metrics: Arc<MetricsRegistry>,
    /// Present only when rules persist in Postgres
    pub db_pool: Option<sqlx::PgPool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    let metrics = Arc::new(MetricsRegistry::new());

    let (store, db_pool): (Arc<dyn RuleStore>, Option<sqlx::PgPool>) = match &config.database_url {
        Some(url) => {
            let pool = database::create_pool(url).await?;
            database::migrate(&pool).await?;
            let store = PgRuleStore::new(pool.clone());
            store.seed_presets().await?;
            (Arc::new(store), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; rules and performance history are kept in memory");
            (Arc::new(InMemoryRuleStore::with_presets()), None)
        }
    };

    let email: Arc<dyn EmailSender> = if config.smtp.is_configured() {
        Arc::new(SmtpEmailSender::new(&config.smtp))
    } else {
        tracing::warn!("SMTP not configured; email notifications will be reported as not accepted");
        Arc::new(DisabledSender::new("email"))
    };

    let chat: Arc<dyn ChatSender> = match config.chat.webhook_url.as_deref() {
        Some(url) => Arc::new(WebhookChatSender::new(url)),
        None => {
            tracing::warn!("CHAT_WEBHOOK_URL not set; chat notifications will be reported as not accepted");
            Arc::new(DisabledSender::new("chat"))
        }
    };

    if !config.content.is_configured() {
        tracing::warn!("CONTENT_API_KEY not set; content generation runs in degraded mode");
    }

    let collaborators = Collaborators {
        content: Arc::new(
            HttpContentGenerator::new(config.content.clone(), metrics.clone())
                .with_brand(config.workflow.brand.clone()),
        ),
        scorer: Arc::new(HeuristicLeadScorer::new()),
        email,
        chat,
        store,
    };

    let orchestrator = Arc::new(WorkflowOrchestrator::new(
        collaborators,
        &config.workflow,
        metrics.clone(),
    ));

    if let Err(e) = orchestrator.restore_performance().await {
        tracing::warn!("Could not restore rule performance: {}", e);
    }

    let app_state = Arc::new(AppState {
        orchestrator,
        metrics,
        db_pool,
    });

    let app = handlers::app(app_state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!("Server running on {}", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
