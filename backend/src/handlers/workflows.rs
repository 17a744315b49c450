//! Workflow Orchestration Handlers
//!
//! Inbound surface for lead events, engagement and proposal planning,
//! channel coordination and rule performance.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use leadflow_shared::Lead;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::workflows::{
    Channel, ChannelPlan, EngagementPlan, LeadEvent, OptimizationReport, ProposalPlan,
    RulePerformance, WorkflowOutcome,
};
use crate::{ApiResult, AppError, AppState};

// ==================== Structs ====================

#[derive(Debug, Deserialize)]
pub struct CoordinateChannelsRequest {
    pub lead: Lead,
    pub channels: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePerformanceResponse {
    pub rules: Vec<RulePerformance>,
}

// ==================== Routes ====================

pub fn workflow_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_operations))
        .route("/execute", post(execute_workflow))
        .route("/engagement", post(plan_engagement))
        .route("/proposal", post(orchestrate_proposal))
        .route("/channels", post(coordinate_channels))
        .route("/rules/performance", get(rule_performance))
        .route("/rules/:id/optimization", get(optimize_rule))
}

// ==================== Handlers ====================

async fn list_operations() -> Json<serde_json::Value> {
    Json(json!({
        "service": "leadflow",
        "operations": [
            { "method": "POST", "path": "/api/v1/workflows/execute", "description": "Run the best matching rule for a lead event" },
            { "method": "POST", "path": "/api/v1/workflows/engagement", "description": "Plan follow-up engagement for a lead" },
            { "method": "POST", "path": "/api/v1/workflows/proposal", "description": "Draft a proposal with follow-ups and risk assessment" },
            { "method": "POST", "path": "/api/v1/workflows/channels", "description": "Coordinate outreach across channels" },
            { "method": "GET", "path": "/api/v1/workflows/rules/performance", "description": "Per-rule metrics and performance scores" },
            { "method": "GET", "path": "/api/v1/workflows/rules/{id}/optimization", "description": "Tuning suggestions for one rule" }
        ]
    }))
}

async fn execute_workflow(
    State(state): State<Arc<AppState>>,
    Json(event): Json<LeadEvent>,
) -> ApiResult<Json<WorkflowOutcome>> {
    tracing::info!(
        "Lead event {} ({}) for lead {}",
        event.event_id,
        event.event_type.as_str(),
        event.lead.id
    );
    let outcome = state
        .orchestrator
        .execute_intelligent_workflow(event.into_context())
        .await?;
    Ok(Json(outcome))
}

async fn plan_engagement(
    State(state): State<Arc<AppState>>,
    Json(lead): Json<Lead>,
) -> ApiResult<Json<EngagementPlan>> {
    Ok(Json(state.orchestrator.plan_engagement(&lead).await?))
}

async fn orchestrate_proposal(
    State(state): State<Arc<AppState>>,
    Json(lead): Json<Lead>,
) -> ApiResult<Json<ProposalPlan>> {
    Ok(Json(state.orchestrator.orchestrate_proposal(&lead).await?))
}

async fn coordinate_channels(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CoordinateChannelsRequest>,
) -> ApiResult<Json<ChannelPlan>> {
    let channels = request
        .channels
        .iter()
        .map(|name| name.parse::<Channel>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(
        state
            .orchestrator
            .coordinate_channels(&request.lead, &channels)
            .await?,
    ))
}

async fn rule_performance(State(state): State<Arc<AppState>>) -> Json<RulePerformanceResponse> {
    Json(RulePerformanceResponse {
        rules: state.orchestrator.rule_performance(),
    })
}

async fn optimize_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<OptimizationReport>> {
    Ok(Json(state.orchestrator.optimize_workflow_performance(&id).await?))
}
