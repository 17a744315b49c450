use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::metrics::MetricsSnapshot;
use crate::services::Timer;
use crate::AppState;

pub mod workflows;

pub use workflows::workflow_routes;

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: String,
    pub response_time_ms: Option<i64>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub service: String,
    pub rule_store: ServiceStatus,
    pub timestamp: DateTime<Utc>,
}

/// Full router with CORS and request tracing
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Leadflow Workflow API v1.0.0" }))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .nest("/api/v1/workflows", workflow_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthCheckResponse>) {
    let timer = Timer::start();

    let rule_store = match &state.db_pool {
        Some(pool) => {
            if crate::database::health_check(pool).await {
                ServiceStatus {
                    status: "healthy".to_string(),
                    response_time_ms: Some(timer.elapsed_ms()),
                    details: Some(serde_json::json!({ "backend": "postgres" })),
                }
            } else {
                ServiceStatus {
                    status: "unhealthy".to_string(),
                    response_time_ms: Some(timer.elapsed_ms()),
                    details: Some(serde_json::json!({ "backend": "postgres" })),
                }
            }
        }
        None => ServiceStatus {
            status: "healthy".to_string(),
            response_time_ms: None,
            details: Some(serde_json::json!({ "backend": "memory" })),
        },
    };

    let healthy = rule_store.status == "healthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            service: "leadflow-api".to_string(),
            rule_store,
            timestamp: Utc::now(),
        }),
    )
}

pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
