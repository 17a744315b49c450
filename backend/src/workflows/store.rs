// Rule Store - Where rule definitions and their performance live

use async_trait::async_trait;
use dashmap::DashMap;
use leadflow_shared::WorkflowMetrics;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use super::rules::{self, AdaptationSettings, Rule};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Rule store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted performance for one rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredPerformance {
    pub rule_id: String,
    pub metrics: WorkflowMetrics,
    pub performance_score: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active, structurally valid rules
    async fn load_active_rules(&self) -> StoreResult<Vec<Rule>>;

    async fn save_rule_performance(
        &self,
        rule_id: &str,
        metrics: &WorkflowMetrics,
        performance_score: f64,
    ) -> StoreResult<()>;

    async fn load_rule_performance(&self) -> StoreResult<Vec<StoredPerformance>>;
}

fn keep_valid(rule: &Rule) -> bool {
    match rule.validate() {
        Ok(()) => true,
        Err(e) => {
            warn!("Skipping invalid rule {}: {}", rule.id, e);
            false
        }
    }
}

/// Process-memory store; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: DashMap<String, Rule>,
    performance: DashMap<String, StoredPerformance>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded with the built-in rules
    pub fn with_presets() -> Self {
        let store = Self::new();
        for rule in rules::presets::all() {
            store.upsert_rule(rule);
        }
        store
    }

    pub fn upsert_rule(&self, rule: Rule) {
        self.rules.insert(rule.id.clone(), rule);
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn load_active_rules(&self) -> StoreResult<Vec<Rule>> {
        let mut active: Vec<Rule> = self
            .rules
            .iter()
            .filter(|entry| entry.is_active && keep_valid(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(active)
    }

    async fn save_rule_performance(
        &self,
        rule_id: &str,
        metrics: &WorkflowMetrics,
        performance_score: f64,
    ) -> StoreResult<()> {
        self.performance.insert(
            rule_id.to_string(),
            StoredPerformance {
                rule_id: rule_id.to_string(),
                metrics: metrics.clone(),
                performance_score,
            },
        );
        Ok(())
    }

    async fn load_rule_performance(&self) -> StoreResult<Vec<StoredPerformance>> {
        let mut out: Vec<StoredPerformance> =
            self.performance.iter().map(|e| e.value().clone()).collect();
        out.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));
        Ok(out)
    }
}

/// Postgres-backed store over `workflow_rules` and `rule_performance`
#[derive(Clone)]
pub struct PgRuleStore {
    pool: PgPool,
}

impl PgRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the built-in rules unless rows with their ids already exist
    pub async fn seed_presets(&self) -> StoreResult<()> {
        for rule in rules::presets::all() {
            sqlx::query(
                r#"
                INSERT INTO workflow_rules
                (id, name, conditions, actions, priority, is_active, adaptation_settings)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&rule.id)
            .bind(&rule.name)
            .bind(serde_json::to_value(&rule.conditions)?)
            .bind(serde_json::to_value(&rule.actions)?)
            .bind(rule.priority)
            .bind(rule.is_active)
            .bind(serde_json::to_value(rule.adaptation_settings)?)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for PgRuleStore {
    async fn load_active_rules(&self) -> StoreResult<Vec<Rule>> {
        let rows = sqlx::query_as::<_, (
            String, String, serde_json::Value, serde_json::Value, i32, bool, serde_json::Value,
        )>(
            r#"
            SELECT id, name, conditions, actions, priority, is_active, adaptation_settings
            FROM workflow_rules
            WHERE is_active = true
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let rules: Vec<Rule> = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.0;
                let parsed = (|| -> Result<Rule, serde_json::Error> {
                    Ok(Rule {
                        id: id.clone(),
                        name: row.1,
                        conditions: serde_json::from_value(row.2)?,
                        actions: serde_json::from_value(row.3)?,
                        priority: row.4,
                        is_active: row.5,
                        adaptation_settings: serde_json::from_value::<AdaptationSettings>(row.6)?,
                    })
                })();

                match parsed {
                    Ok(rule) => Some(rule),
                    Err(e) => {
                        warn!("Skipping rule {} with malformed definition: {}", id, e);
                        None
                    }
                }
            })
            .filter(keep_valid)
            .collect();

        info!("Loaded {} active rules", rules.len());
        Ok(rules)
    }

    async fn save_rule_performance(
        &self,
        rule_id: &str,
        metrics: &WorkflowMetrics,
        performance_score: f64,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rule_performance
            (rule_id, total_executions, success_rate, average_conversion_time,
             average_engagement_score, cost_per_conversion, customer_satisfaction_score,
             performance_score, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (rule_id) DO UPDATE SET
                total_executions = EXCLUDED.total_executions,
                success_rate = EXCLUDED.success_rate,
                average_conversion_time = EXCLUDED.average_conversion_time,
                average_engagement_score = EXCLUDED.average_engagement_score,
                cost_per_conversion = EXCLUDED.cost_per_conversion,
                customer_satisfaction_score = EXCLUDED.customer_satisfaction_score,
                performance_score = EXCLUDED.performance_score,
                updated_at = NOW()
            "#,
        )
        .bind(rule_id)
        .bind(metrics.total_executions)
        .bind(metrics.success_rate)
        .bind(metrics.average_conversion_time)
        .bind(metrics.average_engagement_score)
        .bind(metrics.cost_per_conversion)
        .bind(metrics.customer_satisfaction_score)
        .bind(performance_score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_rule_performance(&self) -> StoreResult<Vec<StoredPerformance>> {
        let rows = sqlx::query_as::<_, (String, i64, f64, f64, f64, f64, f64, f64)>(
            r#"
            SELECT rule_id, total_executions, success_rate, average_conversion_time,
                   average_engagement_score, cost_per_conversion, customer_satisfaction_score,
                   performance_score
            FROM rule_performance
            ORDER BY rule_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StoredPerformance {
                rule_id: row.0,
                metrics: WorkflowMetrics {
                    total_executions: row.1,
                    success_rate: row.2,
                    average_conversion_time: row.3,
                    average_engagement_score: row.4,
                    cost_per_conversion: row.5,
                    customer_satisfaction_score: row.6,
                },
                performance_score: row.7,
            })
            .collect())
    }
}
