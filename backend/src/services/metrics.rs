use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// In-process counters for orchestration observability
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: DashMap<&'static str, AtomicU64>,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Self::default();
        for name in metric_names::ALL {
            registry.counters.insert(name, AtomicU64::new(0));
        }
        registry
    }

    pub fn increment(&self, name: &'static str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&self, name: &'static str, value: u64) {
        self.counters
            .entry(name)
            .or_default()
            .fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().load(Ordering::Relaxed)))
            .collect();

        MetricsSnapshot {
            counters,
            captured_at: chrono::Utc::now(),
        }
    }
}

/// Helper struct for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }
}

/// Common metric names
pub mod metric_names {
    pub const WORKFLOW_EXECUTIONS_TOTAL: &str = "workflow_executions_total";
    pub const WORKFLOW_FAILURES_TOTAL: &str = "workflow_failures_total";
    pub const ACTIONS_EXECUTED_TOTAL: &str = "actions_executed_total";
    pub const ACTION_FAILURES_TOTAL: &str = "action_failures_total";
    pub const ACTION_TIMEOUTS_TOTAL: &str = "action_timeouts_total";
    pub const CONTENT_DEGRADED_TOTAL: &str = "content_degraded_total";
    pub const FALLBACK_RULE_SELECTED_TOTAL: &str = "fallback_rule_selected_total";

    pub const ALL: [&str; 7] = [
        WORKFLOW_EXECUTIONS_TOTAL,
        WORKFLOW_FAILURES_TOTAL,
        ACTIONS_EXECUTED_TOTAL,
        ACTION_FAILURES_TOTAL,
        ACTION_TIMEOUTS_TOTAL,
        CONTENT_DEGRADED_TOTAL,
        FALLBACK_RULE_SELECTED_TOTAL,
    ];
}
