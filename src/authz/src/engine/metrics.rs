//! Decision metrics for engine observability

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::decision::{AccessDecision, DecisionReason};

/// Engine decision counters
#[derive(Debug, Clone, Default)]
pub struct DecisionMetrics {
    /// Total number of decisions
    pub total_decisions: u64,

    /// Number of allowed decisions
    pub allowed_decisions: u64,

    /// Number of denied decisions
    pub denied_decisions: u64,

    /// Decisions per reason
    pub by_reason: HashMap<DecisionReason, u64>,

    /// Audit events the sink failed to record
    pub audit_failures: u64,
}

impl DecisionMetrics {
    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        if self.total_decisions == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / self.total_decisions as f64
        }
    }

    /// Count for a single reason
    pub fn count(&self, reason: DecisionReason) -> u64 {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }
}

/// Collects decision metrics
pub struct MetricsCollector {
    metrics: Arc<RwLock<DecisionMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(DecisionMetrics::default())),
        }
    }

    pub async fn record_decision(&self, decision: &AccessDecision) {
        let mut metrics = self.metrics.write().await;
        metrics.total_decisions += 1;
        if decision.allowed {
            metrics.allowed_decisions += 1;
        } else {
            metrics.denied_decisions += 1;
        }
        *metrics.by_reason.entry(decision.reason).or_insert(0) += 1;
    }

    pub async fn record_audit_failure(&self) {
        self.metrics.write().await.audit_failures += 1;
    }

    pub async fn get_metrics(&self) -> DecisionMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn reset(&self) {
        *self.metrics.write().await = DecisionMetrics::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
