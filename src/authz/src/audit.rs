//! Audit trail for security-relevant decisions
//!
//! Every login, logout, denial and resource access produces one immutable
//! [`AuditEvent`]. Events are handed to an [`AuditSink`]; the client never
//! mutates or deletes them. Sink failures are absorbed by the engine and
//! never change the decision that triggered them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use carelink_core::Permission;

use crate::engine::DecisionReason;
use crate::error::Result;

/// Kind of security-relevant action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    Logout,
    AccessDenied,
    ResourceAccess,
}

/// Outcome recorded with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcomeKind {
    Success,
    Allowed,
    Denied,
}

/// Immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: String,

    /// User who triggered the event
    pub actor: String,

    /// What happened
    pub action: AuditAction,

    /// Permission that was checked, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,

    /// Type of the resource touched (e.g. "patient_record")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Resource identifier, redacted for sensitive types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// When the decision was made
    pub timestamp: DateTime<Utc>,

    /// Result of the action
    pub outcome: AuditOutcomeKind,

    /// Decision reason for authorization events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DecisionReason>,
}

impl AuditEvent {
    /// Session event (login/logout)
    pub fn session(actor: impl Into<String>, action: AuditAction, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            actor: actor.into(),
            action,
            permission: None,
            resource_type: None,
            resource_id: None,
            timestamp,
            outcome: AuditOutcomeKind::Success,
            reason: None,
        }
    }

    /// Authorization event
    pub fn decision(
        actor: impl Into<String>,
        permission: Permission,
        allowed: bool,
        reason: DecisionReason,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let (action, outcome) = if allowed {
            (AuditAction::ResourceAccess, AuditOutcomeKind::Allowed)
        } else {
            (AuditAction::AccessDenied, AuditOutcomeKind::Denied)
        };

        Self {
            id: Uuid::new_v4().to_string(),
            actor: actor.into(),
            action,
            permission: Some(permission),
            resource_type: None,
            resource_id: None,
            timestamp,
            outcome,
            reason: Some(reason),
        }
    }

    pub fn with_resource(mut self, resource_type: Option<String>, resource_id: String) -> Self {
        self.resource_type = resource_type;
        self.resource_id = Some(resource_id);
        self
    }
}

/// Redacts identifiers of sensitive resource types
///
/// Redacted ids become `redacted:<16 hex chars of blake3(id)>` so the same
/// resource still correlates across events without exposing the id.
#[derive(Debug, Clone)]
pub struct Redactor {
    sensitive_types: HashSet<String>,
}

impl Redactor {
    pub fn new<I, S>(sensitive_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sensitive_types: sensitive_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Resource type given explicitly, or the `type:` prefix of the id
    pub fn resource_type_of<'a>(resource_type: Option<&'a str>, resource_id: &'a str) -> Option<&'a str> {
        resource_type.or_else(|| resource_id.split_once(':').map(|(prefix, _)| prefix))
    }

    pub fn is_sensitive(&self, resource_type: Option<&str>) -> bool {
        resource_type.map_or(false, |t| self.sensitive_types.contains(t))
    }

    /// Redact `resource_id` if its type is sensitive
    pub fn redact(&self, resource_type: Option<&str>, resource_id: &str) -> String {
        let resource_type = Self::resource_type_of(resource_type, resource_id);
        if self.is_sensitive(resource_type) {
            let digest = blake3::hash(resource_id.as_bytes()).to_hex();
            format!("redacted:{}", &digest.as_str()[..16])
        } else {
            resource_id.to_string()
        }
    }
}

/// Destination of audit events
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one event
    async fn record(&self, event: AuditEvent) -> Result<()>;
}

/// Audit statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditStats {
    pub total_events: usize,
    pub allowed: usize,
    pub denied: usize,
    pub logins: usize,
    pub logouts: usize,
}

/// In-memory audit sink with a bounded buffer
pub struct MemoryAuditSink {
    buffer: Arc<RwLock<Vec<AuditEvent>>>,
    capacity: usize,
}

impl MemoryAuditSink {
    /// Sink keeping the last 10,000 events
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(RwLock::new(Vec::new())),
            capacity: capacity.max(1),
        }
    }

    /// All buffered events, oldest first
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.buffer.read().await.clone()
    }

    /// Most recent events for an actor, newest first
    pub async fn query_by_actor(&self, actor: &str, limit: usize) -> Vec<AuditEvent> {
        let buffer = self.buffer.read().await;

        buffer
            .iter()
            .rev()
            .filter(|e| e.actor == actor)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get_stats(&self) -> AuditStats {
        let buffer = self.buffer.read().await;

        AuditStats {
            total_events: buffer.len(),
            allowed: buffer.iter().filter(|e| e.outcome == AuditOutcomeKind::Allowed).count(),
            denied: buffer.iter().filter(|e| e.outcome == AuditOutcomeKind::Denied).count(),
            logins: buffer.iter().filter(|e| e.action == AuditAction::Login).count(),
            logouts: buffer.iter().filter(|e| e.action == AuditAction::Logout).count(),
        }
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        let mut buffer = self.buffer.write().await;
        buffer.push(event);

        // Drop the oldest tenth once full
        if buffer.len() > self.capacity {
            let excess = buffer.len() - self.capacity;
            let drain = excess.max(self.capacity / 10);
            let len = buffer.len();
            buffer.drain(0..drain.min(len));
        }

        Ok(())
    }
}

/// Sink that writes each event to the `carelink::audit` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        info!(
            target: "carelink::audit",
            id = %event.id,
            actor = %event.actor,
            action = ?event.action,
            outcome = ?event.outcome,
            permission = ?event.permission,
            resource_type = ?event.resource_type,
            resource_id = ?event.resource_id,
            reason = ?event.reason,
            timestamp = %event.timestamp,
            "audit event"
        );
        Ok(())
    }
}
