//! Authorization decision engine
//!
//! Composes the permission catalog, shift windows and scope resolution into
//! one decision function, and emits audit events for decisions of
//! consequence.

pub mod decision;
pub mod metrics;

pub use decision::{AccessDecision, AuditStatus, DecisionOptions, DecisionReason};
pub use metrics::{DecisionMetrics, MetricsCollector};

use crate::audit::{AuditAction, AuditEvent, AuditSink, Redactor};
use crate::catalog::PermissionCatalog;
use crate::scope::ScopeResolver;
use crate::shift::{AccessWindowEvaluator, ShiftCatalog};

use carelink_core::{Clock, Permission, UserProfile};

use std::sync::Arc;
use tracing::{debug, info, warn};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Emit audit events
    pub enable_audit: bool,

    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Resource types whose ids are redacted in audit events
    pub sensitive_resource_types: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_audit: true,
            enable_metrics: true,
            sensitive_resource_types: vec![
                "patient_record".to_string(),
                "prescription".to_string(),
                "lab_result".to_string(),
                "medical_record".to_string(),
            ],
        }
    }
}

/// Authorization engine
///
/// # Pipeline
///
/// ```text
/// role? → catalog → [full access] → shift window → organization → resource → allow
///   ↓        ↓                          ↓              ↓             ↓
/// no_role  permission_not_granted  outside_shift  out_of_scope  not_assigned
/// ```
///
/// The engine holds no mutable state besides metrics; the audit stream is
/// owned by the [`AuditSink`].
pub struct AuthorizationEngine {
    /// Named shift windows
    shifts: ShiftCatalog,

    /// Organization and resource scope checks
    scope_resolver: ScopeResolver,

    /// Audit destination
    audit_sink: Arc<dyn AuditSink>,

    /// Time source for shift evaluation and audit timestamps
    clock: Arc<dyn Clock>,

    /// Resource id redaction for audit events
    redactor: Redactor,

    /// Decision metrics
    metrics: Option<Arc<MetricsCollector>>,

    /// Engine configuration
    config: EngineConfig,
}

impl AuthorizationEngine {
    /// Create an engine with the standard shift catalog
    pub fn new(config: EngineConfig, audit_sink: Arc<dyn AuditSink>, clock: Arc<dyn Clock>) -> Self {
        let metrics = if config.enable_metrics {
            Some(Arc::new(MetricsCollector::new()))
        } else {
            None
        };

        info!(
            "AuthorizationEngine initialized with audit={}, metrics={}",
            config.enable_audit, config.enable_metrics
        );

        Self {
            shifts: ShiftCatalog::standard(),
            scope_resolver: ScopeResolver::new(),
            audit_sink,
            clock,
            redactor: Redactor::new(config.sensitive_resource_types.iter().cloned()),
            metrics,
            config,
        }
    }

    /// Replace the shift catalog
    pub fn with_shift_catalog(mut self, shifts: ShiftCatalog) -> Self {
        self.shifts = shifts;
        self
    }

    pub fn shifts(&self) -> &ShiftCatalog {
        &self.shifts
    }

    /// Decide a permission check and emit its audit event when required
    ///
    /// A deny is a normal return value. If the audit sink fails, the
    /// decision is returned unchanged with `audit = Failed`.
    pub async fn decide(
        &self,
        user: &UserProfile,
        permission: Permission,
        options: &DecisionOptions,
    ) -> AccessDecision {
        let mut decision = self.evaluate(user, permission, options);

        if decision.allowed {
            debug!("ALLOW {} for {} ({})", permission, user.id, decision.reason.as_str());
        } else {
            info!("DENY {} for {} ({})", permission, user.id, decision.reason.as_str());
        }

        if self.audit_required(&decision, options) {
            let mut event = AuditEvent::decision(
                user.id.clone(),
                permission,
                decision.allowed,
                decision.reason,
                decision.decided_at,
            );
            if let Some(resource_id) = &options.resource_id {
                let resource_type = options.resource_type.as_deref();
                event = event.with_resource(
                    Redactor::resource_type_of(resource_type, resource_id).map(str::to_string),
                    self.redactor.redact(resource_type, resource_id),
                );
            }
            decision.audit = self.emit(event).await;
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(&decision).await;
        }

        decision
    }

    /// Evaluate a permission check without side effects
    ///
    /// Checks run in a fixed order and stop at the first failure.
    pub fn evaluate(
        &self,
        user: &UserProfile,
        permission: Permission,
        options: &DecisionOptions,
    ) -> AccessDecision {
        let decided_at = self.clock.now_utc();

        // Step 1: Role
        let Some(role) = user.role else {
            return AccessDecision::deny(permission, DecisionReason::NoRole, decided_at);
        };

        // Step 2: Role permissions, with the administrator short-circuit
        if PermissionCatalog::has_full_access(role) {
            return AccessDecision::allow(permission, DecisionReason::FullSystemAccess, decided_at);
        }
        if !PermissionCatalog::grants(role, permission) {
            return AccessDecision::deny(permission, DecisionReason::PermissionNotGranted, decided_at);
        }

        // Step 3: Shift window
        if options.require_shift_access {
            let window = user.shift.as_deref().and_then(|name| self.shifts.get(name));
            let within = match window {
                Some(window) => {
                    AccessWindowEvaluator::is_within_window(window, permission, &self.clock.now())
                }
                None => {
                    debug!("{} has no known shift assignment ({:?})", user.id, user.shift);
                    false
                }
            };
            if !within {
                return AccessDecision::deny(permission, DecisionReason::OutsideShiftWindow, decided_at);
            }
        }

        // Step 4: Organization scope
        if let Some(target_org) = &options.organization_id {
            let in_scope = self.scope_resolver.is_in_scope(
                user.organization_id.as_deref(),
                user.organization_level,
                target_org,
                permission,
            );
            if !in_scope {
                return AccessDecision::deny(
                    permission,
                    DecisionReason::OrganizationOutOfScope,
                    decided_at,
                );
            }
        }

        // Step 5: Resource assignment
        if let Some(resource_id) = &options.resource_id {
            let assigned = self
                .scope_resolver
                .is_resource_assigned(user.assigned_resources.as_deref(), resource_id);
            if !assigned {
                return AccessDecision::deny(permission, DecisionReason::ResourceNotAssigned, decided_at);
            }
        }

        AccessDecision::allow(permission, DecisionReason::Granted, decided_at)
    }

    /// Emit a login event for `user`
    pub async fn record_login(&self, user: &UserProfile) -> AuditStatus {
        info!("Login: {}", user.id);
        self.emit_session(user, AuditAction::Login).await
    }

    /// Emit a logout event for `user`
    pub async fn record_logout(&self, user: &UserProfile) -> AuditStatus {
        info!("Logout: {}", user.id);
        self.emit_session(user, AuditAction::Logout).await
    }

    /// Get engine metrics
    pub async fn get_metrics(&self) -> Option<DecisionMetrics> {
        if let Some(metrics) = &self.metrics {
            Some(metrics.get_metrics().await)
        } else {
            None
        }
    }

    // Private helper methods

    fn audit_required(&self, decision: &AccessDecision, options: &DecisionOptions) -> bool {
        self.config.enable_audit && (decision.is_denied() || options.resource_id.is_some())
    }

    async fn emit_session(&self, user: &UserProfile, action: AuditAction) -> AuditStatus {
        if !self.config.enable_audit {
            return AuditStatus::NotRequired;
        }
        let event = AuditEvent::session(user.id.clone(), action, self.clock.now_utc());
        self.emit(event).await
    }

    /// Hand an event to the sink; failures are logged and reported, never raised
    async fn emit(&self, event: AuditEvent) -> AuditStatus {
        let event_id = event.id.clone();
        match self.audit_sink.record(event).await {
            Ok(()) => AuditStatus::Recorded,
            Err(e) => {
                warn!("Audit event {} not recorded: {}", event_id, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_audit_failure().await;
                }
                AuditStatus::Failed(e.to_string())
            }
        }
    }
}
