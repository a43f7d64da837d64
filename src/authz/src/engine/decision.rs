//! Authorization decision types and request options

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carelink_core::Permission;

/// Why a decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Every requested check passed
    Granted,

    /// Caller holds full_system_access; remaining checks skipped
    FullSystemAccess,

    /// Caller has no role
    NoRole,

    /// Role does not grant the permission
    PermissionNotGranted,

    /// Outside the caller's shift and the permission is not an override
    OutsideShiftWindow,

    /// Target organization is out of the caller's scope
    OrganizationOutOfScope,

    /// Resource is not in the caller's assignment list
    ResourceNotAssigned,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Granted => "granted",
            DecisionReason::FullSystemAccess => "full_system_access",
            DecisionReason::NoRole => "no_role",
            DecisionReason::PermissionNotGranted => "permission_not_granted",
            DecisionReason::OutsideShiftWindow => "outside_shift_window",
            DecisionReason::OrganizationOutOfScope => "organization_out_of_scope",
            DecisionReason::ResourceNotAssigned => "resource_not_assigned",
        }
    }
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the audit side-effect of a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum AuditStatus {
    /// Decision was not security-relevant
    NotRequired,

    /// Event handed to the sink
    Recorded,

    /// Sink failed; the decision still stands
    Failed(String),
}

/// Optional refinements of a permission check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOptions {
    /// Enforce the caller's shift window
    #[serde(default)]
    pub require_shift_access: bool,

    /// Organization the action targets
    #[serde(default)]
    pub organization_id: Option<String>,

    /// Specific resource the action targets
    #[serde(default)]
    pub resource_id: Option<String>,

    /// Type of that resource, used for audit redaction
    #[serde(default)]
    pub resource_type: Option<String>,
}

impl DecisionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift_access(mut self) -> Self {
        self.require_shift_access = true;
        self
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }
}

/// Result of one authorization query. Never partially allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Unique decision ID
    pub id: String,

    /// Whether the request is allowed
    pub allowed: bool,

    /// Reason for the decision
    pub reason: DecisionReason,

    /// Permission that was checked
    pub permission: Permission,

    /// Audit side-effect status
    pub audit: AuditStatus,

    /// Decision timestamp
    pub decided_at: DateTime<Utc>,
}

impl AccessDecision {
    /// Create an allow decision
    pub fn allow(permission: Permission, reason: DecisionReason, decided_at: DateTime<Utc>) -> Self {
        Self::new(true, permission, reason, decided_at)
    }

    /// Create a deny decision
    pub fn deny(permission: Permission, reason: DecisionReason, decided_at: DateTime<Utc>) -> Self {
        Self::new(false, permission, reason, decided_at)
    }

    fn new(
        allowed: bool,
        permission: Permission,
        reason: DecisionReason,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            allowed,
            reason,
            permission,
            audit: AuditStatus::NotRequired,
            decided_at,
        }
    }

    pub fn is_denied(&self) -> bool {
        !self.allowed
    }
}
