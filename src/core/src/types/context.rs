//! Data domains of the portal dashboard

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use super::permission::Permission;

/// Key of one data domain. Used both as the cache key and as the
/// authorization qualifier for reading that domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainContext {
    Overview,
    ClaimsIntegration,
    RevenueCycle,
    Training,
    Operations,
    Analytics,
    IdentityTree,
    Compliance,
}

impl DomainContext {
    /// Every known context. SyncState exists for each of these from startup.
    pub const ALL: [DomainContext; 8] = [
        DomainContext::Overview,
        DomainContext::ClaimsIntegration,
        DomainContext::RevenueCycle,
        DomainContext::Training,
        DomainContext::Operations,
        DomainContext::Analytics,
        DomainContext::IdentityTree,
        DomainContext::Compliance,
    ];

    /// Kebab-case token, also used as the API path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainContext::Overview => "overview",
            DomainContext::ClaimsIntegration => "claims-integration",
            DomainContext::RevenueCycle => "revenue-cycle",
            DomainContext::Training => "training",
            DomainContext::Operations => "operations",
            DomainContext::Analytics => "analytics",
            DomainContext::IdentityTree => "identity-tree",
            DomainContext::Compliance => "compliance",
        }
    }

    /// Permission a caller needs to read this context's data
    pub fn required_permission(&self) -> Permission {
        match self {
            DomainContext::Overview => Permission::ViewDashboard,
            DomainContext::ClaimsIntegration => Permission::ManageClaims,
            DomainContext::RevenueCycle => Permission::ViewRevenueCycle,
            DomainContext::Training => Permission::ViewTraining,
            DomainContext::Operations => Permission::ViewOperations,
            DomainContext::Analytics => Permission::ViewAnalytics,
            DomainContext::IdentityTree => Permission::ManageUsers,
            DomainContext::Compliance => Permission::ViewAuditLogs,
        }
    }
}

impl Default for DomainContext {
    fn default() -> Self {
        DomainContext::Overview
    }
}

impl FromStr for DomainContext {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase().replace('_', "-");
        DomainContext::ALL
            .into_iter()
            .find(|context| context.as_str() == token)
            .ok_or_else(|| CoreError::UnknownContext(s.to_string()))
    }
}

impl fmt::Display for DomainContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
