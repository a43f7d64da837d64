/// Scope resolver for organization and resource checks
///
/// Same-organization access is always in scope. Cross-organization access
/// needs the caller's level to unlock the cross-facility capability. The
/// resource-assignment gate is a separate, narrower check layered on top.

use tracing::debug;

use carelink_core::{OrganizationScope, Permission};

use super::types::{is_level_gated, level_permissions};

/// Resolves organization scope and resource assignment
#[derive(Debug, Clone)]
pub struct ScopeResolver {
    /// Capability that allows acting on another organization
    cross_organization: Permission,
}

impl ScopeResolver {
    pub fn new() -> Self {
        Self {
            cross_organization: Permission::CrossFacilityAccess,
        }
    }

    /// Whether `permission` may be exercised against `target_org`
    ///
    /// A caller with no organization level is treated as `unit`; a caller
    /// with no organization id is never in scope of a named organization.
    /// Level-gated permissions (reports, network analytics) additionally
    /// require the caller's level to unlock them.
    pub fn is_in_scope(
        &self,
        caller_org: Option<&str>,
        caller_level: Option<OrganizationScope>,
        target_org: &str,
        permission: Permission,
    ) -> bool {
        let Some(caller_org) = caller_org else {
            debug!("Caller has no organization, {} is out of scope", target_org);
            return false;
        };

        let level = caller_level.unwrap_or_default();
        let unlocked = level_permissions(level);

        if is_level_gated(permission) && !unlocked.contains(&permission) {
            debug!("Level {} does not unlock {}", level, permission);
            return false;
        }

        if caller_org == target_org {
            return true;
        }

        let crosses = unlocked.contains(&self.cross_organization);
        debug!(
            "Cross-organization access {} -> {} at level {}: {}",
            caller_org, target_org, level, crosses
        );
        crosses
    }

    /// Resource-assignment gate
    ///
    /// `None` means the caller has no assignment list and the gate does not
    /// apply. A present list must contain `resource_id`.
    pub fn is_resource_assigned(&self, assigned: Option<&[String]>, resource_id: &str) -> bool {
        match assigned {
            None => true,
            Some(resources) => resources.iter().any(|r| r == resource_id),
        }
    }
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new()
    }
}
