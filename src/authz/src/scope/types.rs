/// Organization level permission tables
///
/// Each level lists the permissions it unlocks explicitly. The lists are
/// monotone: network ⊇ facility ⊇ department ⊇ unit.

use carelink_core::{OrganizationScope, Permission};

const UNIT: &[Permission] = &[Permission::UnitReports];

const DEPARTMENT: &[Permission] = &[Permission::UnitReports, Permission::DepartmentReports];

const FACILITY: &[Permission] = &[
    Permission::UnitReports,
    Permission::DepartmentReports,
    Permission::FacilityReports,
];

const NETWORK: &[Permission] = &[
    Permission::UnitReports,
    Permission::DepartmentReports,
    Permission::FacilityReports,
    Permission::NetworkAnalytics,
    Permission::CrossFacilityAccess,
];

/// Permissions that only an organization level can unlock
pub const LEVEL_GATED: &[Permission] = NETWORK;

/// Permissions unlocked by an organization level
pub fn level_permissions(level: OrganizationScope) -> &'static [Permission] {
    match level {
        OrganizationScope::Unit => UNIT,
        OrganizationScope::Department => DEPARTMENT,
        OrganizationScope::Facility => FACILITY,
        OrganizationScope::Network => NETWORK,
    }
}

/// Whether `permission` requires an organization level to unlock it
pub fn is_level_gated(permission: Permission) -> bool {
    LEVEL_GATED.contains(&permission)
}
