//! Static role → permission tables

use std::collections::BTreeSet;

use carelink_core::{Permission, Role};

/// Ordered set of permissions
pub type PermissionSet = BTreeSet<Permission>;

const PHYSICIAN: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewPatientRecords,
    Permission::CreatePrescription,
    Permission::ModifyTreatmentPlan,
    Permission::OrderLabTests,
    Permission::ViewLabResults,
    Permission::ViewAnalytics,
    Permission::ViewTraining,
    Permission::EmergencyOverride,
];

const NURSE: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewPatientRecords,
    Permission::AdministerMedication,
    Permission::UpdateVitals,
    Permission::ViewLabResults,
    Permission::ViewOperations,
    Permission::ViewTraining,
    Permission::EmergencyOverride,
];

const PATIENT: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewOwnRecords,
    Permission::BookAppointments,
];

const ADMINISTRATOR: &[Permission] = &[
    Permission::FullSystemAccess,
    Permission::ManageUsers,
    Permission::ViewAuditLogs,
    Permission::ViewDashboard,
];

const PHARMACIST: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::VerifyPrescription,
    Permission::DispenseMedication,
    Permission::ManageInventory,
    Permission::ViewPatientRecords,
];

const TECHNICIAN: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::RunDiagnostics,
    Permission::UploadResults,
    Permission::ViewLabResults,
    Permission::ViewOperations,
];

const RESEARCHER: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::AccessAnonymizedData,
    Permission::ExportDatasets,
    Permission::ViewAnalytics,
];

/// Fixed mapping from role to capability set
///
/// The match in [`PermissionCatalog::table`] is exhaustive, so a role added
/// to [`Role`] without a table does not compile.
pub struct PermissionCatalog;

impl PermissionCatalog {
    /// Static permission table for a role
    pub fn table(role: Role) -> &'static [Permission] {
        match role {
            Role::Physician => PHYSICIAN,
            Role::Nurse => NURSE,
            Role::Patient => PATIENT,
            Role::Administrator => ADMINISTRATOR,
            Role::Pharmacist => PHARMACIST,
            Role::Technician => TECHNICIAN,
            Role::Researcher => RESEARCHER,
        }
    }

    /// Permission set granted to a role
    pub fn permissions_for(role: Role) -> PermissionSet {
        Self::table(role).iter().copied().collect()
    }

    /// Permission set for a role token; unknown tokens get the empty set
    pub fn permissions_for_token(token: &str) -> PermissionSet {
        token
            .parse::<Role>()
            .map(Self::permissions_for)
            .unwrap_or_default()
    }

    /// Whether `role` holds `permission` directly
    pub fn grants(role: Role, permission: Permission) -> bool {
        Self::table(role).contains(&permission)
    }

    /// Whether `role` carries the administrator short-circuit
    pub fn has_full_access(role: Role) -> bool {
        Self::grants(role, Permission::FullSystemAccess)
    }
}
