//! Closed vocabulary of capabilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// One allowed capability. Granted in sets by role and organization level,
/// never revoked individually at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Clinical
    ViewDashboard,
    ViewPatientRecords,
    CreatePrescription,
    ModifyTreatmentPlan,
    OrderLabTests,
    ViewLabResults,
    AdministerMedication,
    UpdateVitals,

    // Patient self-service
    ViewOwnRecords,
    BookAppointments,

    // Administration
    FullSystemAccess,
    ManageUsers,
    ViewAuditLogs,

    // Pharmacy
    VerifyPrescription,
    DispenseMedication,
    ManageInventory,

    // Diagnostics
    RunDiagnostics,
    UploadResults,

    // Research
    AccessAnonymizedData,
    ExportDatasets,

    // Dashboard sections
    ViewAnalytics,
    ViewTraining,
    ViewOperations,
    ManageClaims,
    ViewRevenueCycle,

    // Shift overrides
    EmergencyOverride,
    CriticalOverride,

    // Organization scope
    CrossFacilityAccess,
    NetworkAnalytics,
    FacilityReports,
    DepartmentReports,
    UnitReports,
}

impl Permission {
    /// Every permission, in declaration order
    pub const ALL: [Permission; 32] = [
        Permission::ViewDashboard,
        Permission::ViewPatientRecords,
        Permission::CreatePrescription,
        Permission::ModifyTreatmentPlan,
        Permission::OrderLabTests,
        Permission::ViewLabResults,
        Permission::AdministerMedication,
        Permission::UpdateVitals,
        Permission::ViewOwnRecords,
        Permission::BookAppointments,
        Permission::FullSystemAccess,
        Permission::ManageUsers,
        Permission::ViewAuditLogs,
        Permission::VerifyPrescription,
        Permission::DispenseMedication,
        Permission::ManageInventory,
        Permission::RunDiagnostics,
        Permission::UploadResults,
        Permission::AccessAnonymizedData,
        Permission::ExportDatasets,
        Permission::ViewAnalytics,
        Permission::ViewTraining,
        Permission::ViewOperations,
        Permission::ManageClaims,
        Permission::ViewRevenueCycle,
        Permission::EmergencyOverride,
        Permission::CriticalOverride,
        Permission::CrossFacilityAccess,
        Permission::NetworkAnalytics,
        Permission::FacilityReports,
        Permission::DepartmentReports,
        Permission::UnitReports,
    ];

    /// Stable snake_case token (e.g. `create_prescription`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewDashboard => "view_dashboard",
            Permission::ViewPatientRecords => "view_patient_records",
            Permission::CreatePrescription => "create_prescription",
            Permission::ModifyTreatmentPlan => "modify_treatment_plan",
            Permission::OrderLabTests => "order_lab_tests",
            Permission::ViewLabResults => "view_lab_results",
            Permission::AdministerMedication => "administer_medication",
            Permission::UpdateVitals => "update_vitals",
            Permission::ViewOwnRecords => "view_own_records",
            Permission::BookAppointments => "book_appointments",
            Permission::FullSystemAccess => "full_system_access",
            Permission::ManageUsers => "manage_users",
            Permission::ViewAuditLogs => "view_audit_logs",
            Permission::VerifyPrescription => "verify_prescription",
            Permission::DispenseMedication => "dispense_medication",
            Permission::ManageInventory => "manage_inventory",
            Permission::RunDiagnostics => "run_diagnostics",
            Permission::UploadResults => "upload_results",
            Permission::AccessAnonymizedData => "access_anonymized_data",
            Permission::ExportDatasets => "export_datasets",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ViewTraining => "view_training",
            Permission::ViewOperations => "view_operations",
            Permission::ManageClaims => "manage_claims",
            Permission::ViewRevenueCycle => "view_revenue_cycle",
            Permission::EmergencyOverride => "emergency_override",
            Permission::CriticalOverride => "critical_override",
            Permission::CrossFacilityAccess => "cross_facility_access",
            Permission::NetworkAnalytics => "network_analytics",
            Permission::FacilityReports => "facility_reports",
            Permission::DepartmentReports => "department_reports",
            Permission::UnitReports => "unit_reports",
        }
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Permission::ALL
            .into_iter()
            .find(|permission| permission.as_str() == token)
            .ok_or_else(|| CoreError::UnknownPermission(s.to_string()))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
