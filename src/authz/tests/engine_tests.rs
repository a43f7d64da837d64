//! Authorization decision engine tests
//!
//! Tests for the complete decision pipeline:
//! Role → Catalog → Shift window → Organization scope → Resource gate

use async_trait::async_trait;
use carelink_authz::{
    audit::{AuditAction, AuditEvent, AuditSink, MemoryAuditSink},
    engine::{AuditStatus, AuthorizationEngine, DecisionOptions, DecisionReason, EngineConfig},
    error::{AuthzError, Result},
    shift::{ShiftCatalog, ShiftWindow},
};
use carelink_core::{ManualClock, OrganizationScope, Permission, Role, UserProfile};
use proptest::prelude::*;
use std::sync::Arc;

fn engine_at(hour: u32) -> (AuthorizationEngine, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::new());
    let engine = AuthorizationEngine::new(
        EngineConfig::default(),
        sink.clone(),
        Arc::new(ManualClock::at_hour(hour)),
    );
    (engine, sink)
}

fn night_nurse() -> UserProfile {
    UserProfile::new("user:amal", Role::Nurse)
        .with_organization("facility:north", OrganizationScope::Facility)
        .with_shift("night_shift")
}

/// Sink that is always down
struct UnavailableSink;

#[async_trait]
impl AuditSink for UnavailableSink {
    async fn record(&self, _event: AuditEvent) -> Result<()> {
        Err(AuthzError::AuditUnavailable("connection refused".to_string()))
    }
}

// ============================================================================
// BASIC DECISION FLOW TESTS
// ============================================================================

#[tokio::test]
async fn test_no_role_is_denied() {
    let (engine, sink) = engine_at(10);
    let user = UserProfile::without_role("user:ghost");

    let decision = engine
        .decide(&user, Permission::ViewDashboard, &DecisionOptions::default())
        .await;

    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::NoRole);
    assert_eq!(decision.audit, AuditStatus::Recorded);

    let events = sink.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::AccessDenied);
}

#[tokio::test]
async fn test_permission_not_granted() {
    let (engine, _) = engine_at(10);
    let user = UserProfile::new("user:p", Role::Patient);

    let decision = engine
        .decide(&user, Permission::CreatePrescription, &DecisionOptions::default())
        .await;

    assert_eq!(decision.reason, DecisionReason::PermissionNotGranted);
}

#[tokio::test]
async fn test_administrator_short_circuits() {
    let (engine, _) = engine_at(3);
    // No organization, no shift, no assignments: every later check would fail.
    let admin = UserProfile::new("user:root", Role::Administrator).with_assigned_resources(Vec::<String>::new());

    let options = DecisionOptions::new()
        .with_shift_access()
        .with_organization("facility:south")
        .with_resource("patient_record:17");

    let decision = engine.decide(&admin, Permission::ExportDatasets, &options).await;

    assert!(decision.allowed);
    assert_eq!(decision.reason, DecisionReason::FullSystemAccess);
}

// ============================================================================
// SHIFT WINDOW TESTS
// ============================================================================

#[tokio::test]
async fn test_night_nurse_outside_shift_without_override_is_denied() {
    // Night shift 18–06 wraps midnight, so hour 3 is inside the window;
    // use a day-time hour to be outside it.
    let (engine, _) = engine_at(12);

    let decision = engine
        .decide(
            &night_nurse(),
            Permission::AdministerMedication,
            &DecisionOptions::new().with_shift_access(),
        )
        .await;

    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::OutsideShiftWindow);
}

#[tokio::test]
async fn test_nurse_scenario_with_restricted_shift() {
    // Nurse on an 18–06 shift whose window at hour 3 is closed: a custom
    // catalog where the night shift ends at 2.
    let mut shifts = ShiftCatalog::new();
    shifts.insert(ShiftWindow::new("night_shift", 18, 2, [Permission::EmergencyOverride]).unwrap());

    let sink = Arc::new(MemoryAuditSink::new());
    let engine = AuthorizationEngine::new(
        EngineConfig::default(),
        sink.clone(),
        Arc::new(ManualClock::at_hour(3)),
    )
    .with_shift_catalog(shifts);

    let options = DecisionOptions::new().with_shift_access();

    let denied = engine.decide(&night_nurse(), Permission::AdministerMedication, &options).await;
    assert_eq!(denied.reason, DecisionReason::OutsideShiftWindow);

    let override_allowed = engine.decide(&night_nurse(), Permission::EmergencyOverride, &options).await;
    assert!(override_allowed.allowed);
}

#[tokio::test]
async fn test_night_nurse_inside_wrapped_window() {
    let (engine, _) = engine_at(3);

    let decision = engine
        .decide(
            &night_nurse(),
            Permission::AdministerMedication,
            &DecisionOptions::new().with_shift_access(),
        )
        .await;

    assert!(decision.allowed);
    assert_eq!(decision.reason, DecisionReason::Granted);
}

#[tokio::test]
async fn test_missing_or_unknown_shift_fails_closed() {
    let (engine, _) = engine_at(10);
    let options = DecisionOptions::new().with_shift_access();

    let unassigned = UserProfile::new("user:n1", Role::Nurse);
    let decision = engine.decide(&unassigned, Permission::UpdateVitals, &options).await;
    assert_eq!(decision.reason, DecisionReason::OutsideShiftWindow);

    let unknown = UserProfile::new("user:n2", Role::Nurse).with_shift("weekend_shift");
    let decision = engine.decide(&unknown, Permission::UpdateVitals, &options).await;
    assert_eq!(decision.reason, DecisionReason::OutsideShiftWindow);
}

#[tokio::test]
async fn test_shift_ignored_unless_requested() {
    let (engine, _) = engine_at(12);

    let decision = engine
        .decide(&night_nurse(), Permission::AdministerMedication, &DecisionOptions::default())
        .await;

    assert!(decision.allowed);
}

// ============================================================================
// ORGANIZATION & RESOURCE TESTS
// ============================================================================

#[tokio::test]
async fn test_cross_facility_denied_for_facility_level() {
    let (engine, _) = engine_at(3);
    let options = DecisionOptions::new().with_organization("facility:south");

    let decision = engine.decide(&night_nurse(), Permission::ViewPatientRecords, &options).await;

    assert_eq!(decision.reason, DecisionReason::OrganizationOutOfScope);
}

#[tokio::test]
async fn test_same_facility_allowed() {
    let (engine, _) = engine_at(3);
    let options = DecisionOptions::new().with_organization("facility:north");

    let decision = engine.decide(&night_nurse(), Permission::ViewPatientRecords, &options).await;

    assert!(decision.allowed);
}

#[tokio::test]
async fn test_network_physician_crosses_facilities() {
    let (engine, _) = engine_at(3);
    let physician = UserProfile::new("user:dr.haddad", Role::Physician)
        .with_organization("network:gulf", OrganizationScope::Network);

    let decision = engine
        .decide(
            &physician,
            Permission::ViewPatientRecords,
            &DecisionOptions::new().with_organization("facility:south"),
        )
        .await;

    assert!(decision.allowed);
}

#[tokio::test]
async fn test_resource_gate_layers_on_organization() {
    let (engine, sink) = engine_at(3);
    let nurse = night_nurse().with_assigned_resources(["patient_record:17"]);

    let assigned = DecisionOptions::new()
        .with_organization("facility:north")
        .with_resource("patient_record:17");
    let decision = engine.decide(&nurse, Permission::ViewPatientRecords, &assigned).await;
    assert!(decision.allowed);
    assert_eq!(decision.audit, AuditStatus::Recorded);

    let unassigned = DecisionOptions::new()
        .with_organization("facility:north")
        .with_resource("patient_record:99");
    let decision = engine.decide(&nurse, Permission::ViewPatientRecords, &unassigned).await;
    assert_eq!(decision.reason, DecisionReason::ResourceNotAssigned);

    // Organization check still applies to assigned resources
    let other_org = DecisionOptions::new()
        .with_organization("facility:south")
        .with_resource("patient_record:17");
    let decision = engine.decide(&nurse, Permission::ViewPatientRecords, &other_org).await;
    assert_eq!(decision.reason, DecisionReason::OrganizationOutOfScope);

    // Resource ids of sensitive types are redacted
    let events = sink.events().await;
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].action, AuditAction::ResourceAccess);
    assert_eq!(events[0].resource_type.as_deref(), Some("patient_record"));
    assert!(events[0].resource_id.as_deref().unwrap().starts_with("redacted:"));
}

#[tokio::test]
async fn test_no_assignment_list_skips_resource_gate() {
    let (engine, _) = engine_at(3);

    let decision = engine
        .decide(
            &night_nurse(),
            Permission::ViewPatientRecords,
            &DecisionOptions::new().with_resource("schedule:ward-4"),
        )
        .await;

    assert!(decision.allowed);
}

// ============================================================================
// AUDIT FAILURE TESTS
// ============================================================================

#[tokio::test]
async fn test_audit_failure_never_changes_decision() {
    let engine = AuthorizationEngine::new(
        EngineConfig::default(),
        Arc::new(UnavailableSink),
        Arc::new(ManualClock::at_hour(3)),
    );

    let denied = engine
        .decide(
            &UserProfile::new("user:p", Role::Patient),
            Permission::ManageUsers,
            &DecisionOptions::default(),
        )
        .await;
    assert!(!denied.allowed);
    assert_eq!(denied.reason, DecisionReason::PermissionNotGranted);
    assert!(matches!(denied.audit, AuditStatus::Failed(_)));

    let allowed = engine
        .decide(
            &night_nurse(),
            Permission::ViewPatientRecords,
            &DecisionOptions::new().with_resource("patient_record:1"),
        )
        .await;
    assert!(allowed.allowed);
    assert!(matches!(allowed.audit, AuditStatus::Failed(_)));

    let login = engine.record_login(&night_nurse()).await;
    assert!(matches!(login, AuditStatus::Failed(_)));

    let metrics = engine.get_metrics().await.unwrap();
    assert_eq!(metrics.audit_failures, 3);
}

#[tokio::test]
async fn test_metrics_by_reason() {
    let (engine, _) = engine_at(12);
    let options = DecisionOptions::new().with_shift_access();

    engine.decide(&night_nurse(), Permission::AdministerMedication, &options).await;
    engine.decide(&night_nurse(), Permission::CreatePrescription, &options).await;
    engine.decide(&night_nurse(), Permission::ViewDashboard, &DecisionOptions::default()).await;

    let metrics = engine.get_metrics().await.unwrap();
    assert_eq!(metrics.total_decisions, 3);
    assert_eq!(metrics.allowed_decisions, 1);
    assert_eq!(metrics.count(DecisionReason::OutsideShiftWindow), 1);
    assert_eq!(metrics.count(DecisionReason::PermissionNotGranted), 1);
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

fn any_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn any_permission() -> impl Strategy<Value = Permission> {
    prop::sample::select(Permission::ALL.to_vec())
}

fn any_shift() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec![
        "day_shift".to_string(),
        "evening_shift".to_string(),
        "night_shift".to_string(),
        "on_call".to_string(),
    ]))
}

proptest! {
    #[test]
    fn prop_matching_resource_never_turns_allow_into_deny(
        role in any_role(),
        permission in any_permission(),
        hour in 0u32..24,
        shift in any_shift(),
        require_shift in any::<bool>(),
    ) {
        let (engine, _) = engine_at(hour);
        let mut user = UserProfile::new("user:prop", role)
            .with_assigned_resources(["resource:1"]);
        user.shift = shift;

        let mut options = DecisionOptions::new();
        options.require_shift_access = require_shift;

        let base = engine.evaluate(&user, permission, &options);
        let with_resource = engine.evaluate(&user, permission, &options.clone().with_resource("resource:1"));

        prop_assert!(!base.allowed || with_resource.allowed);
    }

    #[test]
    fn prop_requesting_shift_check_never_grants(
        role in any_role(),
        permission in any_permission(),
        hour in 0u32..24,
        shift in any_shift(),
    ) {
        let (engine, _) = engine_at(hour);
        let mut user = UserProfile::new("user:prop", role);
        user.shift = shift;

        let without = engine.evaluate(&user, permission, &DecisionOptions::new());
        let with = engine.evaluate(&user, permission, &DecisionOptions::new().with_shift_access());

        prop_assert!(!with.allowed || without.allowed);
        if !without.allowed {
            prop_assert_eq!(with.reason, without.reason);
        }
    }
}
