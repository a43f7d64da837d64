//! # CareLink Authorization Engine
//!
//! Role, shift and organization scoped authorization for the CareLink
//! portal, with audit events for every decision of consequence.
//!
//! ## Features
//!
//! - **Closed permission catalog** mapping each role to its capability set
//! - **Shift windows** with overnight wraparound and emergency overrides
//! - **Organization scope** checks with a resource-assignment gate
//! - **Audit events** for login, logout, denials and resource access
//! - **Decision metrics** per deny reason
//!
//! ## Example
//!
//! ```rust
//! use carelink_authz::{AuthorizationEngine, DecisionOptions, EngineConfig, MemoryAuditSink};
//! use carelink_core::{ManualClock, Permission, Role, UserProfile};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let engine = AuthorizationEngine::new(
//!     EngineConfig::default(),
//!     Arc::new(MemoryAuditSink::new()),
//!     Arc::new(ManualClock::at_hour(3)),
//! );
//!
//! let nurse = UserProfile::new("user:amal", Role::Nurse).with_shift("night_shift");
//! let decision = engine
//!     .decide(&nurse, Permission::AdministerMedication, &DecisionOptions::default())
//!     .await;
//!
//! assert!(decision.allowed);
//! # });
//! ```

pub mod catalog;
pub mod shift;
pub mod scope;
pub mod audit;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use catalog::{PermissionCatalog, PermissionSet};
pub use shift::{AccessWindowEvaluator, ShiftCatalog, ShiftWindow};
pub use scope::ScopeResolver;
pub use audit::{
    AuditAction, AuditEvent, AuditOutcomeKind, AuditSink, AuditStats, MemoryAuditSink,
    Redactor, TracingAuditSink,
};
pub use engine::{
    AccessDecision, AuditStatus, AuthorizationEngine, DecisionMetrics, DecisionOptions,
    DecisionReason, EngineConfig,
};
pub use error::{AuthzError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
