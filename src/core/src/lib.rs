//! # CareLink Core
//!
//! Shared domain types, the clock collaborator, and error handling for the
//! CareLink portal crates. Authorization (`carelink-authz`) and data
//! synchronization (`carelink-sync`) both build on these types, so they live
//! here to keep the two engines independent of each other.

pub mod types;
pub mod traits;
pub mod error;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{Clock, ManualClock, SystemClock};
pub use types::{
    DomainContext, OrganizationScope, Permission, Role, Session, UserProfile,
};

/// Identifier of a portal user
pub type UserId = String;

/// Identifier of an organization node (network, facility, department or unit)
pub type OrganizationId = String;
