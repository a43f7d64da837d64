//! Organization scope resolution
//!
//! This module decides whether a capability may be exercised against a
//! target organization or resource, given the caller's organizational
//! level and explicit resource assignments.
//!
//! # Examples
//!
//! ```
//! use carelink_authz::scope::ScopeResolver;
//! use carelink_core::{OrganizationScope, Permission};
//!
//! let resolver = ScopeResolver::new();
//!
//! assert!(resolver.is_in_scope(
//!     Some("facility:north"),
//!     Some(OrganizationScope::Network),
//!     "facility:south",
//!     Permission::ViewPatientRecords,
//! ));
//! ```

mod types;
mod resolver;


pub use types::{level_permissions, is_level_gated, LEVEL_GATED};
pub use resolver::ScopeResolver;
