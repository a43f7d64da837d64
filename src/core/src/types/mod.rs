//! Shared domain types for the CareLink portal

pub mod role;
pub mod permission;
pub mod organization;
pub mod context;
pub mod user;

// Re-export commonly used types
pub use role::Role;
pub use permission::Permission;
pub use organization::OrganizationScope;
pub use context::DomainContext;
pub use user::{Session, UserProfile};
