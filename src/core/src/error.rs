//! Unified error types for the CareLink core crate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type shared by the CareLink crates
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A token did not name a known role
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A token did not name a known permission
    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    /// A token did not name a known domain context
    #[error("Unknown domain context: {0}")]
    UnknownContext(String),

    /// A token did not name a known organization level
    #[error("Unknown organization level: {0}")]
    UnknownOrganizationLevel(String),
}
