//! Error types for the authorization engine
//!
//! A denial is a regular [`crate::AccessDecision`], never an error. These
//! variants cover misconfiguration and unavailable collaborators only.

use thiserror::Error;

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Shift window definition is invalid
    #[error("Invalid shift window '{name}': {reason}")]
    InvalidShiftWindow { name: String, reason: String },

    /// Audit sink could not record an event
    #[error("Audit sink unavailable: {0}")]
    AuditUnavailable(String),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
