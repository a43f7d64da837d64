//! Error types for the ecosystem store

use thiserror::Error;

use carelink_authz::DecisionReason;
use carelink_core::DomainContext;
use carelink_sync::SyncError;

/// Errors returned by [`crate::EcosystemStateStore`]
///
/// A denied context switch is `AccessDenied`, shown as an access-denied
/// state rather than an error dialog.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Session expired or was rejected; the logout flow has run
    #[error("session invalid: {0}")]
    SessionInvalid(String),

    #[error("no user is logged in")]
    NotAuthenticated,

    #[error("access to {context} denied: {reason}")]
    AccessDenied {
        context: DomainContext,
        reason: DecisionReason,
    },

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("session store error: {0}")]
    Persistence(String),

    #[error("invalid preference: {0}")]
    InvalidPreference(String),
}

impl StoreError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, StoreError::AccessDenied { .. })
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
