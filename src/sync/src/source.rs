//! DataSource collaborator

use async_trait::async_trait;
use std::sync::Arc;

use carelink_core::DomainContext;

use crate::error::FetchError;

/// Cached payload of one context. Shared, never partially updated.
pub type Payload = Arc<serde_json::Value>;

/// Backend that serves context data and accepts operations
///
/// Implementations own their timeout; a timeout is reported as
/// [`FetchError::Timeout`].
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Load the full payload of a context
    async fn fetch(&self, context: DomainContext) -> Result<serde_json::Value, FetchError>;

    /// Run an operation against a context (e.g. submit a claim)
    async fn execute(
        &self,
        context: DomainContext,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, FetchError>;

    /// Credentials for subsequent calls; `None` after logout
    fn set_session_token(&self, _token: Option<&str>) {}
}
