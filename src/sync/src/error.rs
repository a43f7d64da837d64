//! Error types for data synchronization

use serde::{Deserialize, Serialize};
use thiserror::Error;

use carelink_core::DomainContext;

/// Failure of one DataSource call
///
/// Timeouts are handled like any other failure: the coordinator falls back
/// to cached data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Request exceeded the source's timeout
    #[error("request timed out")]
    Timeout,

    /// Backend answered with a non-success status
    #[error("server returned status {code}")]
    Status { code: u16 },

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body was not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Source is not available (not configured, offline)
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    /// Serializable classification kept in per-context sync state
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            FetchError::Timeout => SyncErrorKind::Timeout,
            FetchError::Status { .. } => SyncErrorKind::Server,
            FetchError::Transport(_) => SyncErrorKind::Network,
            FetchError::Decode(_) => SyncErrorKind::InvalidData,
            FetchError::Unavailable(_) => SyncErrorKind::Unavailable,
        }
    }
}

/// Classification of a fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    Timeout,
    Server,
    Network,
    InvalidData,
    Unavailable,
}

/// Errors surfaced by the coordinator
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// Fetch failed and nothing is cached for the context
    #[error("no data available for {context}: {source}")]
    NoData {
        context: DomainContext,
        source: FetchError,
    },

    /// The session that started the fetch was replaced
    #[error("fetch for {context} abandoned after session change")]
    Abandoned { context: DomainContext },

    /// A forwarded operation failed
    #[error("operation '{operation}' on {context} failed: {source}")]
    Operation {
        context: DomainContext,
        operation: String,
        source: FetchError,
    },
}

impl SyncError {
    pub fn context(&self) -> DomainContext {
        match self {
            SyncError::NoData { context, .. }
            | SyncError::Abandoned { context }
            | SyncError::Operation { context, .. } => *context,
        }
    }

    /// Kind of the underlying fetch failure, if any
    pub fn kind(&self) -> Option<SyncErrorKind> {
        match self {
            SyncError::NoData { source, .. } | SyncError::Operation { source, .. } => {
                Some(source.kind())
            }
            SyncError::Abandoned { .. } => None,
        }
    }
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kinds() {
        assert_eq!(FetchError::Timeout.kind(), SyncErrorKind::Timeout);
        assert_eq!(FetchError::Status { code: 503 }.kind(), SyncErrorKind::Server);
        assert_eq!(FetchError::Transport("reset".into()).kind(), SyncErrorKind::Network);
    }

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::NoData {
            context: DomainContext::Analytics,
            source: FetchError::Status { code: 502 },
        };
        assert_eq!(err.to_string(), "no data available for analytics: server returned status 502");
        assert_eq!(err.kind(), Some(SyncErrorKind::Server));
        assert_eq!(err.context(), DomainContext::Analytics);
    }
}
