//! # CareLink Sync
//!
//! Per-context data cache and synchronization for the CareLink portal.
//!
//! ## Features
//!
//! - **Context cache** with one entry per [`DomainContext`] and a global TTL
//! - **Request coalescing**: at most one authoritative fetch per context
//! - **Last-initiated-wins**: results of superseded fetches are discarded
//! - **Stale fallback**: a failed refresh serves the last good value
//! - **Auto-refresh** of the active context on a cancellable timer
//!
//! [`DomainContext`]: carelink_core::DomainContext

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod listener;
pub mod refresh;
pub mod source;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheEntry, CacheStats, ContextCache};
pub use coordinator::{DataOrigin, SyncCoordinator, SyncOutcome};
pub use error::{FetchError, Result, SyncError, SyncErrorKind};
pub use http::HttpDataSource;
pub use listener::{NoopListener, SyncListener};
pub use refresh::{AutoRefresh, MIN_REFRESH_INTERVAL};
pub use source::{DataSource, Payload};
