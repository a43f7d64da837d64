//! Observer of fetch lifecycle transitions
//!
//! The coordinator reports transitions; the owner of the per-context sync
//! state (the ecosystem store) applies them.

use chrono::{DateTime, Utc};

use carelink_core::DomainContext;

use crate::error::FetchError;

/// Receives fetch lifecycle transitions for each context
pub trait SyncListener: Send + Sync {
    /// A fetch started: loading on, error cleared
    fn on_fetch_started(&self, context: DomainContext);

    /// Fresh data was written to the cache
    fn on_fetch_succeeded(&self, context: DomainContext, written_at: DateTime<Utc>);

    /// The fetch failed; `has_fallback` tells whether cached data exists
    fn on_fetch_failed(&self, context: DomainContext, error: &FetchError, has_fallback: bool);

    /// The current fetch for the context is over, whatever its outcome
    fn on_fetch_finished(&self, context: DomainContext);
}

/// Listener that ignores every transition
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl SyncListener for NoopListener {
    fn on_fetch_started(&self, _context: DomainContext) {}

    fn on_fetch_succeeded(&self, _context: DomainContext, _written_at: DateTime<Utc>) {}

    fn on_fetch_failed(&self, _context: DomainContext, _error: &FetchError, _has_fallback: bool) {}

    fn on_fetch_finished(&self, _context: DomainContext) {}
}
