//! Per-context sync state
//!
//! One [`SyncState`] per [`DomainContext`], created up front and never
//! removed. The board is the coordinator's [`SyncListener`]: every loading
//! and error transition arrives through it.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, warn};

use carelink_core::DomainContext;
use carelink_sync::{FetchError, SyncErrorKind, SyncListener};

/// Sync state of one context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub loading: bool,

    /// Set when a fetch failed with nothing cached to fall back on
    pub error: Option<SyncErrorKind>,

    /// Last fetch failed but cached data is being served
    pub stale: bool,

    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncState {
    fn attempted(&self) -> bool {
        self.last_synced_at.is_some() || self.error.is_some() || self.stale
    }
}

/// Overall health derived from every context's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Operational,
    /// Some context is stale or in error
    Degraded,
    /// Every context that has been attempted is in error
    Offline,
}

/// Aggregate of all per-context sync state
pub struct SyncBoard {
    states: RwLock<HashMap<DomainContext, SyncState>>,
}

impl SyncBoard {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(Self::initial()),
        }
    }

    pub fn get(&self, context: DomainContext) -> SyncState {
        self.states.read().get(&context).cloned().unwrap_or_default()
    }

    /// Loading state of `context`, or of any context when `None`
    pub fn is_loading(&self, context: Option<DomainContext>) -> bool {
        let states = self.states.read();
        match context {
            Some(context) => states.get(&context).map(|s| s.loading).unwrap_or(false),
            None => states.values().any(|s| s.loading),
        }
    }

    /// Error state of `context`, or of any context when `None`
    pub fn has_error(&self, context: Option<DomainContext>) -> bool {
        let states = self.states.read();
        match context {
            Some(context) => states.get(&context).map(|s| s.error.is_some()).unwrap_or(false),
            None => states.values().any(|s| s.error.is_some()),
        }
    }

    /// Clear the error banner of `context`; returns whether one was set
    pub fn dismiss_error(&self, context: DomainContext) -> bool {
        let mut states = self.states.write();
        states
            .get_mut(&context)
            .and_then(|state| state.error.take())
            .is_some()
    }

    /// Clear error and stale flags of every context
    pub fn clear_errors(&self) {
        for state in self.states.write().values_mut() {
            state.error = None;
            state.stale = false;
        }
    }

    /// Back to the initial state of every context
    pub fn reset(&self) {
        *self.states.write() = Self::initial();
    }

    pub fn system_status(&self) -> SystemStatus {
        let states = self.states.read();
        let attempted: Vec<&SyncState> = states.values().filter(|s| s.attempted()).collect();

        if !attempted.is_empty() && attempted.iter().all(|s| s.error.is_some()) {
            SystemStatus::Offline
        } else if attempted.iter().any(|s| s.error.is_some() || s.stale) {
            SystemStatus::Degraded
        } else {
            SystemStatus::Operational
        }
    }

    fn initial() -> HashMap<DomainContext, SyncState> {
        DomainContext::ALL
            .iter()
            .map(|context| (*context, SyncState::default()))
            .collect()
    }

    fn update(&self, context: DomainContext, apply: impl FnOnce(&mut SyncState)) {
        let mut states = self.states.write();
        apply(states.entry(context).or_default());
    }
}

impl Default for SyncBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncListener for SyncBoard {
    fn on_fetch_started(&self, context: DomainContext) {
        debug!("Fetch started for {}", context);
        self.update(context, |state| {
            state.loading = true;
            state.error = None;
        });
    }

    fn on_fetch_succeeded(&self, context: DomainContext, written_at: DateTime<Utc>) {
        self.update(context, |state| {
            state.error = None;
            state.stale = false;
            state.last_synced_at = Some(written_at);
        });
    }

    fn on_fetch_failed(&self, context: DomainContext, error: &FetchError, has_fallback: bool) {
        if has_fallback {
            warn!("{} is serving stale data: {}", context, error);
        } else {
            error!("{} has no data: {}", context, error);
        }
        let kind = error.kind();
        self.update(context, |state| {
            if has_fallback {
                state.stale = true;
                state.error = None;
            } else {
                state.stale = false;
                state.error = Some(kind);
            }
        });
    }

    fn on_fetch_finished(&self, context: DomainContext) {
        self.update(context, |state| state.loading = false);
    }
}
