//! Store fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use carelink_authz::{AuthorizationEngine, EngineConfig, MemoryAuditSink};
use carelink_core::{Clock, DomainContext, ManualClock, Role, Session, UserProfile};
use carelink_store::{
    Collaborators, EcosystemStateStore, MemorySessionStore, PersistedState, StoreConfig,
};
use carelink_sync::{DataSource, FetchError};

/// Backend double: can fail, or hold fetches until released
#[derive(Default)]
pub struct FakeBackend {
    calls: AtomicUsize,
    failing: AtomicBool,
    hold: AtomicBool,
    gate: Notify,
    tokens: Mutex<Vec<Option<String>>>,
    failed_contexts: Mutex<HashSet<DomainContext>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_hold(&self, hold: bool) {
        self.hold.store(hold, Ordering::SeqCst);
    }

    /// Let one held fetch complete
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().clone()
    }

    pub fn has_failed(&self, context: DomainContext) -> bool {
        self.failed_contexts.lock().contains(&context)
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl DataSource for FakeBackend {
    async fn fetch(&self, context: DomainContext) -> Result<serde_json::Value, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.hold.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            self.failed_contexts.lock().insert(context);
            return Err(FetchError::Transport("connection refused".into()));
        }
        Ok(json!({ "context": context.as_str(), "call": call }))
    }

    async fn execute(
        &self,
        _context: DomainContext,
        operation: &str,
        _params: serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        Ok(json!({ "accepted": operation }))
    }

    fn set_session_token(&self, token: Option<&str>) {
        self.tokens.lock().push(token.map(str::to_string));
    }
}

pub struct Harness {
    pub store: EcosystemStateStore,
    pub backend: Arc<FakeBackend>,
    pub sessions: Arc<MemorySessionStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub clock: Arc<ManualClock>,
}

pub async fn harness() -> Harness {
    harness_with(PersistedState::default()).await
}

pub async fn harness_with(state: PersistedState) -> Harness {
    let clock = Arc::new(ManualClock::at_hour(9));
    let backend = FakeBackend::new();
    let sessions = Arc::new(MemorySessionStore::with_state(state));
    let audit = Arc::new(MemoryAuditSink::new());
    let engine = Arc::new(AuthorizationEngine::new(
        EngineConfig::default(),
        audit.clone(),
        clock.clone(),
    ));

    let store = EcosystemStateStore::open(
        StoreConfig::default(),
        Collaborators {
            engine,
            data_source: backend.clone(),
            session_store: sessions.clone(),
            clock: clock.clone(),
        },
    )
    .await
    .unwrap();

    Harness {
        store,
        backend,
        sessions,
        audit,
        clock,
    }
}

pub fn session_for(role: Role, clock: &ManualClock) -> Session {
    let user = UserProfile::new(format!("user:{}", role.as_str()), role);
    Session::new(format!("tok-{}", role.as_str()), user, clock.now_utc())
        .expiring_at(clock.now_utc() + ChronoDuration::hours(8))
}
