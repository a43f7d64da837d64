//! Shared test doubles for the sync crate

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use carelink_core::DomainContext;
use carelink_sync::{DataSource, FetchError, SyncListener};

/// DataSource whose calls can be held open and made to fail by call number
#[derive(Default)]
pub struct GatedSource {
    calls: AtomicUsize,
    gated: bool,
    gates: Mutex<HashMap<usize, Arc<Notify>>>,
    failures: Mutex<HashSet<usize>>,
    contexts: Mutex<Vec<DomainContext>>,
}

impl GatedSource {
    /// Every fetch completes immediately
    pub fn open() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every fetch waits for [`GatedSource::release`]
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gated: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn contexts(&self) -> Vec<DomainContext> {
        self.contexts.lock().clone()
    }

    /// Let fetch number `call` (1-based) complete
    pub fn release(&self, call: usize) {
        self.gate(call).notify_one();
    }

    /// Make fetch number `call` fail with a 503
    pub fn fail_call(&self, call: usize) {
        self.failures.lock().insert(call);
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }

    fn gate(&self, call: usize) -> Arc<Notify> {
        self.gates
            .lock()
            .entry(call)
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }
}

#[async_trait]
impl DataSource for GatedSource {
    async fn fetch(&self, context: DomainContext) -> Result<serde_json::Value, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.contexts.lock().push(context);

        if self.gated {
            let gate = self.gate(call);
            gate.notified().await;
        }

        if self.failures.lock().contains(&call) {
            Err(FetchError::Status { code: 503 })
        } else {
            Ok(json!({ "context": context.as_str(), "call": call }))
        }
    }

    async fn execute(
        &self,
        _context: DomainContext,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        Ok(json!({ "operation": operation, "params": params }))
    }
}

/// Listener that records transitions and tracks loading flags
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
    loading: Mutex<HashSet<DomainContext>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn is_loading(&self, context: DomainContext) -> bool {
        self.loading.lock().contains(&context)
    }
}

impl SyncListener for RecordingListener {
    fn on_fetch_started(&self, context: DomainContext) {
        self.loading.lock().insert(context);
        self.events.lock().push(format!("started:{}", context));
    }

    fn on_fetch_succeeded(&self, context: DomainContext, _written_at: DateTime<Utc>) {
        self.events.lock().push(format!("succeeded:{}", context));
    }

    fn on_fetch_failed(&self, context: DomainContext, error: &FetchError, has_fallback: bool) {
        self.events
            .lock()
            .push(format!("failed:{}:{}:{}", context, error, has_fallback));
    }

    fn on_fetch_finished(&self, context: DomainContext) {
        self.loading.lock().remove(&context);
        self.events.lock().push(format!("finished:{}", context));
    }
}
