//! Ecosystem state store
//!
//! Owns the current session, the active context and the per-context sync
//! state. Every access to context data is first decided by the
//! [`AuthorizationEngine`] for the current user.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use carelink_authz::{AccessDecision, AuditStatus, AuthorizationEngine, DecisionOptions};
use carelink_core::{Clock, DomainContext, Permission, Session, UserProfile};
use carelink_sync::{
    AutoRefresh, CacheConfig, CacheStats, DataSource, SyncCoordinator, SyncErrorKind, SyncOutcome,
};
pub use carelink_sync::MIN_REFRESH_INTERVAL;

use crate::board::{SyncBoard, SyncState, SystemStatus};
use crate::error::{Result, StoreError};
use crate::session::{PersistedState, Preferences, SessionStore};

/// Store configuration
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub cache: CacheConfig,

    /// Preferences used until the user saves their own
    pub default_preferences: Preferences,
}

/// Collaborators injected into the store
pub struct Collaborators {
    pub engine: Arc<AuthorizationEngine>,
    pub data_source: Arc<dyn DataSource>,
    pub session_store: Arc<dyn SessionStore>,
    pub clock: Arc<dyn Clock>,
}

/// What the UI renders for one context
#[derive(Debug, Clone, Serialize)]
pub struct ContextSnapshot {
    pub context: DomainContext,
    pub data: Option<serde_json::Value>,
    pub last_written_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Cached entry is within the TTL
    pub valid: bool,
    pub stale: bool,
    pub loading: bool,
    pub error: Option<SyncErrorKind>,
}

/// Aggregate portal state
pub struct EcosystemStateStore {
    engine: Arc<AuthorizationEngine>,
    coordinator: Arc<SyncCoordinator>,
    board: Arc<SyncBoard>,
    data_source: Arc<dyn DataSource>,
    session_store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    session: RwLock<Option<Session>>,
    preferences: RwLock<Preferences>,
    preferences_saved: RwLock<bool>,
    active: watch::Sender<DomainContext>,
    auto_refresh: AutoRefresh,
}

impl EcosystemStateStore {
    /// Build the store and restore the persisted session
    ///
    /// The SessionStore is read exactly once here. An expired session is
    /// discarded through the logout flow and the store starts anonymous.
    pub async fn open(config: StoreConfig, collaborators: Collaborators) -> Result<Self> {
        let Collaborators {
            engine,
            data_source,
            session_store,
            clock,
        } = collaborators;

        let persisted = session_store.load().await?;
        let preferences_saved = persisted.preferences.is_some();
        let mut preferences = persisted
            .preferences
            .unwrap_or_else(|| config.default_preferences.clone());
        if preferences.refresh_interval() < MIN_REFRESH_INTERVAL {
            let fallback = config
                .default_preferences
                .refresh_interval()
                .max(MIN_REFRESH_INTERVAL);
            warn!(
                "Stored refresh interval {}ms is below {:?}, using {:?}",
                preferences.refresh_interval_ms, MIN_REFRESH_INTERVAL, fallback
            );
            preferences.refresh_interval_ms = fallback.as_millis() as u64;
        }

        let board = Arc::new(SyncBoard::new());
        let coordinator = Arc::new(SyncCoordinator::new(
            config.cache,
            data_source.clone(),
            board.clone(),
            clock.clone(),
        ));
        let (active, active_rx) = watch::channel(DomainContext::default());
        let auto_refresh =
            AutoRefresh::new(coordinator.clone(), active_rx, preferences.refresh_interval());

        let store = Self {
            engine,
            coordinator,
            board,
            data_source,
            session_store,
            clock,
            session: RwLock::new(None),
            preferences: RwLock::new(preferences),
            preferences_saved: RwLock::new(preferences_saved),
            active,
            auto_refresh,
        };

        match persisted.session {
            Some(session) if session.is_expired(store.clock.now_utc()) => {
                let err = StoreError::SessionInvalid(format!(
                    "session of {} expired at startup",
                    session.user.id
                ));
                warn!("{}", err);
                store.end_session(Some(session)).await?;
            }
            Some(session) => {
                info!("Restored session of {}", session.user.id);
                store.begin_session(session);
            }
            None => debug!("Starting without a session"),
        }

        Ok(store)
    }

    /// Replace the current session
    ///
    /// Error state of every context is cleared before anything else, and
    /// nothing fetched under the previous session survives.
    pub async fn login(&self, session: Session) -> Result<()> {
        if session.is_expired(self.clock.now_utc()) {
            return Err(StoreError::SessionInvalid(format!(
                "session of {} is already expired",
                session.user.id
            )));
        }

        // Reset first: no fetch of the old session can report after this
        self.coordinator.reset();
        self.board.clear_errors();

        let user = session.user.clone();
        self.begin_session(session);
        info!("Login: {}", user.id);

        if let AuditStatus::Failed(reason) = self.engine.record_login(&user).await {
            warn!("Login of {} not audited: {}", user.id, reason);
        }
        self.persist().await
    }

    /// End the current session; the auto-refresh timer is always torn down
    pub async fn logout(&self) -> Result<()> {
        let session = self.session.write().take();
        self.end_session(session).await
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.read().as_ref().map(|s| s.user.clone())
    }

    pub fn active_context(&self) -> DomainContext {
        *self.active.borrow()
    }

    /// Make `context` active
    ///
    /// Optimistic: the returned snapshot holds whatever is cached, and a
    /// refresh is started in the background when that entry is not valid.
    /// A denial leaves the active context unchanged.
    pub async fn switch_context(&self, context: DomainContext) -> Result<ContextSnapshot> {
        self.authorize_context(context).await?;

        let previous = self.active.send_replace(context);
        if previous != context {
            info!("Active context: {} -> {}", previous, context);
        }

        if self.coordinator.prefetch(context, false).is_some() {
            debug!("Background refresh started for {}", context);
        }
        Ok(self.build_snapshot(context))
    }

    /// Switch to `context` and wait until its data is available
    pub async fn load(&self, context: DomainContext) -> Result<ContextSnapshot> {
        self.authorize_context(context).await?;
        self.active.send_replace(context);
        self.coordinator.ensure_fresh(context, false).await?;
        Ok(self.build_snapshot(context))
    }

    /// Manual retry: force a refresh of `context` or the active one
    pub async fn refresh(&self, context: Option<DomainContext>) -> Result<SyncOutcome> {
        let context = context.unwrap_or_else(|| self.active_context());
        self.authorize_context(context).await?;
        Ok(self.coordinator.ensure_fresh(context, true).await?)
    }

    /// Cached view of `context` with its sync flags
    pub async fn snapshot(&self, context: DomainContext) -> Result<ContextSnapshot> {
        self.authorize_context(context).await?;
        Ok(self.build_snapshot(context))
    }

    /// Run an operation on `context` for the current user
    pub async fn execute(
        &self,
        context: DomainContext,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.authorize_context(context).await?;
        Ok(self.coordinator.execute(context, operation, params).await?)
    }

    /// Permission check for the current user
    pub async fn can(&self, permission: Permission, options: &DecisionOptions) -> Result<AccessDecision> {
        let user = self.require_user().await?;
        Ok(self.engine.decide(&user, permission, options).await)
    }

    pub fn is_loading(&self, context: Option<DomainContext>) -> bool {
        self.board.is_loading(context)
    }

    pub fn has_error(&self, context: Option<DomainContext>) -> bool {
        self.board.has_error(context)
    }

    pub fn dismiss_error(&self, context: DomainContext) -> bool {
        self.board.dismiss_error(context)
    }

    pub fn sync_state(&self, context: DomainContext) -> SyncState {
        self.board.get(context)
    }

    pub fn system_status(&self) -> SystemStatus {
        self.board.system_status()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.coordinator.stats()
    }

    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences.read().clone()
    }

    pub fn is_auto_refresh_running(&self) -> bool {
        self.auto_refresh.is_running()
    }

    /// Enable or disable auto-refresh; persisted
    pub async fn set_auto_refresh(&self, enabled: bool) -> Result<()> {
        self.preferences.write().auto_refresh = enabled;
        *self.preferences_saved.write() = true;

        if enabled && self.session.read().is_some() {
            self.auto_refresh.start();
        } else {
            self.auto_refresh.stop();
        }
        self.persist().await
    }

    /// Change the auto-refresh interval; persisted, running timer rescheduled
    pub async fn set_refresh_interval(&self, interval: Duration) -> Result<()> {
        if !self.auto_refresh.set_interval(interval) {
            return Err(StoreError::InvalidPreference(format!(
                "refresh interval {:?} is below {:?}",
                interval, MIN_REFRESH_INTERVAL
            )));
        }

        self.preferences.write().refresh_interval_ms = interval.as_millis() as u64;
        *self.preferences_saved.write() = true;
        info!("Auto-refresh interval set to {:?}", interval);
        self.persist().await
    }

    /// Stop background work
    pub fn shutdown(&self) {
        self.auto_refresh.stop();
        info!("Store shut down");
    }

    // Private helper methods

    fn begin_session(&self, session: Session) {
        self.data_source.set_session_token(Some(&session.token));
        *self.session.write() = Some(session);
        self.active.send_replace(DomainContext::default());

        if self.preferences.read().auto_refresh {
            self.auto_refresh.start();
        }
    }

    async fn end_session(&self, session: Option<Session>) -> Result<()> {
        self.auto_refresh.stop();
        self.coordinator.reset();
        self.board.reset();
        self.data_source.set_session_token(None);
        self.active.send_replace(DomainContext::default());

        if let Some(session) = session {
            info!("Logout: {}", session.user.id);
            if let AuditStatus::Failed(reason) = self.engine.record_logout(&session.user).await {
                warn!("Logout of {} not audited: {}", session.user.id, reason);
            }
        }
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        let preferences = if *self.preferences_saved.read() {
            Some(self.preferences.read().clone())
        } else {
            None
        };
        let state = PersistedState {
            session: self.session.read().clone(),
            preferences,
        };
        self.session_store.save(&state).await
    }

    async fn require_user(&self) -> Result<UserProfile> {
        let session = self.session.read().clone();
        match session {
            None => Err(StoreError::NotAuthenticated),
            Some(session) if session.is_expired(self.clock.now_utc()) => {
                warn!("Session of {} expired", session.user.id);
                self.logout().await?;
                Err(StoreError::SessionInvalid(format!(
                    "session of {} expired",
                    session.user.id
                )))
            }
            Some(session) => Ok(session.user),
        }
    }

    async fn authorize_context(&self, context: DomainContext) -> Result<UserProfile> {
        let user = self.require_user().await?;
        let decision = self
            .engine
            .decide(&user, context.required_permission(), &DecisionOptions::default())
            .await;

        if decision.allowed {
            Ok(user)
        } else {
            Err(StoreError::AccessDenied {
                context,
                reason: decision.reason,
            })
        }
    }

    fn build_snapshot(&self, context: DomainContext) -> ContextSnapshot {
        let entry = self.coordinator.cache().get(context);
        let state = self.board.get(context);
        let valid = entry
            .as_ref()
            .map(|e| e.is_valid(self.coordinator.cache().ttl(), self.clock.now_utc()))
            .unwrap_or(false);

        ContextSnapshot {
            context,
            data: entry.as_ref().map(|e| (*e.data).clone()),
            last_written_at: entry.map(|e| e.last_written_at),
            valid,
            stale: state.stale,
            loading: state.loading,
            error: state.error,
        }
    }
}
