//! Synchronization coordinator
//!
//! Decides per context whether cached data can be served or a fetch must
//! run, coalesces concurrent requests onto one fetch, and discards the
//! results of fetches that were superseded by a newer one.
//!
//! # Generations
//!
//! Every started fetch gets the next generation number for its context.
//! Only the fetch holding the current generation may write the cache or
//! report completion to the [`SyncListener`]. A forced refresh while a fetch
//! is in flight starts a new generation; callers waiting on the old one
//! follow the new fetch.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use carelink_core::{Clock, DomainContext};

use crate::cache::{CacheConfig, CacheStats, ContextCache};
use crate::error::{FetchError, Result, SyncError};
use crate::listener::SyncListener;
use crate::source::{DataSource, Payload};

/// Where the returned data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// Valid cache entry, no fetch
    Cache,
    /// Fresh fetch result
    Network,
    /// Cached data served after a failed fetch
    StaleFallback,
}

/// Data returned by [`SyncCoordinator::ensure_fresh`]
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub context: DomainContext,
    pub data: Payload,
    pub origin: DataOrigin,
    pub written_at: DateTime<Utc>,
    /// Failure that forced the stale fallback
    pub error: Option<FetchError>,
}

impl SyncOutcome {
    pub fn is_stale(&self) -> bool {
        self.origin == DataOrigin::StaleFallback
    }
}

#[derive(Debug, Clone)]
enum FetchResult {
    Fresh(Payload, DateTime<Utc>),
    Failed(FetchError),
    Superseded,
}

type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

enum Begin {
    Hit(SyncOutcome),
    Wait(SharedFetch, u64),
}

struct InFlight {
    generation: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct Registry {
    /// Bumped on session change; waiters from an older epoch give up
    epoch: u64,
    generations: HashMap<DomainContext, u64>,
    in_flight: HashMap<DomainContext, InFlight>,
    /// Contexts changed by an operation; next ensure_fresh must fetch
    dirty: HashSet<DomainContext>,
    last_error: HashMap<DomainContext, FetchError>,
}

impl Registry {
    fn generation(&self, context: DomainContext) -> u64 {
        self.generations.get(&context).copied().unwrap_or(0)
    }

    fn next_generation(&mut self, context: DomainContext) -> u64 {
        let generation = self.generations.entry(context).or_insert(0);
        *generation += 1;
        *generation
    }
}

/// Clears in-flight bookkeeping when a fetch future ends, including by drop
struct FetchGuard {
    context: DomainContext,
    generation: u64,
    registry: Arc<Mutex<Registry>>,
    listener: Arc<dyn SyncListener>,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        if registry
            .in_flight
            .get(&self.context)
            .map(|f| f.generation == self.generation)
            .unwrap_or(false)
        {
            registry.in_flight.remove(&self.context);
        }
        if registry.generation(self.context) == self.generation {
            self.listener.on_fetch_finished(self.context);
        }
    }
}

/// Synchronization coordinator
pub struct SyncCoordinator {
    cache: Arc<ContextCache>,
    source: Arc<dyn DataSource>,
    listener: Arc<dyn SyncListener>,
    registry: Arc<Mutex<Registry>>,
}

impl SyncCoordinator {
    pub fn new(
        config: CacheConfig,
        source: Arc<dyn DataSource>,
        listener: Arc<dyn SyncListener>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!("SyncCoordinator initialized with ttl={:?}", config.ttl);
        Self {
            cache: Arc::new(ContextCache::new(config, clock)),
            source,
            listener,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    /// Serve `context` from cache when valid, otherwise fetch it
    ///
    /// Concurrent non-forced calls share one fetch. On fetch failure the
    /// last cached value is served as a stale fallback; without one the
    /// failure is returned as [`SyncError::NoData`].
    pub async fn ensure_fresh(&self, context: DomainContext, force: bool) -> Result<SyncOutcome> {
        match self.begin(context, force) {
            Begin::Hit(outcome) => Ok(outcome),
            Begin::Wait(fetch, epoch) => self.await_fetch(context, fetch, epoch).await,
        }
    }

    /// Start or join a fetch for `context` without waiting for it
    ///
    /// The loading transition is reported before this returns. Returns
    /// `None` on a cache hit.
    pub fn prefetch(
        self: &Arc<Self>,
        context: DomainContext,
        force: bool,
    ) -> Option<JoinHandle<Result<SyncOutcome>>> {
        match self.begin(context, force) {
            Begin::Hit(_) => None,
            Begin::Wait(fetch, epoch) => {
                let coordinator = self.clone();
                Some(tokio::spawn(async move {
                    coordinator.await_fetch(context, fetch, epoch).await
                }))
            }
        }
    }

    /// Forward an operation to the data source
    ///
    /// On success the context is marked so the next `ensure_fresh` fetches
    /// regardless of TTL.
    pub async fn execute(
        &self,
        context: DomainContext,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let result = self
            .source
            .execute(context, operation, params)
            .await
            .map_err(|source| SyncError::Operation {
                context,
                operation: operation.to_string(),
                source,
            })?;

        self.registry.lock().dirty.insert(context);
        info!("Operation '{}' on {} completed", operation, context);
        Ok(result)
    }

    /// Whether a fetch for `context` is in flight
    pub fn is_fetching(&self, context: DomainContext) -> bool {
        self.registry.lock().in_flight.contains_key(&context)
    }

    /// Drop the cache and discard every in-flight fetch
    ///
    /// Used on login and logout so data of one session never reaches the
    /// next.
    pub fn reset(&self) {
        let mut registry = self.registry.lock();
        registry.epoch += 1;
        let abandoned: Vec<DomainContext> = registry.in_flight.keys().copied().collect();
        for context in &abandoned {
            registry.next_generation(*context);
        }
        registry.in_flight.clear();
        registry.dirty.clear();
        registry.last_error.clear();
        self.cache.clear();

        for context in abandoned {
            self.cache.increment_stat("superseded");
            self.listener.on_fetch_finished(context);
        }
        drop(registry);
        info!("Sync state reset");
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // Private helper methods

    fn begin(&self, context: DomainContext, force: bool) -> Begin {
        let mut registry = self.registry.lock();
        let force = force || registry.dirty.contains(&context);

        if !force {
            if let Some(entry) = self.cache.get(context) {
                if entry.is_valid(self.cache.ttl(), self.cache.now()) {
                    self.cache.increment_stat("hits");
                    debug!("Cache hit for {}", context);
                    return Begin::Hit(SyncOutcome {
                        context,
                        data: entry.data,
                        origin: DataOrigin::Cache,
                        written_at: entry.last_written_at,
                        error: None,
                    });
                }
            }
        }
        self.cache.increment_stat("misses");

        let fetch = match registry.in_flight.get(&context) {
            Some(in_flight) if !force => {
                self.cache.increment_stat("coalesced");
                debug!("Joining in-flight fetch for {} (gen {})", context, in_flight.generation);
                in_flight.fetch.clone()
            }
            _ => self.start_fetch(&mut registry, context),
        };
        Begin::Wait(fetch, registry.epoch)
    }

    fn start_fetch(&self, registry: &mut Registry, context: DomainContext) -> SharedFetch {
        let generation = registry.next_generation(context);
        if let Some(previous) = registry.in_flight.get(&context) {
            debug!(
                "Fetch for {} gen {} superseded by gen {}",
                context, previous.generation, generation
            );
        }
        registry.dirty.remove(&context);
        self.cache.increment_stat("fetches");
        self.listener.on_fetch_started(context);

        let guard = FetchGuard {
            context,
            generation,
            registry: self.registry.clone(),
            listener: self.listener.clone(),
        };
        let source = self.source.clone();
        let cache = self.cache.clone();
        let registry_handle = self.registry.clone();
        let listener = self.listener.clone();

        let fetch = async move {
            let _guard = guard;
            let result = source.fetch(context).await;

            let mut registry = registry_handle.lock();
            if registry.generation(context) != generation {
                drop(registry);
                cache.increment_stat("superseded");
                debug!("Discarding result of superseded fetch for {} (gen {})", context, generation);
                return FetchResult::Superseded;
            }
            registry.in_flight.remove(&context);

            // Listener calls happen under the registry lock so a reset
            // cannot slip between the generation check and the report.
            match result {
                Ok(value) => {
                    let payload: Payload = Arc::new(value);
                    let written_at = cache.put(context, payload.clone());
                    registry.last_error.remove(&context);
                    listener.on_fetch_succeeded(context, written_at);
                    drop(registry);
                    debug!("Fetched {} (gen {})", context, generation);
                    FetchResult::Fresh(payload, written_at)
                }
                Err(err) => {
                    registry.last_error.insert(context, err.clone());
                    let has_fallback = cache.get(context).is_some();
                    listener.on_fetch_failed(context, &err, has_fallback);
                    drop(registry);
                    cache.increment_stat("fetch_failures");
                    warn!("Fetch for {} failed: {} (fallback: {})", context, err, has_fallback);
                    FetchResult::Failed(err)
                }
            }
        }
        .boxed()
        .shared();

        registry.in_flight.insert(
            context,
            InFlight {
                generation,
                fetch: fetch.clone(),
            },
        );
        fetch
    }

    async fn await_fetch(
        &self,
        context: DomainContext,
        mut fetch: SharedFetch,
        epoch: u64,
    ) -> Result<SyncOutcome> {
        loop {
            match fetch.await {
                FetchResult::Fresh(data, written_at) => {
                    return Ok(SyncOutcome {
                        context,
                        data,
                        origin: DataOrigin::Network,
                        written_at,
                        error: None,
                    });
                }
                FetchResult::Failed(err) => return self.fallback(context, err),
                FetchResult::Superseded => {
                    let next = {
                        let registry = self.registry.lock();
                        if registry.epoch != epoch {
                            return Err(SyncError::Abandoned { context });
                        }
                        match registry.in_flight.get(&context) {
                            Some(in_flight) => Ok(in_flight.fetch.clone()),
                            None => Err(registry.last_error.get(&context).cloned()),
                        }
                    };
                    match next {
                        Ok(newer) => fetch = newer,
                        // The newest fetch already finished
                        Err(last_error) => return self.settled(context, last_error),
                    }
                }
            }
        }
    }

    fn fallback(&self, context: DomainContext, err: FetchError) -> Result<SyncOutcome> {
        match self.cache.get(context) {
            Some(entry) => {
                self.cache.increment_stat("stale_fallbacks");
                Ok(SyncOutcome {
                    context,
                    data: entry.data,
                    origin: DataOrigin::StaleFallback,
                    written_at: entry.last_written_at,
                    error: Some(err),
                })
            }
            None => Err(SyncError::NoData { context, source: err }),
        }
    }

    fn settled(&self, context: DomainContext, last_error: Option<FetchError>) -> Result<SyncOutcome> {
        match last_error {
            Some(err) => self.fallback(context, err),
            None => match self.cache.get(context) {
                Some(entry) => Ok(SyncOutcome {
                    context,
                    data: entry.data,
                    origin: DataOrigin::Network,
                    written_at: entry.last_written_at,
                    error: None,
                }),
                None => Err(SyncError::Abandoned { context }),
            },
        }
    }
}
