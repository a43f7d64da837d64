//! Per-context data cache with a global TTL
//!
//! Entries are never evicted by age: an expired entry is still the stale
//! fallback when a refresh fails. Validity is a pure function of the entry's
//! write time, the TTL and the current time.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use carelink_core::{Clock, DomainContext};

use crate::source::Payload;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live applied to every context
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
        }
    }
}

/// Last successfully fetched payload of one context
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Payload,
    pub last_written_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Valid iff `now - last_written_at < ttl`
    pub fn is_valid(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let elapsed_ms = now.signed_duration_since(self.last_written_at).num_milliseconds();
        i128::from(elapsed_ms) < ttl.as_millis() as i128
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub stale_fallbacks: usize,
    pub fetches: usize,
    pub fetch_failures: usize,
    pub coalesced: usize,
    pub superseded: usize,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Context cache
///
/// Holds at most one entry per [`DomainContext`]; `put` replaces the whole
/// entry.
pub struct ContextCache {
    entries: Arc<DashMap<DomainContext, CacheEntry>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    stats: Arc<DashMap<&'static str, usize>>,
}

impl ContextCache {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
            clock,
            stats: Arc::new(DashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Entry for `context`, valid or not
    pub fn get(&self, context: DomainContext) -> Option<CacheEntry> {
        self.entries.get(&context).map(|entry| entry.clone())
    }

    /// Replace the entry for `context`, stamped with the current time
    pub fn put(&self, context: DomainContext, data: Payload) -> DateTime<Utc> {
        let written_at = self.clock.now_utc();
        self.entries.insert(
            context,
            CacheEntry {
                data,
                last_written_at: written_at,
            },
        );
        written_at
    }

    /// Whether `context` has an entry that is valid at `now` under `ttl`
    pub fn is_valid(&self, context: DomainContext, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.entries
            .get(&context)
            .map(|entry| entry.is_valid(ttl, now))
            .unwrap_or(false)
    }

    /// Whether `context` is valid under the configured TTL right now
    pub fn is_fresh(&self, context: DomainContext) -> bool {
        self.is_valid(context, self.config.ttl, self.clock.now_utc())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    pub fn remove(&self, context: DomainContext) -> Option<CacheEntry> {
        self.entries.remove(&context).map(|(_, entry)| entry)
    }

    /// Drop every entry; statistics are kept
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            stale_fallbacks: self.get_stat("stale_fallbacks"),
            fetches: self.get_stat("fetches"),
            fetch_failures: self.get_stat("fetch_failures"),
            coalesced: self.get_stat("coalesced"),
            superseded: self.get_stat("superseded"),
            entries: self.entries.len(),
        }
    }

    pub(crate) fn increment_stat(&self, stat: &'static str) {
        *self.stats.entry(stat).or_insert(0) += 1;
    }

    fn get_stat(&self, stat: &'static str) -> usize {
        self.stats.get(stat).map(|v| *v).unwrap_or(0)
    }
}
