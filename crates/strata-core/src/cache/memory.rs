use super::{CacheError, TieredCache};
use crate::types::CacheTier;
use async_trait::async_trait;
use dashmap::DashMap;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::Instant;
use tracing::debug;

const DEFAULT_PURGE_EVERY: usize = 1024;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<str>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process [`TieredCache`] backed by a sharded concurrent map.
///
/// Expired entries are dropped lazily on read, and in bulk by [`purge_expired`], which runs
/// on every `purge_every`-th write. Keys that are written once and never read again are
/// therefore reclaimed too.
///
/// [`purge_expired`]: MemoryTieredCache::purge_expired
#[derive(Debug)]
pub struct MemoryTieredCache {
    entries: DashMap<(CacheTier, String), CacheEntry>,
    writes: AtomicUsize,
    purge_every: usize,
}

impl Default for MemoryTieredCache {
    fn default() -> Self {
        Self::with_purge_every(DEFAULT_PURGE_EVERY)
    }
}

impl MemoryTieredCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `purge_every` is clamped to at least one write.
    #[must_use]
    pub fn with_purge_every(purge_every: usize) -> Self {
        Self { entries: DashMap::new(), writes: AtomicUsize::new(0), purge_every: purge_every.max(1) }
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Number of stored entries across both tiers, live or not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TieredCache for MemoryTieredCache {
    async fn get(&self, key: &str, tier: CacheTier) -> Result<Option<String>, CacheError> {
        let map_key = (tier, key.to_string());
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&map_key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.to_string()));
            }
        } else {
            return Ok(None);
        }

        self.entries.remove_if(&map_key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        tier: CacheTier,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry { value: Arc::from(value), expires_at: Instant::now() + ttl };
        self.entries.insert((tier, key.to_string()), entry);

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % self.purge_every == 0 {
            let dropped = self.purge_expired();
            if dropped > 0 {
                debug!(dropped, remaining = self.entries.len(), "purged expired cache entries");
            }
        }
        Ok(())
    }
}
