//! Two-tier expiring read cache.
//!
//! The router writes every successful GET body twice: into the short-lived
//! [`CacheTier::Primary`] tier, which absorbs repeated reads, and into the long-lived
//! [`CacheTier::Fallback`] tier, which only serves when every ranked endpoint is down.
//!
//! The storage technology is pluggable through [`TieredCache`]; [`MemoryTieredCache`] is the
//! in-process implementation.

pub mod memory;

pub use memory::MemoryTieredCache;

use crate::types::{chain_key, CacheTier};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store with two independent expiring tiers.
///
/// Entries are opaque strings. Each key is written atomically; there are no multi-key
/// operations.
#[async_trait]
pub trait TieredCache: Send + Sync {
    /// Returns the live value for `key` in `tier`, or `None` on a miss or expiry.
    async fn get(&self, key: &str, tier: CacheTier) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` in `tier`, replacing any previous entry.
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        tier: CacheTier,
    ) -> Result<(), CacheError>;
}

/// Cache key for a routed read of `path` on `chain`.
#[must_use]
pub fn cache_key(chain: &str, path: &str) -> String {
    format!("{}|{}", chain_key(chain), path)
}
