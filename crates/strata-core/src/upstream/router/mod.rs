//! # Request Router
//!
//! Executes one logical upstream call against the ranked endpoints of a chain and class.
//!
//! ```text
//! call(chain, class, path, body?)
//!   │
//!   ├─ GET: primary tier hit? ──────────────────────────► cached body
//!   │
//!   ├─ rank 1 ─ fault ─► rank 2 ─ fault ─► ... rank N
//!   │     │                 │
//!   │     └── 200 ──────────┴──► GET: write primary + fallback ──► body
//!   │         404 (chain)   ───► not-found result, no further ranks
//!   │         400           ───► BadRequest, no further ranks
//!   │         500 broadcast ───► SequenceMismatch, no further ranks
//!   │
//!   └─ exhausted
//!         GET:  primary tier ─► fallback tier ─► AllEndpointsDown
//!         POST: AllEndpointsDown
//! ```
//!
//! Endpoint faults never leave this module: they are logged, counted and skipped.

mod classify;

pub use classify::{bad_request_message, is_routing_mismatch};

use crate::{
    cache::{cache_key, TieredCache},
    config::{CacheConfig, RouterConfig},
    errors::GatewayError,
    metrics,
    types::{chain_key, CacheTier, EndpointClass, EndpointRecord},
    upstream::{EndpointDirectory, HttpClient, UpstreamError},
};
use bytes::Bytes;
use classify::{classify_reply, AttemptOutcome};
use std::{sync::Arc, time::Instant};
use tracing::{debug, error, warn};

/// Body handed back for a chain-side 404.
pub const NOT_FOUND_BODY: &str = r#"{"error":"Element not found"}"#;

/// Which per-endpoint timeout a call runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutBudget {
    /// Reads and simulation.
    Read,
    /// Transaction submission, which waits on consensus-layer admission.
    Broadcast,
}

/// Where a [`RouterResponse`] body came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Live answer from the endpoint at `rank`.
    Endpoint { rank: usize },
    PrimaryCache,
    /// Stale copy served because every endpoint failed.
    FallbackCache,
    /// The chain reported the resource as absent.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterResponse {
    pub body: String,
    pub source: ResponseSource,
}

impl RouterResponse {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.source == ResponseSource::NotFound
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.source == ResponseSource::FallbackCache
    }
}

/// Rank-ordered, cache-aware upstream caller.
///
/// Holds no per-request state; a single instance serves all chains and callers concurrently.
pub struct RequestRouter {
    directory: Arc<dyn EndpointDirectory>,
    cache: Arc<dyn TieredCache>,
    http: Arc<HttpClient>,
    config: RouterConfig,
    cache_config: CacheConfig,
}

impl RequestRouter {
    #[must_use]
    pub fn new(
        directory: Arc<dyn EndpointDirectory>,
        cache: Arc<dyn TieredCache>,
        http: Arc<HttpClient>,
        config: RouterConfig,
        cache_config: CacheConfig,
    ) -> Self {
        Self { directory, cache, http, config, cache_config }
    }

    /// Current ranking of `(chain, class)` as the router will walk it.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Internal`] when the directory cannot be read.
    pub async fn endpoints(
        &self,
        chain: &str,
        class: EndpointClass,
    ) -> Result<Vec<EndpointRecord>, GatewayError> {
        self.directory
            .records(chain, class)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))
    }

    /// Issues a GET when `body` is `None` and a POST otherwise, under the read timeout.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::AllEndpointsDown`] when every endpoint failed and, for GET, no cache
    ///   tier holds a copy
    /// - [`GatewayError::BadRequest`] when an endpoint answered 400
    pub async fn call(
        &self,
        chain: &str,
        class: EndpointClass,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<RouterResponse, GatewayError> {
        self.execute(chain, class, path, body, TimeoutBudget::Read).await
    }

    /// Cached GET under the read timeout.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn get(
        &self,
        chain: &str,
        class: EndpointClass,
        path: &str,
    ) -> Result<RouterResponse, GatewayError> {
        self.execute(chain, class, path, None, TimeoutBudget::Read).await
    }

    /// Uncached POST under the read timeout (simulation, JSON-RPC queries).
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn post(
        &self,
        chain: &str,
        class: EndpointClass,
        path: &str,
        body: Bytes,
    ) -> Result<RouterResponse, GatewayError> {
        self.execute(chain, class, path, Some(body), TimeoutBudget::Read).await
    }

    /// POST of a signed transaction under the broadcast timeout.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call); additionally [`GatewayError::SequenceMismatch`] when an
    /// endpoint answered 500.
    pub async fn broadcast(
        &self,
        chain: &str,
        class: EndpointClass,
        path: &str,
        body: Bytes,
    ) -> Result<RouterResponse, GatewayError> {
        self.execute(chain, class, path, Some(body), TimeoutBudget::Broadcast).await
    }

    async fn execute(
        &self,
        chain: &str,
        class: EndpointClass,
        path: &str,
        body: Option<Bytes>,
        budget: TimeoutBudget,
    ) -> Result<RouterResponse, GatewayError> {
        let chain = chain_key(chain);
        let key = cache_key(&chain, path);
        let is_read = body.is_none();

        if is_read {
            if let Some(cached) = self.cache_lookup(&key, CacheTier::Primary).await {
                debug!(chain = %chain, path = path, "primary cache hit");
                return Ok(RouterResponse { body: cached, source: ResponseSource::PrimaryCache });
            }
        }

        let endpoints = match self.directory.list_endpoints(&chain, class).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                warn!(chain = %chain, class = %class, error = %e, "endpoint directory unavailable");
                Vec::new()
            }
        };

        let timeout = match budget {
            TimeoutBudget::Read => self.config.read_timeout(),
            TimeoutBudget::Broadcast => self.config.broadcast_timeout(),
        };

        for (index, base_url) in endpoints.iter().take(self.config.max_ranks).enumerate() {
            let rank = index + 1;
            let url = match join_url(base_url, path) {
                Ok(url) => url,
                Err(e) => {
                    warn!(chain = %chain, rank = rank, error = %e, "skipping malformed endpoint");
                    continue;
                }
            };

            let started = Instant::now();
            let reply = match &body {
                None => self.http.get(&url, timeout).await,
                Some(payload) => self.http.post_json(&url, payload.clone(), timeout).await,
            };
            let elapsed = started.elapsed();

            let outcome = match reply {
                Ok(reply) => classify_reply(reply, budget),
                Err(e) => AttemptOutcome::Fault(e),
            };

            match outcome {
                AttemptOutcome::Success(text) => {
                    metrics::record_endpoint_attempt(&chain, class, "success", elapsed);
                    debug!(chain = %chain, class = %class, rank = rank, path = path, "endpoint succeeded");
                    if is_read {
                        self.store(&key, &text).await;
                    }
                    return Ok(RouterResponse { body: text, source: ResponseSource::Endpoint { rank } });
                }
                AttemptOutcome::NotFound => {
                    metrics::record_endpoint_attempt(&chain, class, "not_found", elapsed);
                    debug!(chain = %chain, rank = rank, path = path, "resource not found on chain");
                    return Ok(RouterResponse {
                        body: NOT_FOUND_BODY.to_string(),
                        source: ResponseSource::NotFound,
                    });
                }
                AttemptOutcome::BadRequest(message) => {
                    metrics::record_endpoint_attempt(&chain, class, "bad_request", elapsed);
                    debug!(chain = %chain, rank = rank, path = path, message = %message, "bad request");
                    return Err(GatewayError::BadRequest(message));
                }
                AttemptOutcome::BroadcastServerError => {
                    metrics::record_endpoint_attempt(&chain, class, "server_error", elapsed);
                    warn!(chain = %chain, rank = rank, path = path, "broadcast endpoint returned 500");
                    return Err(GatewayError::SequenceMismatch);
                }
                AttemptOutcome::Fault(e) => {
                    metrics::record_endpoint_attempt(&chain, class, e.as_str(), elapsed);
                    self.log_fault(&chain, class, rank, path, &e);
                }
            }
        }

        if is_read {
            if let Some(cached) = self.cache_lookup(&key, CacheTier::Primary).await {
                return Ok(RouterResponse { body: cached, source: ResponseSource::PrimaryCache });
            }
            if let Some(stale) = self.cache_lookup(&key, CacheTier::Fallback).await {
                warn!(chain = %chain, class = %class, path = path, "serving fallback cache");
                return Ok(RouterResponse { body: stale, source: ResponseSource::FallbackCache });
            }
        }

        metrics::record_all_endpoints_down(&chain, class);
        error!(
            chain = %chain,
            class = %class,
            path = path,
            endpoints = endpoints.len(),
            "all endpoints down"
        );
        Err(GatewayError::AllEndpointsDown { chain, path: path.to_string() })
    }

    async fn cache_lookup(&self, key: &str, tier: CacheTier) -> Option<String> {
        match self.cache.get(key, tier).await {
            Ok(value) => {
                metrics::record_cache_lookup(tier, value.is_some());
                value
            }
            Err(e) => {
                warn!(key = key, tier = tier.as_str(), error = %e, "cache read failed");
                None
            }
        }
    }

    async fn store(&self, key: &str, body: &str) {
        let writes = [
            (CacheTier::Primary, self.cache_config.primary_ttl()),
            (CacheTier::Fallback, self.cache_config.fallback_ttl()),
        ];
        for (tier, ttl) in writes {
            if let Err(e) = self.cache.set(key, body, ttl, tier).await {
                warn!(key = key, tier = tier.as_str(), error = %e, "cache write failed");
            }
        }
    }

    fn log_fault(
        &self,
        chain: &str,
        class: EndpointClass,
        rank: usize,
        path: &str,
        error: &UpstreamError,
    ) {
        if error.is_transient() {
            warn!(chain = chain, class = %class, rank = rank, path = path, error = %error, "endpoint failed");
        } else {
            debug!(chain = chain, class = %class, rank = rank, path = path, error = %error, "endpoint does not serve path");
        }
    }
}

/// Appends `path` to an endpoint base URL. An empty path addresses the base URL itself (JSON-RPC
/// roots).
fn join_url(base_url: &str, path: &str) -> Result<String, UpstreamError> {
    let base = base_url.trim_end_matches('/');
    let joined = if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    };
    url::Url::parse(&joined).map_err(|e| UpstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
    Ok(joined)
}
