//! Builder wiring configuration and injected handles into a [`Gateway`].

use super::Gateway;
use crate::{
    broadcast::BroadcastPipeline,
    cache::{MemoryTieredCache, TieredCache},
    chain::ChainStateAccessor,
    config::GatewayConfig,
    metrics,
    upstream::{
        EndpointDirectory, EndpointProber, EndpointPublisher, HttpClient, HttpClientConfig,
        MemoryDirectory, RequestRouter,
    },
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    #[error("No chains configured")]
    NoChains,

    #[error("Gateway initialization failed: {0}")]
    Initialization(String),
}

/// Builder for a [`Gateway`].
///
/// Anything not injected is created from the configuration: an in-memory directory seeded with
/// the configured candidates, an in-memory cache and a shared HTTP client.
///
/// # Examples
///
/// ```no_run
/// # use strata_core::{config::GatewayConfig, GatewayBuilder};
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = GatewayBuilder::new().with_config(GatewayConfig::load()?).build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct GatewayBuilder {
    config: Option<GatewayConfig>,
    directory: Option<(Arc<dyn EndpointDirectory>, Arc<dyn EndpointPublisher>)>,
    cache: Option<Arc<dyn TieredCache>>,
    http: Option<Arc<HttpClient>>,
}

impl GatewayBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses `directory` for both endpoint lookups and prober publication.
    #[must_use]
    pub fn with_directory<D>(mut self, directory: Arc<D>) -> Self
    where
        D: EndpointDirectory + EndpointPublisher + 'static,
    {
        let publisher: Arc<dyn EndpointPublisher> = directory.clone();
        self.directory = Some((directory, publisher));
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn TieredCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    ///
    /// Returns [`RuntimeError`] if the configuration is missing or invalid, lists no chains, or
    /// the HTTP client cannot be created.
    pub fn build(self) -> Result<Gateway, RuntimeError> {
        let config = self
            .config
            .ok_or_else(|| RuntimeError::ConfigValidation("No configuration provided".into()))?;
        if config.chains.is_empty() {
            return Err(RuntimeError::NoChains);
        }
        config.validate().map_err(RuntimeError::ConfigValidation)?;

        metrics::set_enabled(config.metrics.enabled);
        info!(
            chains = config.chains.len(),
            max_ranks = config.router.max_ranks,
            read_timeout_ms = config.router.read_timeout_ms,
            broadcast_timeout_ms = config.router.broadcast_timeout_ms,
            "Initializing gateway"
        );

        let http = match self.http {
            Some(http) => http,
            None => Arc::new(
                HttpClient::with_config(HttpClientConfig {
                    concurrent_limit: config.router.concurrent_limit,
                    ..HttpClientConfig::default()
                })
                .map_err(|e| RuntimeError::Initialization(format!("HTTP client: {e}")))?,
            ),
        };

        let (directory, publisher) = self.directory.unwrap_or_else(|| {
            let directory = Arc::new(MemoryDirectory::from_config(&config));
            debug!("Endpoint directory seeded from configuration");
            let publisher: Arc<dyn EndpointPublisher> = directory.clone();
            (directory, publisher)
        });
        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(MemoryTieredCache::with_purge_every(config.cache.purge_every_writes))
        });

        let router = Arc::new(RequestRouter::new(
            directory,
            cache,
            http.clone(),
            config.router.clone(),
            config.cache.clone(),
        ));
        let accessor = Arc::new(ChainStateAccessor::new(router.clone(), config.chains.clone()));
        let pipeline = Arc::new(BroadcastPipeline::new(router.clone(), &config.chains));
        let prober = Arc::new(EndpointProber::new(http, publisher, config.prober.clone()));
        debug!("Gateway components initialized");

        Ok(Gateway { config, router, accessor, pipeline, prober })
    }
}
