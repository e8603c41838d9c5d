//! Gateway configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: `set_default` calls in [`GatewayConfig::from_file`]
//! 2. **Config file**: TOML file specified by the `STRATA_CONFIG` env var
//! 3. **Environment variables**: `STRATA__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`RouterConfig`]: ranked endpoint count, read and broadcast timeouts, concurrency
//! - [`CacheConfig`]: primary and fallback tier TTLs
//! - [`ProberConfig`]: probe timeout, published top-K, probe concurrency
//! - [`ChainProfile`]: per-chain identity, fee denom and candidate endpoints
//! - [`LoggingConfig`]: log level and format
//! - [`MetricsConfig`]: metrics recording switch
//!
//! # Example
//!
//! ```toml
//! [router]
//! max_ranks = 3
//! read_timeout_ms = 2000
//! broadcast_timeout_ms = 6000
//!
//! [[chains]]
//! name = "EVMOS"
//! chain_id = "evmos_9001-2"
//! bech32_prefix = "evmos"
//! fee_denom = "aevmos"
//!
//! [chains.candidates]
//! rest = ["https://rest.evmos.example.com"]
//! jrpc = ["https://rpc.evmos.example.com"]
//! web3 = ["https://evm.evmos.example.com"]
//! ```

use crate::types::{chain_key, EndpointClass};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, time::Duration};

/// Request router settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Number of ranked endpoints tried per call. Defaults to `3`.
    #[serde(default = "default_max_ranks")]
    pub max_ranks: usize,

    /// Per-endpoint timeout for reads and simulation, in milliseconds. Defaults to `2000`.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Per-endpoint timeout for broadcast submission, in milliseconds. Defaults to `6000`.
    #[serde(default = "default_broadcast_timeout_ms")]
    pub broadcast_timeout_ms: u64,

    /// Maximum concurrent upstream requests across all chains. Defaults to `512`.
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_limit: usize,
}

fn default_max_ranks() -> usize {
    3
}

fn default_read_timeout_ms() -> u64 {
    2000
}

fn default_broadcast_timeout_ms() -> u64 {
    6000
}

fn default_concurrent_limit() -> usize {
    512
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_ranks: default_max_ranks(),
            read_timeout_ms: default_read_timeout_ms(),
            broadcast_timeout_ms: default_broadcast_timeout_ms(),
            concurrent_limit: default_concurrent_limit(),
        }
    }
}

impl RouterConfig {
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    #[must_use]
    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_ms)
    }
}

/// Tiered read cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Primary tier TTL in seconds. Defaults to `7`.
    #[serde(default = "default_primary_ttl_seconds")]
    pub primary_ttl_seconds: u64,

    /// Fallback tier TTL in seconds. Must exceed the primary TTL. Defaults to `420`.
    #[serde(default = "default_fallback_ttl_seconds")]
    pub fallback_ttl_seconds: u64,

    /// Expired entries are swept from the in-memory cache once every this many writes.
    /// Defaults to `1024`.
    #[serde(default = "default_purge_every_writes")]
    pub purge_every_writes: usize,
}

fn default_primary_ttl_seconds() -> u64 {
    7
}

fn default_fallback_ttl_seconds() -> u64 {
    420
}

fn default_purge_every_writes() -> usize {
    1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            primary_ttl_seconds: default_primary_ttl_seconds(),
            fallback_ttl_seconds: default_fallback_ttl_seconds(),
            purge_every_writes: default_purge_every_writes(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn primary_ttl(&self) -> Duration {
        Duration::from_secs(self.primary_ttl_seconds)
    }

    #[must_use]
    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl_seconds)
    }
}

/// Endpoint prober settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProberConfig {
    /// Per-probe timeout in milliseconds. Defaults to `2000`.
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,

    /// Number of best endpoints published per chain and class. Defaults to `3`.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Probes in flight at once per class. Defaults to `16`.
    #[serde(default = "default_probe_concurrency")]
    pub concurrency: usize,
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

fn default_top_k() -> usize {
    3
}

fn default_probe_concurrency() -> usize {
    16
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            top_k: default_top_k(),
            concurrency: default_probe_concurrency(),
        }
    }
}

impl ProberConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Where the gas price hint for a chain comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasPriceSource {
    /// `eth_gasPrice` over the chain's Web3 endpoints.
    #[default]
    Web3,
    /// `min_gas_price` from the fee market module params over REST.
    FeeMarket,
}

/// Candidate base URLs per endpoint class, fed to the prober and used to seed the directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointCandidates {
    #[serde(default)]
    pub rest: Vec<String>,
    #[serde(default)]
    pub jrpc: Vec<String>,
    #[serde(default)]
    pub web3: Vec<String>,
}

impl EndpointCandidates {
    #[must_use]
    pub fn for_class(&self, class: EndpointClass) -> &[String] {
        match class {
            EndpointClass::Rest => &self.rest,
            EndpointClass::Jrpc => &self.jrpc,
            EndpointClass::Web3 => &self.web3,
        }
    }
}

/// Static description of one chain served by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainProfile {
    /// Gateway-facing chain name (e.g. `EVMOS`). Case-insensitive.
    pub name: String,

    /// Cosmos chain id (e.g. `evmos_9001-2`).
    pub chain_id: String,

    /// Bech32 human-readable prefix of account addresses (e.g. `evmos`).
    pub bech32_prefix: String,

    /// Denomination fees are paid in (e.g. `aevmos`).
    pub fee_denom: String,

    /// Whether broadcasts are simulated first. Defaults to `true`.
    #[serde(default = "default_supports_simulation")]
    pub supports_simulation: bool,

    #[serde(default)]
    pub gas_price_source: GasPriceSource,

    #[serde(default)]
    pub candidates: EndpointCandidates,
}

fn default_supports_simulation() -> bool {
    true
}

impl ChainProfile {
    /// Chain name as used in directory and cache keys.
    #[must_use]
    pub fn key(&self) -> String {
        chain_key(&self.name)
    }
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether counters and histograms are recorded. Defaults to `true`.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub prober: ProberConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub chains: Vec<ChainProfile>,
}

impl GatewayConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Environment variables with the `STRATA__` prefix can override any configuration value.
    /// Use `__` as a separator for nested fields (e.g., `STRATA__ROUTER__MAX_RANKS=5`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("router.max_ranks", 3)?
            .set_default("router.read_timeout_ms", 2000)?
            .set_default("router.broadcast_timeout_ms", 6000)?
            .set_default("router.concurrent_limit", 512)?
            .set_default("cache.primary_ttl_seconds", 7)?
            .set_default("cache.fallback_ttl_seconds", 420)?
            .set_default("cache.purge_every_writes", 1024)?
            .set_default("prober.timeout_ms", 2000)?
            .set_default("prober.top_k", 3)?
            .set_default("prober.concurrency", 16)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("metrics.enabled", true)?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("STRATA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml`.
    ///
    /// The config file path can be overridden using the `STRATA_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("STRATA_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.chains.is_empty() {
            return Err("No chains configured".to_string());
        }

        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.key()) {
                return Err(format!("Duplicate chain name: {}", chain.name));
            }
            if chain.chain_id.is_empty() {
                return Err(format!("Empty chain id for chain: {}", chain.name));
            }
            if chain.bech32_prefix.is_empty() {
                return Err(format!("Empty bech32 prefix for chain: {}", chain.name));
            }
            if chain.fee_denom.is_empty() {
                return Err(format!("Empty fee denom for chain: {}", chain.name));
            }
            for class in EndpointClass::ALL {
                for candidate in chain.candidates.for_class(class) {
                    if url::Url::parse(candidate).is_err() || !candidate.starts_with("http") {
                        return Err(format!(
                            "Invalid {class} endpoint for chain {}: {candidate}",
                            chain.name
                        ));
                    }
                }
            }
        }

        if self.router.max_ranks == 0 {
            return Err("Router max ranks must be greater than 0".to_string());
        }

        if self.router.read_timeout_ms == 0 || self.router.broadcast_timeout_ms == 0 {
            return Err("Router timeouts must be greater than 0".to_string());
        }

        if self.router.concurrent_limit == 0 {
            return Err("Router concurrent limit must be greater than 0".to_string());
        }

        if self.cache.primary_ttl_seconds == 0 {
            return Err("Primary cache TTL must be greater than 0".to_string());
        }

        if self.cache.fallback_ttl_seconds <= self.cache.primary_ttl_seconds {
            return Err("Fallback cache TTL must exceed the primary TTL".to_string());
        }

        if self.cache.purge_every_writes == 0 {
            return Err("Cache purge interval must be greater than 0".to_string());
        }

        if self.prober.top_k == 0 {
            return Err("Prober top_k must be greater than 0".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }

    /// Looks up a chain profile by case-insensitive name.
    #[must_use]
    pub fn chain(&self, name: &str) -> Option<&ChainProfile> {
        let key = chain_key(name);
        self.chains.iter().find(|c| c.key() == key)
    }
}
