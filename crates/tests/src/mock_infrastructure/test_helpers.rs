//! Helpers wiring gateway components against mock endpoints.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{sync::Arc, time::Duration};
use strata_core::{
    cache::MemoryTieredCache,
    config::{
        CacheConfig, ChainProfile, EndpointCandidates, GasPriceSource, GatewayConfig, RouterConfig,
    },
    types::EndpointClass,
    upstream::{HttpClient, MemoryDirectory, RequestRouter},
};

pub const EVMOS: &str = "EVMOS";
pub const EVMOS_CHAIN_ID: &str = "evmos_9001-2";
pub const SENDER: &str = "evmos14uepnqnvkuyyvwe65wmncejq5g2f0tjft3wr65";
pub const RECEIVER: &str = "evmos1c7kfknyuamrkvgddg90g5tw2ncxy5g4wqlyxu6";
pub const VALIDATOR: &str = "evmosvaloper14uepnqnvkuyyvwe65wmncejq5g2f0tjfxlpnmf";
pub const COSMOSHUB: &str = "COSMOSHUB";
pub const COSMOS_SENDER: &str = "cosmos14uepnqnvkuyyvwe65wmncejq5g2f0tjffsldqu";
pub const COSMOS_RECEIVER: &str = "cosmos1c7kfknyuamrkvgddg90g5tw2ncxy5g4wz74gxj";
pub const PUB_KEY_B64: &str = "Ak8wUTcElcOofCZZJM97pduO+Aw3w4wzClrJgN2VzTVQ";

/// Per-endpoint read timeout used by the router in tests.
pub const TEST_READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Delay comfortably past [`TEST_READ_TIMEOUT`].
pub const SLOW_RESPONSE: Duration = Duration::from_millis(1500);

#[must_use]
pub fn pub_key() -> Vec<u8> {
    STANDARD.decode(PUB_KEY_B64).unwrap_or_default()
}

/// Router settings with short timeouts.
#[must_use]
pub fn test_router_config() -> RouterConfig {
    RouterConfig {
        max_ranks: 3,
        read_timeout_ms: TEST_READ_TIMEOUT.as_millis() as u64,
        broadcast_timeout_ms: 1000,
        ..RouterConfig::default()
    }
}

/// EVMOS profile whose REST and Web3 candidates are `rest` and `web3`.
#[must_use]
pub fn evmos_profile(rest: Vec<String>, web3: Vec<String>) -> ChainProfile {
    ChainProfile {
        name: EVMOS.to_string(),
        chain_id: EVMOS_CHAIN_ID.to_string(),
        bech32_prefix: "evmos".to_string(),
        fee_denom: "aevmos".to_string(),
        supports_simulation: true,
        gas_price_source: GasPriceSource::Web3,
        candidates: EndpointCandidates { rest, jrpc: Vec::new(), web3 },
    }
}

/// Cosmos Hub profile reading gas prices from the REST feemarket params.
#[must_use]
pub fn cosmoshub_profile(rest: Vec<String>) -> ChainProfile {
    ChainProfile {
        name: COSMOSHUB.to_string(),
        chain_id: "cosmoshub-4".to_string(),
        bech32_prefix: "cosmos".to_string(),
        fee_denom: "uatom".to_string(),
        supports_simulation: true,
        gas_price_source: GasPriceSource::FeeMarket,
        candidates: EndpointCandidates { rest, jrpc: Vec::new(), web3: Vec::new() },
    }
}

/// Gateway configuration serving only `profile`, with test timeouts.
#[must_use]
pub fn test_config(profile: ChainProfile) -> GatewayConfig {
    GatewayConfig {
        router: test_router_config(),
        chains: vec![profile],
        ..GatewayConfig::default()
    }
}

/// Router components exposed so tests can inspect the directory and both cache tiers.
pub struct TestRouter {
    pub router: Arc<RequestRouter>,
    pub directory: Arc<MemoryDirectory>,
    pub cache: Arc<MemoryTieredCache>,
}

/// Builds a router whose `(chain, class)` ranking is `urls`, in order.
#[must_use]
pub fn router_with_endpoints(chain: &str, class: EndpointClass, urls: Vec<String>) -> TestRouter {
    let directory = Arc::new(MemoryDirectory::new());
    directory.replace(chain, class, urls);
    let cache = Arc::new(MemoryTieredCache::new());
    let http = Arc::new(HttpClient::new().unwrap_or_else(|e| panic!("http client: {e}")));
    let router = Arc::new(RequestRouter::new(
        directory.clone(),
        cache.clone(),
        http,
        test_router_config(),
        CacheConfig::default(),
    ));
    TestRouter { router, directory, cache }
}
