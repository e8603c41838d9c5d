//! Core type definitions shared by the directory, cache and router.
//!
//! - [`EndpointClass`]: the three upstream API surfaces a Cosmos SDK node exposes
//! - [`EndpointRecord`]: one ranked base URL for a chain and class
//! - [`CacheTier`]: primary (short-lived) or fallback (long-lived) cache tier
//! - [`chain_key`]: canonical spelling of a chain name for keys and labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream API surface of a chain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointClass {
    /// Cosmos SDK REST (gRPC-gateway) API.
    Rest,
    /// Tendermint / CometBFT JSON-RPC API.
    Jrpc,
    /// Ethereum JSON-RPC API of EVM-enabled chains.
    Web3,
}

impl EndpointClass {
    pub const ALL: [EndpointClass; 3] = [Self::Rest, Self::Jrpc, Self::Web3];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Jrpc => "jrpc",
            Self::Web3 => "web3",
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EndpointClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "jrpc" | "rpc" => Ok(Self::Jrpc),
            "web3" | "evm" => Ok(Self::Web3),
            other => Err(format!("unknown endpoint class: {other}")),
        }
    }
}

/// A ranked upstream base URL for one chain and endpoint class.
///
/// Rank 1 is preferred. The directory guarantees at most one record per
/// `(chain, class, rank)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub chain: String,
    pub class: EndpointClass,
    pub rank: usize,
    pub base_url: String,
}

/// Cache tier addressed by [`TieredCache`](crate::cache::TieredCache) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    Primary,
    Fallback,
}

impl CacheTier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// Canonical chain identifier used for directory keys, cache keys and metric labels.
///
/// Chain names are case-insensitive at the API boundary (`evmos`, `Evmos` and `EVMOS` all name
/// the same chain).
#[must_use]
pub fn chain_key(chain: &str) -> String {
    chain.trim().to_ascii_uppercase()
}
