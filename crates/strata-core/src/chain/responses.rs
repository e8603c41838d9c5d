//! Typed shapes of the upstream responses the gateway reads.
//!
//! Each shape is decoded once; a body that does not match is reported as a decode error by the
//! accessor instead of being probed field by field.

use serde::Deserialize;

/// `GET /cosmos/auth/v1beta1/accounts/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub account: AccountBody,
}

/// The `account` object. Depending on the account type, the numbers sit at the top level
/// (`BaseAccount`), under `base_account` (ethermint `EthAccount`) or under
/// `base_vesting_account.base_account` (vesting accounts).
#[derive(Debug, Clone, Deserialize)]
pub struct AccountBody {
    #[serde(rename = "@type", default)]
    pub type_url: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub base_account: Option<BaseAccount>,
    #[serde(default)]
    pub base_vesting_account: Option<BaseVestingAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseAccount {
    #[serde(default)]
    pub address: Option<String>,
    pub account_number: String,
    pub sequence: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseVestingAccount {
    pub base_account: BaseAccount,
}

impl AccountBody {
    /// Returns the raw `(account_number, sequence)` strings of whichever layout this account uses.
    #[must_use]
    pub fn numbers(&self) -> Option<(&str, &str)> {
        if let Some(vesting) = &self.base_vesting_account {
            return Some((&vesting.base_account.account_number, &vesting.base_account.sequence));
        }
        if let Some(base) = &self.base_account {
            return Some((&base.account_number, &base.sequence));
        }
        match (&self.account_number, &self.sequence) {
            (Some(number), Some(sequence)) => Some((number, sequence)),
            _ => None,
        }
    }
}

/// Any of the three height-bearing shapes the gateway understands.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HeightResponse {
    /// REST `GET /cosmos/base/tendermint/v1beta1/blocks/latest`.
    LatestBlock(LatestBlockResponse),
    /// Tendermint JSON-RPC `GET /status`.
    Status(StatusResponse),
    /// Flat `{"height": "..."}` used by lightweight proxies.
    Flat(FlatHeight),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestBlockResponse {
    pub block: Block,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub height: String,
    #[serde(default)]
    pub chain_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub result: StatusResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResult {
    pub sync_info: SyncInfo,
    #[serde(default)]
    pub node_info: Option<NodeInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncInfo {
    pub latest_block_height: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeInfo {
    pub network: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlatHeight {
    pub height: String,
    #[serde(default)]
    pub chain_id: Option<String>,
}

impl HeightResponse {
    #[must_use]
    pub fn raw_height(&self) -> &str {
        match self {
            Self::LatestBlock(r) => &r.block.header.height,
            Self::Status(r) => &r.result.sync_info.latest_block_height,
            Self::Flat(r) => &r.height,
        }
    }

    /// Chain id reported alongside the height, if the shape carries one.
    #[must_use]
    pub fn chain_id(&self) -> Option<&str> {
        let chain_id = match self {
            Self::LatestBlock(r) => r.block.header.chain_id.as_deref(),
            Self::Status(r) => r.result.node_info.as_ref().map(|n| n.network.as_str()),
            Self::Flat(r) => r.chain_id.as_deref(),
        };
        chain_id.filter(|id| !id.is_empty())
    }
}

/// Ethereum JSON-RPC reply carrying a hex quantity (`eth_gasPrice`, `eth_blockNumber`).
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcQuantity {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// `GET /evmos/feemarket/v1/params`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeMarketParamsResponse {
    pub params: FeeMarketParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeMarketParams {
    pub min_gas_price: String,
}

/// `GET /ibc/core/client/v1/client_status/{client_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientStatusResponse {
    pub status: String,
}
