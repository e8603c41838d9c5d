//! # Chain State Accessor
//!
//! Typed reads of chain state on top of the [`RequestRouter`]. The accessor adds no retries of
//! its own: failover, caching and degradation all happen in the router, and every response shape
//! is decoded through the structs in [`responses`].
//!
//! | Operation | Class | Path |
//! |-----------|-------|------|
//! | [`get_account`](ChainStateAccessor::get_account) | REST | `/cosmos/auth/v1beta1/accounts/{address}` |
//! | [`get_height`](ChainStateAccessor::get_height) | REST | `/cosmos/base/tendermint/v1beta1/blocks/latest` |
//! | [`get_gas_price_hint`](ChainStateAccessor::get_gas_price_hint) | Web3 / REST | `eth_gasPrice` / `/evmos/feemarket/v1/params` |
//! | [`get_ibc_client_status`](ChainStateAccessor::get_ibc_client_status) | REST | `/ibc/core/client/v1/client_status/{client_id}` |

pub mod chain_id;
pub mod responses;

use crate::{
    config::{ChainProfile, GasPriceSource},
    errors::GatewayError,
    tx::{
        address::{validate_address, PrefixRule},
        Coin,
    },
    types::{chain_key, EndpointClass},
    upstream::{RequestRouter, RouterResponse},
};
use alloy_primitives::U256;
use bytes::Bytes;
use responses::{
    AccountResponse, ClientStatusResponse, FeeMarketParamsResponse, HeightResponse,
    JsonRpcQuantity,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::debug;

/// Gas limit for ordinary single-message transactions.
pub const DEFAULT_GAS_LIMIT: u64 = 350_000;
/// Gas limit for ICS-20 transfers.
pub const IBC_TRANSFER_GAS_LIMIT: u64 = 300_000;
/// Gas limit for ERC-20 / native coin conversions.
pub const CONVERT_GAS_LIMIT: u64 = 10_500_000;
/// Margin applied on top of `gas price × gas limit`, in percent.
pub const FEE_MARGIN_PERCENT: u64 = 115;

const ACCOUNT_ERROR: &str = "error while getting account details, please try again";
const HEIGHT_ERROR: &str = "error while getting height/revision";
const GAS_PRICE_ERROR: &str = "error while getting gas price";
const CLIENT_STATUS_ERROR: &str = "error while getting IBC client status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountNumbers {
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainHeight {
    pub height: u64,
    pub revision_number: u64,
}

/// Status of an IBC light client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IbcClientStatus {
    Active,
    Expired,
    Frozen,
    Unauthorized,
    Unknown(String),
}

impl IbcClientStatus {
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "Active" => Self::Active,
            "Expired" => Self::Expired,
            "Frozen" => Self::Frozen,
            "Unauthorized" => Self::Unauthorized,
            other => Self::Unknown(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        *self == Self::Active
    }
}

impl fmt::Display for IbcClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::Expired => f.write_str("Expired"),
            Self::Frozen => f.write_str("Frozen"),
            Self::Unauthorized => f.write_str("Unauthorized"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Typed chain state reads for every configured chain.
pub struct ChainStateAccessor {
    router: Arc<RequestRouter>,
    profiles: HashMap<String, ChainProfile>,
}

impl ChainStateAccessor {
    #[must_use]
    pub fn new(router: Arc<RequestRouter>, profiles: Vec<ChainProfile>) -> Self {
        let profiles = profiles.into_iter().map(|p| (p.key(), p)).collect();
        Self { router, profiles }
    }

    /// # Errors
    ///
    /// [`GatewayError::BadRequest`] for chains that are not configured.
    pub fn profile(&self, chain: &str) -> Result<&ChainProfile, GatewayError> {
        self.profiles
            .get(&chain_key(chain))
            .ok_or_else(|| GatewayError::BadRequest(format!("unknown chain: {chain}")))
    }

    /// Account number and sequence of `address`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::BadRequest`] if `address` is not a bech32 address of this chain
    /// - [`GatewayError::NotFound`] if the chain does not know the account
    /// - [`GatewayError::ChainState`] if the response carries no usable numbers
    /// - router errors
    pub async fn get_account(
        &self,
        address: &str,
        chain: &str,
    ) -> Result<AccountNumbers, GatewayError> {
        let profile = self.profile(chain)?;
        validate_address(address, PrefixRule::Exact(&profile.bech32_prefix))
            .map_err(|e| GatewayError::BadRequest(e.to_string()))?;

        let path = format!("/cosmos/auth/v1beta1/accounts/{address}");
        let response = self.router.get(chain, EndpointClass::Rest, &path).await?;
        if response.is_not_found() {
            return Err(GatewayError::NotFound(format!("account {address} not found")));
        }

        let account: AccountResponse = decode(&response, ACCOUNT_ERROR)?;
        let (number, sequence) = account.account.numbers().ok_or_else(|| {
            debug!(address = address, type_url = %account.account.type_url, "account without numbers");
            GatewayError::ChainState(ACCOUNT_ERROR.to_string())
        })?;

        let numbers = AccountNumbers {
            account_number: parse_u64(number, ACCOUNT_ERROR)?,
            sequence: parse_u64(sequence, ACCOUNT_ERROR)?,
        };
        debug!(chain = chain, address = address, sequence = numbers.sequence, "account loaded");
        Ok(numbers)
    }

    /// Latest block height and the chain's IBC revision number.
    ///
    /// The revision comes from the chain id in the response when the shape carries one, and from
    /// the configured chain id otherwise.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ChainState`] when the body is not a known height shape, plus router
    /// errors.
    pub async fn get_height(&self, chain: &str) -> Result<ChainHeight, GatewayError> {
        let profile = self.profile(chain)?;
        let response = self
            .router
            .get(chain, EndpointClass::Rest, "/cosmos/base/tendermint/v1beta1/blocks/latest")
            .await?;
        if response.is_not_found() {
            return Err(GatewayError::ChainState(HEIGHT_ERROR.to_string()));
        }

        let parsed: HeightResponse = decode(&response, HEIGHT_ERROR)?;
        let height = parse_u64(parsed.raw_height(), HEIGHT_ERROR)?;
        let reported = parsed.chain_id().unwrap_or(profile.chain_id.as_str());

        Ok(ChainHeight { height, revision_number: chain_id::revision_number(reported) })
    }

    /// Gas price suggestion in the smallest fee denomination, rounded up to an integer.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ChainState`] when the price cannot be read, plus router errors.
    pub async fn get_gas_price_hint(&self, chain: &str) -> Result<U256, GatewayError> {
        let profile = self.profile(chain)?;
        let price = match profile.gas_price_source {
            GasPriceSource::Web3 => {
                let request = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "eth_gasPrice",
                    "params": [],
                });
                let body = serde_json::to_vec(&request)
                    .map_err(|e| GatewayError::Internal(e.to_string()))?;
                let response =
                    self.router.post(chain, EndpointClass::Web3, "", Bytes::from(body)).await?;
                let quantity: JsonRpcQuantity = decode(&response, GAS_PRICE_ERROR)?;
                quantity
                    .result
                    .as_deref()
                    .and_then(parse_hex_quantity)
                    .ok_or_else(|| GatewayError::ChainState(GAS_PRICE_ERROR.to_string()))?
            }
            GasPriceSource::FeeMarket => {
                let response = self
                    .router
                    .get(chain, EndpointClass::Rest, "/evmos/feemarket/v1/params")
                    .await?;
                let params: FeeMarketParamsResponse = decode(&response, GAS_PRICE_ERROR)?;
                ceil_decimal(&params.params.min_gas_price)
                    .ok_or_else(|| GatewayError::ChainState(GAS_PRICE_ERROR.to_string()))?
            }
        };
        debug!(chain = chain, price = %price, "gas price hint");
        Ok(price)
    }

    /// Fee for `gas_limit` at the current gas price plus a 15% margin, in the chain's fee denom.
    ///
    /// # Errors
    ///
    /// See [`get_gas_price_hint`](Self::get_gas_price_hint); [`GatewayError::Internal`] on
    /// overflow.
    pub async fn estimate_fee(&self, chain: &str, gas_limit: u64) -> Result<Coin, GatewayError> {
        let profile = self.profile(chain)?;
        let price = self.get_gas_price_hint(chain).await?;
        let amount = fee_with_margin(price, gas_limit)
            .ok_or_else(|| GatewayError::Internal("fee overflows 256 bits".to_string()))?;
        Ok(Coin { denom: profile.fee_denom.clone(), amount: amount.to_string() })
    }

    /// # Errors
    ///
    /// [`GatewayError::BadRequest`] for a malformed client id, [`GatewayError::NotFound`] for
    /// an unknown client, plus router errors.
    pub async fn get_ibc_client_status(
        &self,
        chain: &str,
        client_id: &str,
    ) -> Result<IbcClientStatus, GatewayError> {
        self.profile(chain)?;
        let well_formed = !client_id.is_empty()
            && client_id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !well_formed {
            return Err(GatewayError::BadRequest(format!("invalid client id: {client_id}")));
        }

        let path = format!("/ibc/core/client/v1/client_status/{client_id}");
        let response = self.router.get(chain, EndpointClass::Rest, &path).await?;
        if response.is_not_found() {
            return Err(GatewayError::NotFound(format!("client {client_id} not found")));
        }
        let status: ClientStatusResponse = decode(&response, CLIENT_STATUS_ERROR)?;
        Ok(IbcClientStatus::parse(&status.status))
    }

    /// Fails unless the light client is `Active`, which is required before an IBC transfer.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ChainState`] naming the status, plus the errors of
    /// [`get_ibc_client_status`](Self::get_ibc_client_status).
    pub async fn ensure_ibc_client_active(
        &self,
        chain: &str,
        client_id: &str,
    ) -> Result<(), GatewayError> {
        match self.get_ibc_client_status(chain, client_id).await? {
            IbcClientStatus::Active => Ok(()),
            status => Err(GatewayError::ChainState(format!(
                "IBC client {client_id} on {chain} is {status}"
            ))),
        }
    }
}

fn decode<T: DeserializeOwned>(response: &RouterResponse, message: &str) -> Result<T, GatewayError> {
    serde_json::from_str(&response.body).map_err(|e| {
        debug!(error = %e, "unexpected response shape");
        GatewayError::ChainState(message.to_string())
    })
}

fn parse_u64(raw: &str, message: &str) -> Result<u64, GatewayError> {
    raw.parse().map_err(|_| GatewayError::ChainState(message.to_string()))
}

fn parse_hex_quantity(raw: &str) -> Option<U256> {
    let digits = raw.strip_prefix("0x").filter(|d| !d.is_empty())?;
    U256::from_str_radix(digits, 16).ok()
}

/// Rounds a non-negative decimal string such as `"20000000000.500000000000000000"` up to an
/// integer.
fn ceil_decimal(raw: &str) -> Option<U256> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !digits(fraction) {
        return None;
    }
    let whole = if whole.is_empty() { U256::ZERO } else { U256::from_str_radix(whole, 10).ok()? };
    if fraction.bytes().any(|b| b != b'0') {
        whole.checked_add(U256::from(1u8))
    } else {
        Some(whole)
    }
}

fn fee_with_margin(price: U256, gas_limit: u64) -> Option<U256> {
    price
        .checked_mul(U256::from(gas_limit))?
        .checked_mul(U256::from(FEE_MARGIN_PERCENT))
        .map(|total| total.div_ceil(U256::from(100u8)))
}
