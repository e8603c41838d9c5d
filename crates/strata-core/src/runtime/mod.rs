//! # Gateway Runtime
//!
//! [`Gateway`] bundles the router, accessor, broadcast pipeline and prober behind shared handles.
//! It is what an HTTP layer or the CLI holds; build one with [`GatewayBuilder`].

mod builder;

pub use builder::{GatewayBuilder, RuntimeError};

use crate::{
    broadcast::BroadcastPipeline,
    chain::{ChainStateAccessor, CONVERT_GAS_LIMIT, DEFAULT_GAS_LIMIT, IBC_TRANSFER_GAS_LIMIT},
    config::{ChainProfile, GatewayConfig},
    errors::GatewayError,
    tx::{
        address::derive_address, assemble, AssembledTransaction, CosmosMsg, Fee,
        LogicalTransaction, PubKeyType, Signer,
    },
    types::EndpointClass,
    upstream::{EndpointProber, ProbeReport, RequestRouter},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};

/// Everything needed to prepare a transaction for signing; account state and fees are looked
/// up on chain.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRequest {
    pub chain: String,
    /// Bech32 address of the signing account; derived from `pub_key` when absent.
    #[serde(default)]
    pub sender: Option<String>,
    /// 33-byte compressed public key, base64 in JSON.
    #[serde(deserialize_with = "from_base64")]
    pub pub_key: Vec<u8>,
    /// Derived from the chain id when absent, see [`PubKeyType::for_chain_id`].
    #[serde(default)]
    pub key_type: Option<PubKeyType>,
    pub messages: Vec<CosmosMsg>,
    #[serde(default)]
    pub memo: String,
    /// Overrides the default gas limit for the message kinds.
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

pub struct Gateway {
    config: GatewayConfig,
    router: Arc<RequestRouter>,
    accessor: Arc<ChainStateAccessor>,
    pipeline: Arc<BroadcastPipeline>,
    prober: Arc<EndpointProber>,
}

impl Gateway {
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn router(&self) -> &Arc<RequestRouter> {
        &self.router
    }

    #[must_use]
    pub fn accessor(&self) -> &Arc<ChainStateAccessor> {
        &self.accessor
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<BroadcastPipeline> {
        &self.pipeline
    }

    #[must_use]
    pub fn prober(&self) -> &Arc<EndpointProber> {
        &self.prober
    }

    /// Fetches the sender's account numbers and a fee estimate, then assembles every sign
    /// encoding.
    ///
    /// # Errors
    ///
    /// Accessor errors, or [`GatewayError::Assembly`] when the transaction is invalid.
    pub async fn prepare_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<AssembledTransaction, GatewayError> {
        let profile = self.accessor.profile(&request.chain)?;
        let chain_id = profile.chain_id.clone();
        let key_type = request.key_type.unwrap_or_else(|| PubKeyType::for_chain_id(&chain_id));

        let sender = match request.sender {
            Some(sender) => sender,
            None => derive_address(&request.pub_key, key_type, &profile.bech32_prefix)?,
        };

        let account = self.accessor.get_account(&sender, &request.chain).await?;
        let gas_limit = request.gas_limit.unwrap_or_else(|| default_gas_limit(&request.messages));
        let fee_amount = self.accessor.estimate_fee(&request.chain, gas_limit).await?;

        let tx = LogicalTransaction {
            chain_id,
            messages: request.messages,
            memo: request.memo,
            fee: Fee { amount: fee_amount, gas_limit },
            signer: Signer {
                address: sender,
                pub_key: request.pub_key,
                key_type,
                account_number: account.account_number,
                sequence: account.sequence,
            },
        };
        Ok(assemble(&tx)?)
    }

    /// Probes every configured candidate of `chain` and publishes the rankings.
    ///
    /// # Errors
    ///
    /// [`GatewayError::BadRequest`] for unknown chains.
    pub async fn probe_chain(
        &self,
        chain: &str,
    ) -> Result<BTreeMap<&'static str, Vec<ProbeReport>>, GatewayError> {
        let profile = self
            .config
            .chain(chain)
            .ok_or_else(|| GatewayError::BadRequest(format!("unknown chain: {chain}")))?;
        Ok(self.rank_chain(profile).await)
    }

    /// Probes every configured chain. Chains whose candidates all fail are kept in the result
    /// with their error reports.
    pub async fn probe_all(&self) -> BTreeMap<String, BTreeMap<&'static str, Vec<ProbeReport>>> {
        let mut all = BTreeMap::new();
        let mut unhealthy = 0usize;
        for profile in &self.config.chains {
            let reports = self.rank_chain(profile).await;
            if !reports.values().flatten().any(ProbeReport::is_healthy) {
                unhealthy += 1;
                let first_error = reports
                    .values()
                    .flatten()
                    .find_map(|r| r.error.as_deref())
                    .unwrap_or("no candidates");
                warn!(chain = %profile.name, error = %first_error, "no healthy endpoint for chain");
            }
            all.insert(profile.key(), reports);
        }
        info!(chains = all.len(), unhealthy, "ranking round complete");
        all
    }

    async fn rank_chain(
        &self,
        profile: &ChainProfile,
    ) -> BTreeMap<&'static str, Vec<ProbeReport>> {
        let mut reports = BTreeMap::new();
        for class in EndpointClass::ALL {
            let candidates = profile.candidates.for_class(class);
            if candidates.is_empty() {
                continue;
            }
            let ranked = self.prober.probe_and_publish(&profile.name, class, candidates).await;
            reports.insert(class.as_str(), ranked);
        }
        reports
    }
}

fn from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

fn default_gas_limit(messages: &[CosmosMsg]) -> u64 {
    let converts = messages
        .iter()
        .any(|m| matches!(m, CosmosMsg::ConvertCoin { .. } | CosmosMsg::ConvertErc20 { .. }));
    if converts {
        CONVERT_GAS_LIMIT
    } else if messages.iter().any(|m| matches!(m, CosmosMsg::Transfer { .. })) {
        IBC_TRANSFER_GAS_LIMIT
    } else {
        DEFAULT_GAS_LIMIT
    }
}
