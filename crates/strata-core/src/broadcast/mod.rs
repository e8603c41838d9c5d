//! # Broadcast / Simulate Pipeline
//!
//! ```text
//! broadcast(chain, tx_bytes)
//!   │
//!   ├─ supports_simulation? ── simulate ── error ──► ChainRejection (nothing broadcast)
//!   │
//!   ▼
//! POST /cosmos/tx/v1beta1/txs (broadcast timeout, no cache)
//!   │
//!   ├─ code == 0 ──► txhash
//!   ├─ code != 0 ──► ChainRejection(classified raw_log)
//!   └─ other ──────► InvalidResponse
//! ```

mod classify;

pub use classify::{classify_chain_error, RejectionKind};

use crate::{
    config::ChainProfile,
    errors::GatewayError,
    metrics,
    types::{chain_key, EndpointClass},
    upstream::RequestRouter,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, warn};

pub const SIMULATE_PATH: &str = "/cosmos/tx/v1beta1/simulate";
pub const BROADCAST_PATH: &str = "/cosmos/tx/v1beta1/txs";
pub const BROADCAST_MODE: &str = "BROADCAST_MODE_SYNC";
pub const SIMULATION_OK: &str = "Transaction was simulated correctly";
const INVALID_TX_RESPONSE: &str = "invalid transaction response";

/// Result of a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulateOutcome {
    pub ok: bool,
    pub message: String,
    /// Set when the chain rejected the transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RejectionKind>,
}

/// Normalized `{"error": ..., "tx_hash": ...}` shape returned upward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub error: Option<String>,
    pub tx_hash: Option<String>,
}

impl BroadcastReport {
    #[must_use]
    pub fn from_result(result: &Result<String, GatewayError>) -> Self {
        match result {
            Ok(hash) => Self { error: None, tx_hash: Some(hash.clone()) },
            Err(e) => Self { error: Some(e.user_message()), tx_hash: None },
        }
    }
}

#[derive(Debug, Serialize)]
struct SimulateRequest<'a> {
    tx_bytes: &'a str,
}

#[derive(Debug, Serialize)]
struct BroadcastRequest<'a> {
    tx_bytes: &'a str,
    mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct BroadcastTxResponse {
    tx_response: Option<TxResponse>,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    txhash: String,
    #[serde(default)]
    raw_log: String,
}

/// Submits signed transactions through the router.
pub struct BroadcastPipeline {
    router: Arc<RequestRouter>,
    simulation: HashMap<String, bool>,
}

impl BroadcastPipeline {
    #[must_use]
    pub fn new(router: Arc<RequestRouter>, profiles: &[ChainProfile]) -> Self {
        let simulation = profiles.iter().map(|p| (p.key(), p.supports_simulation)).collect();
        Self { router, simulation }
    }

    /// Dry-runs `tx_bytes` (protobuf `TxRaw`).
    ///
    /// # Errors
    ///
    /// Router errors, including [`GatewayError::BadRequest`] for an HTTP 400 from the node.
    pub async fn simulate(
        &self,
        chain: &str,
        tx_bytes: &[u8],
    ) -> Result<SimulateOutcome, GatewayError> {
        let encoded = STANDARD.encode(tx_bytes);
        let body = to_body(&SimulateRequest { tx_bytes: &encoded })?;
        let response = self.router.post(chain, EndpointClass::Rest, SIMULATE_PATH, body).await?;

        let parsed: Option<Value> = serde_json::from_str(&response.body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error")).filter(|e| !e.is_null());
        let raw_error = match (error, response.is_not_found()) {
            (Some(Value::String(message)), _) => Some(message.clone()),
            (Some(other), _) => Some(other.to_string()),
            (None, true) => Some(response.body.clone()),
            (None, false) => None,
        };

        Ok(match raw_error {
            Some(raw) => {
                let (kind, message) = classify_chain_error(&raw);
                debug!(chain = chain, kind = %kind, raw_log = %raw, "simulation rejected");
                SimulateOutcome { ok: false, message, kind: Some(kind) }
            }
            None => SimulateOutcome { ok: true, message: SIMULATION_OK.to_string(), kind: None },
        })
    }

    /// Broadcasts `tx_bytes` in sync mode and returns the transaction hash.
    ///
    /// Runs [`simulate`](Self::simulate) first unless the chain profile disables it; a failed
    /// simulation is returned without broadcasting.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ChainRejection`] when simulation or `CheckTx` rejects the transaction
    /// - [`GatewayError::SequenceMismatch`] when the broadcast endpoint answers 500
    /// - [`GatewayError::InvalidResponse`] for an unexpected response shape
    /// - other router errors
    pub async fn broadcast(&self, chain: &str, tx_bytes: &[u8]) -> Result<String, GatewayError> {
        let result = self.broadcast_inner(chain, tx_bytes).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(GatewayError::ChainRejection { kind, .. }) => kind.as_str(),
            Err(e) => e.as_str(),
        };
        metrics::record_broadcast(&chain_key(chain), outcome);
        result
    }

    async fn broadcast_inner(&self, chain: &str, tx_bytes: &[u8]) -> Result<String, GatewayError> {
        let simulate_first = *self
            .simulation
            .get(&chain_key(chain))
            .ok_or_else(|| GatewayError::BadRequest(format!("unknown chain: {chain}")))?;

        if simulate_first {
            let outcome = self.simulate(chain, tx_bytes).await?;
            if !outcome.ok {
                return Err(GatewayError::ChainRejection {
                    kind: outcome.kind.unwrap_or(RejectionKind::Other),
                    message: outcome.message,
                });
            }
        }

        let encoded = STANDARD.encode(tx_bytes);
        let body = to_body(&BroadcastRequest { tx_bytes: &encoded, mode: BROADCAST_MODE })?;
        let response =
            self.router.broadcast(chain, EndpointClass::Rest, BROADCAST_PATH, body).await?;

        let tx_response = serde_json::from_str::<BroadcastTxResponse>(&response.body)
            .ok()
            .and_then(|r| r.tx_response)
            .filter(|_| !response.is_not_found())
            .ok_or_else(|| {
                warn!(chain = chain, body = %response.body, "unexpected broadcast response");
                GatewayError::InvalidResponse(INVALID_TX_RESPONSE.to_string())
            })?;

        if tx_response.code != 0 {
            let (kind, message) = classify_chain_error(&tx_response.raw_log);
            warn!(chain = chain, code = tx_response.code, kind = %kind, raw_log = %tx_response.raw_log, "transaction rejected");
            return Err(GatewayError::ChainRejection { kind, message });
        }
        if tx_response.txhash.is_empty() {
            return Err(GatewayError::InvalidResponse(INVALID_TX_RESPONSE.to_string()));
        }

        info!(chain = chain, tx_hash = %tx_response.txhash, "transaction broadcast");
        Ok(tx_response.txhash)
    }
}

fn to_body<T: Serialize>(request: &T) -> Result<Bytes, GatewayError> {
    serde_json::to_vec(request)
        .map(Bytes::from)
        .map_err(|e| GatewayError::Internal(e.to_string()))
}
