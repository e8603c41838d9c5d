//! # Transaction Assembler
//!
//! Renders one [`LogicalTransaction`] into the three sign encodings wallets understand:
//!
//! | Encoding | Sign mode | `sign_bytes` |
//! |----------|-----------|--------------|
//! | sign-direct | `SIGN_MODE_DIRECT` | hash of the protobuf `SignDoc` |
//! | legacy Amino | `SIGN_MODE_LEGACY_AMINO_JSON` | hash of the canonical `StdSignDoc` JSON |
//! | EIP-712 | `SIGN_MODE_LEGACY_AMINO_JSON` + web3 extension | typed data digest |
//!
//! The hash is Keccak-256 for `eth_secp256k1` signers and SHA-256 for `secp256k1` signers.
//! Assembly is pure and deterministic; every result is cross-checked before it is returned.

pub mod address;
pub mod amino;
mod assembler;
pub mod eip712;
pub mod messages;
pub mod proto;
mod raw;

pub use assembler::{assemble, AssembledTransaction, Eip712Encoding, SignEncoding};
pub use messages::{CosmosMsg, IbcHeight, VoteOption};
pub use raw::join_eip712_signature;

use crate::chain::chain_id::ChainIdError;
use alloy_primitives::keccak256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

/// Length of a compressed secp256k1 public key.
pub(crate) const PUB_KEY_LEN: usize = 33;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AssemblyError {
    #[error("transaction has no messages")]
    EmptyMessages,

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid amount {0:?}: expected a non-negative integer")]
    InvalidAmount(String),

    #[error("invalid denom {0:?}")]
    InvalidDenom(String),

    #[error("invalid creation height {0}: must be positive")]
    InvalidHeight(i64),

    #[error("invalid public key: {0}")]
    InvalidPubKey(String),

    #[error(transparent)]
    InvalidChainId(#[from] ChainIdError),

    #[error("EIP-712 encoding supports exactly one message, got {0}")]
    Eip712MultiMessage(usize),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("unsupported message type {0}")]
    UnsupportedMessage(String),

    #[error("sign encodings diverge: {0}")]
    InvariantViolation(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl AssemblyError {
    /// `true` when the caller supplied bad input; `false` for internal failures.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_) | Self::Encode(_) | Self::Decode(_))
    }
}

impl From<prost::DecodeError> for AssemblyError {
    fn from(err: prost::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// An amount of one denomination. The amount is kept as the canonical decimal string the chain
/// uses on the wire (`"241499999999999968"`), so values beyond `u128` survive untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    /// # Errors
    ///
    /// [`AssemblyError::InvalidAmount`] unless `amount` is a decimal integer without leading
    /// zeros, [`AssemblyError::InvalidDenom`] unless `denom` is a valid Cosmos SDK denom.
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Result<Self, AssemblyError> {
        let coin = Self { denom: denom.into(), amount: amount.into() };
        coin.validate()?;
        Ok(coin)
    }

    /// # Errors
    ///
    /// See [`Coin::new`].
    pub fn validate(&self) -> Result<(), AssemblyError> {
        validate_amount(&self.amount)?;
        validate_denom(&self.denom)
    }

    #[must_use]
    pub fn to_proto(&self) -> proto::Coin {
        proto::Coin { denom: self.denom.clone(), amount: self.amount.clone() }
    }

    #[must_use]
    pub fn from_proto(coin: proto::Coin) -> Self {
        Self { denom: coin.denom, amount: coin.amount }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

pub(crate) fn validate_amount(amount: &str) -> Result<(), AssemblyError> {
    let canonical = !amount.is_empty()
        && amount.bytes().all(|b| b.is_ascii_digit())
        && (amount == "0" || !amount.starts_with('0'));
    if canonical {
        Ok(())
    } else {
        Err(AssemblyError::InvalidAmount(amount.to_string()))
    }
}

// [a-zA-Z][a-zA-Z0-9/:._-]{2,127}
fn validate_denom(denom: &str) -> Result<(), AssemblyError> {
    let bytes = denom.as_bytes();
    let valid = (3..=128).contains(&bytes.len())
        && bytes[0].is_ascii_alphabetic()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'));
    if valid {
        Ok(())
    } else {
        Err(AssemblyError::InvalidDenom(denom.to_string()))
    }
}

/// Fee paid by the single signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Coin,
    pub gas_limit: u64,
}

/// Key algorithm of the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PubKeyType {
    /// Cosmos `secp256k1`, signatures over SHA-256.
    Secp256k1,
    /// Ethermint `eth_secp256k1`, signatures over Keccak-256.
    EthSecp256k1,
}

impl PubKeyType {
    /// Key type assumed when the caller leaves it out: evmos chains use ethermint keys, every
    /// other chain plain `secp256k1`.
    #[must_use]
    pub fn for_chain_id(chain_id: &str) -> Self {
        if chain_id.to_ascii_lowercase().contains("evmos") {
            Self::EthSecp256k1
        } else {
            Self::Secp256k1
        }
    }

    #[must_use]
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::Secp256k1 => proto::type_url::SECP256K1_PUBKEY,
            Self::EthSecp256k1 => proto::type_url::ETH_SECP256K1_PUBKEY,
        }
    }

    /// Digest the wallet signs for this key type.
    #[must_use]
    pub fn hash(&self, bytes: &[u8]) -> [u8; 32] {
        match self {
            Self::Secp256k1 => Sha256::digest(bytes).into(),
            Self::EthSecp256k1 => keccak256(bytes).0,
        }
    }

    #[must_use]
    pub fn supports_eip712(&self) -> bool {
        matches!(self, Self::EthSecp256k1)
    }
}

impl FromStr for PubKeyType {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "secp256k1" | "tendermint/pubkeysecp256k1" => Ok(Self::Secp256k1),
            "eth_secp256k1" | "ethsecp256k1" | "ethermint/pubkeyethsecp256k1" => {
                Ok(Self::EthSecp256k1)
            }
            other => Err(AssemblyError::InvalidPubKey(format!("unknown key type {other}"))),
        }
    }
}

/// The account signing the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    /// Bech32 account address; its prefix is the one every sender address must carry.
    pub address: String,
    /// 33-byte compressed secp256k1 public key.
    pub pub_key: Vec<u8>,
    pub key_type: PubKeyType,
    pub account_number: u64,
    pub sequence: u64,
}

/// Chain-independent description of what is to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalTransaction {
    pub chain_id: String,
    pub messages: Vec<CosmosMsg>,
    pub memo: String,
    pub fee: Fee,
    pub signer: Signer,
}
